//! Post-load migration of a variant table against the shared reference tables.
//!
//! The `symbols` table holds one row per gene symbol with one boolean column
//! per loaded table.  The `consequences` table holds one row per consequence
//! code with one count column per loaded table.

use crate::convert::codes::{CodeTable, HIGH_IMPACT_CONSEQUENCES};

use super::escape_literal;

/// Names of the shared reference tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTables {
    pub symbols: String,
    pub consequences: String,
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self {
            symbols: "symbols".into(),
            consequences: "consequences".into(),
        }
    }
}

impl ReferenceTables {
    /// Statements creating the reference tables and seeding `consequences`.
    ///
    /// All statements are idempotent so that several scripts can be loaded
    /// into the same database.
    pub fn seed_statements(&self, consequences: &CodeTable) -> Vec<String> {
        let mut result = vec![
            format!(
                "CREATE TABLE IF NOT EXISTS {} (id SERIAL PRIMARY KEY, symbol TEXT UNIQUE);\n",
                self.symbols
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (id INT PRIMARY KEY, consequence TEXT NOT NULL, \
                 high_impact BOOLEAN DEFAULT FALSE);\n",
                self.consequences
            ),
        ];
        if !consequences.is_empty() {
            let values = consequences
                .iter()
                .map(|(code, term)| {
                    format!(
                        "({}, '{}', {})",
                        code,
                        escape_literal(term),
                        if HIGH_IMPACT_CONSEQUENCES.contains(&term) {
                            "TRUE"
                        } else {
                            "FALSE"
                        }
                    )
                })
                .collect::<Vec<_>>();
            result.push(format!(
                "INSERT INTO {} (id, consequence, high_impact) VALUES {} ON CONFLICT (id) DO NOTHING;\n",
                self.consequences,
                values.join(", ")
            ));
        }
        result
    }
}

/// Migration run once after all rows of `table` are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub table: String,
    pub reference: ReferenceTables,
}

impl Migration {
    pub fn new(table: &str, reference: ReferenceTables) -> Self {
        Self {
            table: table.to_string(),
            reference,
        }
    }

    /// Index over position and chromosome, GIN index over consequences.
    pub fn index_statements(&self) -> Vec<String> {
        let t = &self.table;
        vec![
            format!("CREATE INDEX {t}_pos_chrom_idx ON {t} (pos, chrom);\n"),
            format!("CREATE INDEX {t}_consequence_idx ON {t} USING GIN (consequence);\n"),
        ]
    }

    /// Replace the `symbol` column by a foreign key into the symbols table.
    pub fn symbol_statements(&self) -> Vec<String> {
        let t = &self.table;
        let s = &self.reference.symbols;
        vec![
            format!("ALTER TABLE {s} ADD COLUMN {t} BOOLEAN DEFAULT FALSE;\n"),
            format!(
                "UPDATE {s} SET {t} = TRUE WHERE symbol IN (SELECT DISTINCT symbol FROM {t}) \
                 OR symbol IS NULL;\n"
            ),
            format!(
                "INSERT INTO {s} (symbol,{t}) SELECT DISTINCT symbol, TRUE FROM {t} \
                 WHERE symbol NOT IN (SELECT symbol FROM {s}) AND symbol IS NOT NULL;\n"
            ),
            format!("ALTER TABLE {t} ADD COLUMN symbol_id INTEGER;\n"),
            format!("UPDATE {t} SET symbol_id = {s}.id FROM {s} WHERE {t}.symbol = {s}.symbol;\n"),
            format!("ALTER TABLE {t} DROP COLUMN symbol;\n"),
            format!("ALTER TABLE {t} ADD CONSTRAINT fk_{s} FOREIGN KEY (symbol_id) REFERENCES {s} (id);\n"),
            format!("CREATE INDEX {t}_symbol_id_idx ON {t} (symbol_id);\n"),
        ]
    }

    /// Record per consequence code how many rows of the table carry it.
    pub fn consequence_count_statements(&self) -> Vec<String> {
        let t = &self.table;
        let c = &self.reference.consequences;
        vec![
            format!("ALTER TABLE {c} ADD COLUMN {t} int;\n"),
            format!(
                "UPDATE {c} SET {t} = sub.count FROM (SELECT id, COUNT(*) as count FROM {c} \
                 JOIN (SELECT unnest(consequence) FROM {t}) AS t(unnest) ON {c}.id = t.unnest \
                 GROUP BY id) AS sub WHERE {c}.id = sub.id;\n"
            ),
        ]
    }

    /// All finalization statements in execution order.
    pub fn statements(&self) -> Vec<String> {
        let mut result = self.index_statements();
        result.extend(self.symbol_statements());
        result.extend(self.consequence_count_statements());
        result
    }
}
