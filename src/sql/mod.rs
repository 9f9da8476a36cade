//! Generation of SQL load scripts: schema, batched inserts, finalization.

use std::collections::BTreeSet;
use std::io::Write;

use itertools::Itertools;
use thousands::Separable;

pub mod migrate;

/// Errors when writing a SQL script.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("row has {actual} values but table {table} has {expected} columns")]
    ColumnCount {
        table: String,
        expected: usize,
        actual: usize,
    },
    #[error("cannot {action} in state {state:?}")]
    InvalidState { action: &'static str, state: State },
    #[error("problem writing SQL: {0}")]
    Io(#[from] std::io::Error),
}

/// A scalar value of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Null,
    Text(&'a str),
    Integer(i64),
    /// Rendered as array literal `'{a,b,c}'`.
    IntegerSet(&'a BTreeSet<u32>),
}

impl<'a> From<Option<&'a str>> for Value<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map(Value::Text).unwrap_or(Value::Null)
    }
}

impl std::fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Text(s) => write!(f, "'{}'", escape_literal(s)),
            Value::Integer(i) => write!(f, "{}", i),
            Value::IntegerSet(codes) => write!(f, "'{{{}}}'", codes.iter().join(",")),
        }
    }
}

/// Double embedded single quotes.
pub fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// Quote an identifier, doubling embedded double quotes.
pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Definition of one table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub sql_type: String,
    /// Whether the name is quoted in `CREATE TABLE`.
    pub quoted: bool,
}

impl Column {
    pub fn new(name: &str, sql_type: &str) -> Self {
        Self {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            quoted: false,
        }
    }

    pub fn quoted(name: &str, sql_type: &str) -> Self {
        Self {
            quoted: true,
            ..Self::new(name, sql_type)
        }
    }
}

/// Name and ordered columns of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn create_statement(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({});\n",
            self.name,
            self.columns
                .iter()
                .map(|col| {
                    if col.quoted {
                        format!("{} {}", quote_ident(&col.name), col.sql_type)
                    } else {
                        format!("{} {}", col.name, col.sql_type)
                    }
                })
                .join(", ")
        )
    }

    fn insert_prefix(&self) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ",
            self.name,
            self.columns.iter().map(|col| quote_ident(&col.name)).join(", ")
        )
    }
}

/// State of a `BatchWriter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    SchemaEmitted,
    Finalized,
}

/// Counters of a `BatchWriter`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub rows: usize,
    pub inserts: usize,
}

/// Writes schema, batched multi-row inserts and finalization statements.
pub struct BatchWriter<W: Write> {
    writer: W,
    schema: TableSchema,
    insert_prefix: String,
    batch_size: usize,
    batch: Vec<String>,
    state: State,
    summary: Summary,
}

impl<W: Write> BatchWriter<W> {
    pub fn new(writer: W, schema: TableSchema, batch_size: usize) -> Result<Self, Error> {
        if batch_size == 0 {
            return Err(Error::ZeroBatchSize);
        }
        Ok(Self {
            writer,
            insert_prefix: schema.insert_prefix(),
            schema,
            batch_size,
            batch: Vec::with_capacity(batch_size),
            state: State::Idle,
            summary: Summary::default(),
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Write the `CREATE TABLE` statement followed by `extra` statements.
    pub fn write_schema(&mut self, extra: &[String]) -> Result<(), Error> {
        if self.state != State::Idle {
            return Err(Error::InvalidState {
                action: "write schema",
                state: self.state,
            });
        }
        self.writer
            .write_all(self.schema.create_statement().as_bytes())?;
        for statement in extra {
            self.writer.write_all(statement.as_bytes())?;
        }
        self.state = State::SchemaEmitted;
        Ok(())
    }

    /// Add one row; returns `true` if this caused a flush.
    pub fn push_row(&mut self, values: &[Value]) -> Result<bool, Error> {
        if self.state != State::SchemaEmitted {
            return Err(Error::InvalidState {
                action: "add row",
                state: self.state,
            });
        }
        if values.len() != self.schema.columns.len() {
            return Err(Error::ColumnCount {
                table: self.schema.name.clone(),
                expected: self.schema.columns.len(),
                actual: values.len(),
            });
        }

        self.batch.push(format!("({})", values.iter().join(", ")));
        if self.batch.len() >= self.batch_size {
            self.flush()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Write the pending rows as one `INSERT`, no-op for an empty batch.
    pub fn flush(&mut self) -> Result<(), Error> {
        if self.batch.is_empty() {
            return Ok(());
        }
        self.writer.write_all(self.insert_prefix.as_bytes())?;
        self.writer.write_all(self.batch.join(", ").as_bytes())?;
        self.writer.write_all(b";\n")?;

        self.summary.rows += self.batch.len();
        self.summary.inserts += 1;
        self.batch.clear();
        tracing::trace!(
            "flushed INSERT #{} into {}, {} rows in total",
            self.summary.inserts.separate_with_commas(),
            &self.schema.name,
            self.summary.rows.separate_with_commas()
        );
        Ok(())
    }

    /// Flush remaining rows, write `statements` and return the writer.
    pub fn finish(mut self, statements: &[String]) -> Result<(W, Summary), Error> {
        if self.state != State::SchemaEmitted {
            return Err(Error::InvalidState {
                action: "finalize",
                state: self.state,
            });
        }
        self.flush()?;
        for statement in statements {
            self.writer.write_all(statement.as_bytes())?;
        }
        self.writer.flush()?;
        self.state = State::Finalized;
        Ok((self.writer, self.summary))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn schema() -> TableSchema {
        TableSchema {
            name: "strains".into(),
            columns: vec![
                Column::new("chrom", "VARCHAR(2)"),
                Column::new("pos", "INT"),
                Column::quoted("C57\"BL", "TEXT"),
            ],
        }
    }

    fn output(writer: BatchWriter<Vec<u8>>) -> Result<String, anyhow::Error> {
        let (buf, _) = writer.finish(&[])?;
        Ok(String::from_utf8(buf)?)
    }

    #[rstest]
    #[case(Value::Null, "NULL")]
    #[case(Value::Text("abc"), "'abc'")]
    #[case(Value::Text("5'UTR"), "'5''UTR'")]
    #[case(Value::Text(""), "''")]
    #[case(Value::Integer(42), "42")]
    fn render_value(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }

    #[test]
    fn render_integer_set() {
        let codes = BTreeSet::from([29, 9]);
        assert_eq!(Value::IntegerSet(&codes).to_string(), "'{9,29}'");
    }

    /// Scalar as read back from a rendered row tuple.
    #[derive(Debug, PartialEq)]
    enum Cell {
        Null,
        Literal(String),
        Number(i64),
    }

    impl From<Value<'_>> for Cell {
        fn from(value: Value<'_>) -> Self {
            match value {
                Value::Null => Cell::Null,
                Value::Text(s) => Cell::Literal(s.to_string()),
                Value::Integer(i) => Cell::Number(i),
                Value::IntegerSet(codes) => {
                    Cell::Literal(format!("{{{}}}", codes.iter().join(",")))
                }
            }
        }
    }

    /// Split the single row tuple of an `INSERT` line back into cells.
    fn decode_row(line: &str) -> Vec<Cell> {
        let tuple = line
            .split_once(" VALUES (")
            .and_then(|(_, rest)| rest.strip_suffix(");"))
            .expect("not a single row INSERT");
        let mut result = Vec::new();
        let mut chars = tuple.chars().peekable();
        loop {
            if chars.peek() == Some(&'\'') {
                chars.next();
                let mut literal = String::new();
                while let Some(c) = chars.next() {
                    if c == '\'' {
                        if chars.peek() == Some(&'\'') {
                            chars.next();
                            literal.push('\'');
                        } else {
                            break;
                        }
                    } else {
                        literal.push(c);
                    }
                }
                result.push(Cell::Literal(literal));
            } else {
                let token = chars
                    .by_ref()
                    .take_while(|c| *c != ',')
                    .collect::<String>();
                result.push(match token.trim() {
                    "NULL" => Cell::Null,
                    number => Cell::Number(number.parse().expect("not a number")),
                });
                if chars.peek().is_none() {
                    break;
                }
                chars.next_if_eq(&' ');
                continue;
            }
            match chars.next() {
                Some(',') => {
                    chars.next_if_eq(&' ');
                }
                _ => break,
            }
        }
        result
    }

    #[rstest]
    #[case("O'Neil", "5'UTR")]
    #[case("''", "a''b'")]
    #[case("", "")]
    #[case("p.Gly12Asp", "'")]
    #[case("x, y", "(z)")]
    fn rows_decode_to_input_values(
        #[case] first: &str,
        #[case] second: &str,
    ) -> Result<(), anyhow::Error> {
        let codes = BTreeSet::from([29, 9]);
        let schema = TableSchema {
            name: "cells".into(),
            columns: vec![
                Column::new("a", "TEXT"),
                Column::new("b", "INT"),
                Column::new("c", "TEXT"),
                Column::new("d", "INT[]"),
                Column::new("e", "TEXT"),
                Column::new("f", "INT"),
            ],
        };
        let row = [
            Value::Text(first),
            Value::Null,
            Value::Text(second),
            Value::IntegerSet(&codes),
            Value::Null,
            Value::Integer(-7),
        ];

        let mut writer = BatchWriter::new(Vec::new(), schema, 1)?;
        writer.write_schema(&[])?;
        writer.push_row(&row)?;
        let text = output(writer)?;
        let insert = text
            .lines()
            .find(|line| line.starts_with("INSERT"))
            .expect("no INSERT");

        assert_eq!(
            decode_row(insert),
            row.iter().copied().map(Cell::from).collect::<Vec<_>>()
        );

        Ok(())
    }

    #[test]
    fn create_statement() {
        assert_eq!(
            schema().create_statement(),
            "CREATE TABLE IF NOT EXISTS strains (chrom VARCHAR(2), pos INT, \"C57\"\"BL\" TEXT);\n"
        );
    }

    #[test]
    fn batches_are_flushed_at_threshold() -> Result<(), anyhow::Error> {
        let mut writer = BatchWriter::new(Vec::new(), schema(), 2)?;
        writer.write_schema(&[])?;
        assert!(!writer.push_row(&[Value::Text("1"), Value::Integer(1), Value::Null])?);
        assert!(writer.push_row(&[Value::Text("1"), Value::Integer(2), Value::Text("a")])?);
        assert!(!writer.push_row(&[Value::Text("2"), Value::Integer(3), Value::Null])?);
        assert_eq!(writer.summary(), Summary { rows: 2, inserts: 1 });

        assert_eq!(
            output(writer)?,
            "CREATE TABLE IF NOT EXISTS strains (chrom VARCHAR(2), pos INT, \"C57\"\"BL\" TEXT);\n\
             INSERT INTO strains (\"chrom\", \"pos\", \"C57\"\"BL\") VALUES ('1', 1, NULL), ('1', 2, 'a');\n\
             INSERT INTO strains (\"chrom\", \"pos\", \"C57\"\"BL\") VALUES ('2', 3, NULL);\n"
        );

        Ok(())
    }

    #[rstest]
    #[case(10, 3, 4)]
    #[case(9, 3, 3)]
    #[case(1, 3, 1)]
    #[case(0, 3, 0)]
    #[case(7, 1, 7)]
    fn insert_count(
        #[case] rows: usize,
        #[case] batch_size: usize,
        #[case] inserts: usize,
    ) -> Result<(), anyhow::Error> {
        let mut writer = BatchWriter::new(Vec::new(), schema(), batch_size)?;
        writer.write_schema(&[])?;
        for i in 0..rows {
            writer.push_row(&[Value::Text("1"), Value::Integer(i as i64), Value::Null])?;
        }
        let (buf, summary) = writer.finish(&[])?;
        let text = String::from_utf8(buf)?;

        assert_eq!(summary, Summary { rows, inserts });
        let sizes = text
            .lines()
            .filter(|line| line.starts_with("INSERT"))
            .map(|line| line.matches("('1', ").count())
            .collect::<Vec<_>>();
        assert_eq!(sizes.len(), inserts);
        for (i, size) in sizes.iter().enumerate() {
            if i + 1 < sizes.len() || rows % batch_size == 0 {
                assert_eq!(*size, batch_size);
            } else {
                assert_eq!(*size, rows % batch_size);
            }
        }

        Ok(())
    }

    #[test]
    fn finish_writes_statements_last() -> Result<(), anyhow::Error> {
        let mut writer = BatchWriter::new(Vec::new(), schema(), 5)?;
        writer.write_schema(&["-- seed\n".to_string()])?;
        writer.push_row(&[Value::Text("1"), Value::Integer(1), Value::Null])?;
        let (buf, _) = writer.finish(&["CREATE INDEX x ON strains (pos);\n".to_string()])?;
        let text = String::from_utf8(buf)?;

        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "-- seed");
        assert!(lines[2].starts_with("INSERT INTO strains"));
        assert_eq!(lines[3], "CREATE INDEX x ON strains (pos);");

        Ok(())
    }

    #[test]
    fn rejects_wrong_arity() -> Result<(), anyhow::Error> {
        let mut writer = BatchWriter::new(Vec::new(), schema(), 5)?;
        writer.write_schema(&[])?;

        let res = writer.push_row(&[Value::Null]);
        assert!(matches!(
            res,
            Err(Error::ColumnCount {
                expected: 3,
                actual: 1,
                ..
            })
        ));

        Ok(())
    }

    #[test]
    fn rejects_out_of_order_use() -> Result<(), anyhow::Error> {
        assert!(matches!(
            BatchWriter::new(Vec::new(), schema(), 0),
            Err(Error::ZeroBatchSize)
        ));

        let mut writer = BatchWriter::new(Vec::new(), schema(), 5)?;
        assert!(matches!(
            writer.push_row(&[Value::Null, Value::Null, Value::Null]),
            Err(Error::InvalidState {
                state: State::Idle,
                ..
            })
        ));
        writer.write_schema(&[])?;
        assert_eq!(writer.state(), State::SchemaEmitted);
        assert!(writer.write_schema(&[]).is_err());

        Ok(())
    }
}
