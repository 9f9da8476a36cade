//! Fixed code tables for consequence and impact terms.
//!
//! The integer codes are the persisted representation in the generated tables.
//! Terms may only ever be appended at the end of a table.

use indexmap::IndexSet;

use crate::err::CodeTableError;

/// Consequence terms, the position is the code.
pub const CONSEQUENCE_TERMS: &[&str] = &[
    "intergenic_variant",
    "regulatory_region_variant",
    "upstream_gene_variant",
    "non_coding_transcript_exon_variant",
    "downstream_gene_variant",
    "intron_variant",
    "non_coding_transcript_variant",
    "3_prime_UTR_variant",
    "synonymous_variant",
    "splice_region_variant",
    "inframe_insertion",
    "inframe_deletion",
    "splice_polypyrimidine_tract_variant",
    "5_prime_UTR_variant",
    "NMD_transcript_variant",
    "frameshift_variant",
    "start_lost",
    "stop_gained",
    "splice_acceptor_variant",
    "splice_donor_region_variant",
    "splice_donor_variant",
    "stop_retained_variant",
    "stop_lost",
    "splice_donor_5th_base_variant",
    "coding_sequence_variant",
    "protein_altering_variant",
    "start_retained_variant",
    "transcript_ablation",
    "incomplete_terminal_codon_variant",
    "missense_variant",
    "initiator_codon_variant",
    "mature_miRNA_variant",
];

/// Consequence terms that VEP assigns the HIGH impact.
pub const HIGH_IMPACT_CONSEQUENCES: &[&str] = &[
    "transcript_ablation",
    "splice_acceptor_variant",
    "splice_donor_variant",
    "stop_gained",
    "frameshift_variant",
    "stop_lost",
    "start_lost",
];

/// Impact terms, the position is the code.
pub const IMPACT_TERMS: &[&str] = &["LOW", "MODIFIER", "MODERATE", "HIGH"];

/// Ordered vocabulary with term to code lookup.
#[derive(Debug, Clone)]
pub struct CodeTable {
    terms: IndexSet<&'static str>,
}

impl CodeTable {
    /// Build the table, failing on duplicated terms.
    pub fn new(name: &'static str, terms: &[&'static str]) -> Result<Self, CodeTableError> {
        let mut result = IndexSet::with_capacity(terms.len());
        for term in terms {
            if !result.insert(*term) {
                return Err(CodeTableError::DuplicateTerm {
                    table: name,
                    term: term.to_string(),
                });
            }
        }
        Ok(Self { terms: result })
    }

    /// Return the code of `term`, `None` for unknown terms.
    pub fn code_of(&self, term: &str) -> Option<u32> {
        self.terms.get_index_of(term).map(|idx| idx as u32)
    }

    /// Return the term for `code`.
    pub fn term_of(&self, code: u32) -> Option<&'static str> {
        self.terms.get_index(code as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate `(code, term)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &'static str)> + '_ {
        self.terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (idx as u32, *term))
    }
}

/// Both code tables used by the conversion.
#[derive(Debug, Clone)]
pub struct CodeTables {
    pub consequences: CodeTable,
    pub impacts: CodeTable,
}

impl CodeTables {
    /// Build the fixed tables, checking them for uniqueness.
    pub fn new() -> Result<Self, CodeTableError> {
        Ok(Self {
            consequences: CodeTable::new("consequences", CONSEQUENCE_TERMS)?,
            impacts: CodeTable::new("impacts", IMPACT_TERMS)?,
        })
    }
}
