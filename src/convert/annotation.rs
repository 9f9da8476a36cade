//! Expansion of the per-transcript annotation payload.

use std::collections::BTreeSet;

use super::codes::CodeTables;
use super::header::FieldIndexes;

/// Separator between the fields of one annotation entry.
pub const FIELD_SEPARATOR: char = '|';
/// Separator between simultaneous consequence terms.
pub const CONSEQUENCE_SEPARATOR: char = '&';

/// The output fields of one annotation entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AnnotationEntry {
    pub symbol: Option<String>,
    pub gene: Option<String>,
    /// Consequence codes; `None` if no known term was given.
    pub consequence: Option<BTreeSet<u32>>,
    pub protein_position: Option<String>,
    pub amino_acids: Option<String>,
    /// Impact code; `None` if empty or unknown.
    pub impact: Option<u32>,
    pub sift: Option<String>,
}

/// Splits annotation entries and re-encodes their terms.
#[derive(Debug, Clone)]
pub struct Expander<'a> {
    indexes: FieldIndexes,
    codes: &'a CodeTables,
}

impl<'a> Expander<'a> {
    pub fn new(indexes: FieldIndexes, codes: &'a CodeTables) -> Self {
        Self { indexes, codes }
    }

    /// Expand one raw annotation entry.
    pub fn expand_entry(&self, entry: &str) -> AnnotationEntry {
        let values = entry.split(FIELD_SEPARATOR).collect::<Vec<_>>();
        let field = |idx: Option<usize>| {
            idx.and_then(|idx| values.get(idx))
                .copied()
                .filter(|value| !value.is_empty())
        };

        let consequence = field(self.indexes.consequence).and_then(|value| {
            let codes = value
                .split(CONSEQUENCE_SEPARATOR)
                .filter_map(|term| self.codes.consequences.code_of(term))
                .collect::<BTreeSet<_>>();
            if codes.is_empty() {
                None
            } else {
                Some(codes)
            }
        });

        AnnotationEntry {
            symbol: field(self.indexes.symbol).map(String::from),
            gene: field(self.indexes.gene).map(String::from),
            consequence,
            protein_position: field(self.indexes.protein_position).map(String::from),
            amino_acids: field(self.indexes.amino_acids).map(String::from),
            impact: field(self.indexes.impact).and_then(|term| self.codes.impacts.code_of(term)),
            sift: field(self.indexes.sift).map(String::from),
        }
    }

    /// Expand all entries of a payload, in payload order.
    pub fn expand<'p>(
        &'p self,
        payload: &'p [String],
    ) -> impl Iterator<Item = AnnotationEntry> + 'p {
        payload.iter().map(|entry| self.expand_entry(entry))
    }
}
