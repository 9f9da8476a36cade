//! Output rows and their per-record deduplication.

use crate::sql::Value;

use super::annotation::AnnotationEntry;
use super::record::VariantRecord;

/// Names of the fixed columns, in table order.
pub const CORE_COLUMNS: &[&str] = &[
    "chrom",
    "pos",
    "ref",
    "rs_number",
    "symbol",
    "gene",
    "consequence",
    "protein_position",
    "amino_acids",
    "impact",
    "sift",
];

/// One output row; borrows the record fields and sample tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow<'a> {
    pub chrom: &'a str,
    pub pos: usize,
    pub reference: &'a str,
    pub rs_number: Option<&'a str>,
    pub annotation: AnnotationEntry,
    pub genotypes: &'a [Option<String>],
}

impl<'a> OutputRow<'a> {
    pub fn new(
        record: &'a VariantRecord,
        annotation: AnnotationEntry,
        genotypes: &'a [Option<String>],
    ) -> Self {
        Self {
            chrom: &record.chrom,
            pos: record.pos,
            reference: &record.reference,
            rs_number: record.id.as_deref(),
            annotation,
            genotypes,
        }
    }

    /// Values in table column order: core columns then one per sample.
    pub fn values(&self) -> Vec<Value<'_>> {
        let ann = &self.annotation;
        let mut result = Vec::with_capacity(CORE_COLUMNS.len() + self.genotypes.len());
        result.push(Value::Text(self.chrom));
        result.push(Value::Integer(self.pos as i64));
        result.push(Value::Text(self.reference));
        result.push(self.rs_number.into());
        result.push(ann.symbol.as_deref().into());
        result.push(ann.gene.as_deref().into());
        result.push(
            ann.consequence
                .as_ref()
                .map(Value::IntegerSet)
                .unwrap_or(Value::Null),
        );
        result.push(ann.protein_position.as_deref().into());
        result.push(ann.amino_acids.as_deref().into());
        result.push(
            ann.impact
                .map(|code| Value::Integer(code as i64))
                .unwrap_or(Value::Null),
        );
        result.push(ann.sift.as_deref().into());
        result.extend(self.genotypes.iter().map(|gt| Value::from(gt.as_deref())));
        result
    }
}

/// Drops rows equal to one already accepted for the same record.
///
/// Linear scan, fine for the tens of transcripts seen per variant.
#[derive(Debug, Default)]
pub struct Deduplicator<'a> {
    seen: Vec<OutputRow<'a>>,
}

impl<'a> Deduplicator<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `row` unless an equal row was seen; returns the stored row.
    pub fn accept(&mut self, row: OutputRow<'a>) -> Option<&OutputRow<'a>> {
        if self.seen.contains(&row) {
            None
        } else {
            self.seen.push(row);
            self.seen.last()
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
