//! Variant records as seen by the conversion, decoupled from the VCF parser.

use noodles_vcf as vcf;

/// Genotype data of one sample in one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleCall {
    /// The genotype call, e.g., `"0/1"`.
    pub genotype: Option<String>,
    /// The confidence flag, e.g., value of `FORMAT/FI`.
    pub confidence: Option<i32>,
}

/// One variant record with everything the conversion looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantRecord {
    /// Chromosome name.
    pub chrom: String,
    /// 1-based position.
    pub pos: usize,
    /// Reference allele.
    pub reference: String,
    /// Alternate alleles in declaration order.
    pub alternatives: Vec<String>,
    /// Identifier(s), `None` if missing.
    pub id: Option<String>,
    /// Per-transcript annotation payload, `None` if the INFO key is absent.
    pub annotations: Option<Vec<String>>,
    /// Sample genotype data in header sample order.
    pub samples: Vec<SampleCall>,
}

/// Keys of the VCF fields that the conversion reads.
#[derive(Debug, Clone)]
pub struct VcfKeys {
    pub annotation: vcf::record::info::field::Key,
    pub confidence: vcf::record::genotypes::keys::Key,
}

impl VcfKeys {
    pub fn new(annotation: &str, confidence: &str) -> Result<Self, anyhow::Error> {
        Ok(Self {
            annotation: annotation
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid INFO key {:?}: {}", annotation, e))?,
            confidence: confidence
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid FORMAT key {:?}: {}", confidence, e))?,
        })
    }
}

impl VariantRecord {
    /// Convert the site columns only, leaving annotations and samples empty.
    pub fn site_from_vcf(record: &vcf::Record) -> Self {
        let chrom = record.chromosome().to_string();
        let pos: usize = record.position().into();
        let reference = record.reference_bases().to_string();
        let alternatives = record
            .alternate_bases()
            .iter()
            .map(|allele| allele.to_string())
            .collect();
        let id = if record.ids().is_empty() {
            None
        } else {
            Some(record.ids().to_string())
        };

        Self {
            chrom,
            pos,
            reference,
            alternatives,
            id,
            annotations: None,
            samples: Vec::new(),
        }
    }

    /// Convert from a parsed VCF record.
    pub fn from_vcf(record: &vcf::Record, keys: &VcfKeys) -> Result<Self, anyhow::Error> {
        use vcf::record::genotypes::sample::Value as SampleValue;
        use vcf::record::info::field::{value::Array, Value};

        let annotations = match record.info().get(&keys.annotation) {
            Some(Some(Value::Array(Array::String(values)))) => {
                // Missing (`.`) entries carry no transcript and are dropped.
                Some(values.iter().flatten().cloned().collect())
            }
            Some(Some(Value::String(value))) => Some(vec![value.clone()]),
            Some(Some(other)) => {
                anyhow::bail!("unexpected INFO/{} value: {:?}", keys.annotation, other)
            }
            Some(None) | None => None,
        };

        let samples = record
            .genotypes()
            .values()
            .map(|sample| {
                let genotype = match sample.get(&vcf::record::genotypes::keys::key::GENOTYPE) {
                    Some(Some(SampleValue::String(gt))) => Some(gt.clone()),
                    _ => None,
                };
                let confidence = match sample.get(&keys.confidence) {
                    Some(Some(SampleValue::Integer(value))) => Some(*value),
                    Some(Some(SampleValue::String(value))) => value.parse().ok(),
                    _ => None,
                };
                SampleCall {
                    genotype,
                    confidence,
                }
            })
            .collect();

        Ok(Self {
            annotations,
            samples,
            ..Self::site_from_vcf(record)
        })
    }
}
