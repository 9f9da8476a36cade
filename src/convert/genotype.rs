//! Encoding of sample genotype calls into allele tokens.

use indexmap::IndexMap;

use super::record::{SampleCall, VariantRecord};

/// Confidence flag value marking a low-confidence call.
pub const LOW_CONFIDENCE: i32 = 0;

/// Token written for calls that the allele map does not cover.
pub const UNKNOWN_CALL: &str = "?";

/// Mapping from homozygous genotype calls to allele, built for one record.
///
/// `0/0` maps to the reference allele, `i/i` to the `i`-th alternate allele
/// and `./.` to no allele at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleMap {
    alleles: IndexMap<String, Option<String>>,
}

/// Result of looking up one sample's call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// Call resolved to an allele.
    Allele(&'a str),
    /// Call resolved to the missing call.
    Missing,
    /// Call not covered by the map.
    Unknown,
}

impl AlleleMap {
    pub fn new(record: &VariantRecord) -> Self {
        let mut alleles = IndexMap::with_capacity(record.alternatives.len() + 2);
        alleles.insert("0/0".to_string(), Some(record.reference.clone()));
        for (i, alt) in record.alternatives.iter().enumerate() {
            alleles.insert(format!("{}/{}", i + 1, i + 1), Some(alt.clone()));
        }
        alleles.insert("./.".to_string(), None);
        Self { alleles }
    }

    /// Look up `call`, phased calls are treated as unphased.
    pub fn lookup(&self, call: &str) -> Lookup<'_> {
        let call = call.replace('|', "/");
        match self.alleles.get(&call) {
            Some(Some(allele)) => Lookup::Allele(allele.as_str()),
            Some(None) => Lookup::Missing,
            None => Lookup::Unknown,
        }
    }

    /// Encode one sample, `None` stands for a missing call.
    ///
    /// Low-confidence calls are written in lower case.
    pub fn encode(&self, sample: &SampleCall) -> Option<String> {
        let lookup = match sample.genotype.as_deref() {
            Some(call) => self.lookup(call),
            None => Lookup::Unknown,
        };
        match lookup {
            Lookup::Allele(allele) if sample.confidence == Some(LOW_CONFIDENCE) => {
                Some(allele.to_lowercase())
            }
            Lookup::Allele(allele) => Some(allele.to_string()),
            Lookup::Missing => None,
            Lookup::Unknown => Some(UNKNOWN_CALL.to_string()),
        }
    }

    /// Encode all samples of `record` in sample order.
    pub fn encode_all(&self, record: &VariantRecord) -> Vec<Option<String>> {
        record
            .samples
            .iter()
            .map(|sample| self.encode(sample))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn record() -> VariantRecord {
        VariantRecord {
            chrom: "1".into(),
            pos: 100,
            reference: "A".into(),
            alternatives: vec!["G".into(), "TC".into()],
            ..Default::default()
        }
    }

    #[rstest]
    #[case(Some("0/0"), Some(1), Some("A"))]
    #[case(Some("1/1"), Some(1), Some("G"))]
    #[case(Some("1/1"), Some(0), Some("g"))]
    #[case(Some("1|1"), None, Some("G"))]
    #[case(Some("2/2"), Some(1), Some("TC"))]
    #[case(Some("2|2"), Some(0), Some("tc"))]
    #[case(Some("./."), Some(0), None)]
    #[case(Some(".|."), Some(1), None)]
    #[case(Some("0/1"), Some(1), Some("?"))]
    #[case(Some("1/2"), Some(0), Some("?"))]
    #[case(Some("3/3"), Some(1), Some("?"))]
    #[case(None, Some(1), Some("?"))]
    fn encode(
        #[case] genotype: Option<&str>,
        #[case] confidence: Option<i32>,
        #[case] expected: Option<&str>,
    ) {
        let map = AlleleMap::new(&record());
        let sample = SampleCall {
            genotype: genotype.map(String::from),
            confidence,
        };

        assert_eq!(map.encode(&sample).as_deref(), expected);
    }

    #[test]
    fn map_depends_on_alternate_count() {
        let mut biallelic = record();
        biallelic.alternatives.truncate(1);

        assert_eq!(AlleleMap::new(&record()).lookup("2/2"), Lookup::Allele("TC"));
        assert_eq!(AlleleMap::new(&biallelic).lookup("2/2"), Lookup::Unknown);
    }

    #[test]
    fn encode_all_keeps_sample_order() {
        let mut record = record();
        record.samples = vec![
            SampleCall {
                genotype: Some("1/1".into()),
                confidence: Some(1),
            },
            SampleCall {
                genotype: Some("0/0".into()),
                confidence: Some(0),
            },
        ];

        let map = AlleleMap::new(&record);
        assert_eq!(
            map.encode_all(&record),
            vec![Some("G".to_string()), Some("a".to_string())]
        );
    }
}
