//! Extraction of sample names and annotation field layout from the VCF header.

use noodles_vcf as vcf;

use crate::err::HeaderError;

/// Ordered annotation sub-field names as declared in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationFormat {
    fields: indexmap::IndexSet<String>,
}

impl AnnotationFormat {
    /// Parse from the description of the annotation INFO declaration.
    ///
    /// Everything after `Format:` is split on `|`, names are trimmed and
    /// lower-cased.
    pub fn from_description(info_key: &str, description: &str) -> Result<Self, HeaderError> {
        const MARKER: &str = "Format:";
        let start = description
            .find(MARKER)
            .ok_or_else(|| HeaderError::MissingFormatSection(info_key.to_string()))?;
        let format = description[start + MARKER.len()..].trim();
        if format.is_empty() {
            return Err(HeaderError::EmptyFormat(info_key.to_string()));
        }

        let mut fields = indexmap::IndexSet::new();
        for name in format.split('|') {
            let name = name.trim().to_lowercase();
            if !fields.insert(name.clone()) {
                return Err(HeaderError::DuplicateField(name));
            }
        }
        Ok(Self { fields })
    }

    /// Position of `name` within an annotation entry.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.get_index_of(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Positions of the annotation fields that end up in the output table.
///
/// `None` marks a field that the header does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldIndexes {
    pub symbol: Option<usize>,
    pub gene: Option<usize>,
    pub consequence: Option<usize>,
    pub protein_position: Option<usize>,
    pub amino_acids: Option<usize>,
    pub impact: Option<usize>,
    pub sift: Option<usize>,
}

impl FieldIndexes {
    pub fn new(format: &AnnotationFormat) -> Self {
        Self {
            symbol: format.index_of("symbol"),
            gene: format.index_of("gene"),
            consequence: format.index_of("consequence"),
            protein_position: format.index_of("protein_position"),
            amino_acids: format.index_of("amino_acids"),
            impact: format.index_of("impact"),
            sift: format.index_of("sift"),
        }
    }
}

/// Header-derived information needed for every record.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Sample names in declaration order.
    pub samples: Vec<String>,
    /// Annotation field layout.
    pub format: AnnotationFormat,
    /// Positions of the output fields.
    pub indexes: FieldIndexes,
}

impl Metadata {
    pub fn new(samples: Vec<String>, format: AnnotationFormat) -> Self {
        let indexes = FieldIndexes::new(&format);
        Self {
            samples,
            format,
            indexes,
        }
    }

    /// Extract from the VCF header, `info_key` names the annotation INFO field.
    pub fn from_header(header: &vcf::Header, info_key: &str) -> Result<Self, anyhow::Error> {
        let key = info_key
            .parse::<vcf::record::info::field::Key>()
            .map_err(|e| anyhow::anyhow!("invalid INFO key {:?}: {}", info_key, e))?;
        let info = header
            .infos()
            .get(&key)
            .ok_or_else(|| HeaderError::MissingAnnotationInfo(info_key.to_string()))?;
        let format = AnnotationFormat::from_description(info_key, info.description())?;
        let samples = header.sample_names().iter().cloned().collect();

        Ok(Self::new(samples, format))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    const VEP_DESCRIPTION: &str = "Consequence annotations from Ensembl VEP. \
        Format: Allele|Consequence|IMPACT|SYMBOL|Gene|Feature_type|Feature|BIOTYPE|\
        EXON|INTRON|HGVSc|HGVSp|cDNA_position|CDS_position|Protein_position|\
        Amino_acids|Codons|Existing_variation|DISTANCE|STRAND|FLAGS|SYMBOL_SOURCE|\
        HGNC_ID|SIFT";

    #[test]
    fn from_description_vep() -> Result<(), anyhow::Error> {
        let format = AnnotationFormat::from_description("CSQ", VEP_DESCRIPTION)?;

        assert_eq!(format.len(), 24);
        assert_eq!(format.fields().next(), Some("allele"));
        assert_eq!(
            FieldIndexes::new(&format),
            FieldIndexes {
                symbol: Some(3),
                gene: Some(4),
                consequence: Some(1),
                protein_position: Some(14),
                amino_acids: Some(15),
                impact: Some(2),
                sift: Some(23),
            }
        );

        Ok(())
    }

    #[test]
    fn undeclared_fields_have_no_index() -> Result<(), anyhow::Error> {
        let format =
            AnnotationFormat::from_description("CSQ", "Format: Allele | Consequence | SYMBOL")?;

        assert_eq!(
            FieldIndexes::new(&format),
            FieldIndexes {
                symbol: Some(2),
                consequence: Some(1),
                ..Default::default()
            }
        );

        Ok(())
    }

    #[test]
    fn missing_format_section() {
        assert_eq!(
            AnnotationFormat::from_description("CSQ", "Consequence annotations"),
            Err(HeaderError::MissingFormatSection("CSQ".into()))
        );
    }

    #[test]
    fn empty_format_section() {
        assert_eq!(
            AnnotationFormat::from_description("CSQ", "Annotations. Format:  "),
            Err(HeaderError::EmptyFormat("CSQ".into()))
        );
    }

    #[test]
    fn duplicate_field() {
        assert_eq!(
            AnnotationFormat::from_description("CSQ", "Format: Allele|SYMBOL|symbol"),
            Err(HeaderError::DuplicateField("symbol".into()))
        );
    }

    #[test]
    fn from_header() -> Result<(), anyhow::Error> {
        let header = vcf::reader::Builder::default()
            .build_from_path("tests/data/convert/example.vcf")?
            .read_header()?;

        let metadata = Metadata::from_header(&header, "CSQ")?;

        assert_eq!(metadata.samples, vec!["S1".to_string(), "S2".to_string()]);
        assert_eq!(metadata.indexes.symbol, Some(3));
        assert_eq!(metadata.indexes.sift, Some(8));

        Ok(())
    }

    #[test]
    fn from_header_missing_info() -> Result<(), anyhow::Error> {
        let header = vcf::reader::Builder::default()
            .build_from_path("tests/data/convert/example.vcf")?
            .read_header()?;

        let err = Metadata::from_header(&header, "ANN").unwrap_err();
        assert_eq!(
            err.downcast_ref::<HeaderError>(),
            Some(&HeaderError::MissingAnnotationInfo("ANN".into()))
        );

        Ok(())
    }
}
