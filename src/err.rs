//! Error types shared between the sub commands.

/// Problems with the global annotation declaration in the VCF header.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("no INFO/{0} declaration in VCF header")]
    MissingAnnotationInfo(String),
    #[error("INFO/{0} description has no 'Format:' section")]
    MissingFormatSection(String),
    #[error("INFO/{0} declares no annotation fields")]
    EmptyFormat(String),
    #[error("annotation field {0:?} declared more than once")]
    DuplicateField(String),
}

/// Problems when building a code table.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeTableError {
    #[error("term {term:?} occurs more than once in code table {table}")]
    DuplicateTerm { table: &'static str, term: String },
}
