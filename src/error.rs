use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Group '{group}' has none of the variables: {candidates}")]
    MissingVariable { group: String, candidates: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// What a per-record failure is keyed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    /// A location identifier
    Id(i64),
    /// Position in the `Info` arrays, when the identifier itself is unusable
    Entry(usize),
    /// A series subgroup whose name is not a location identifier
    Subgroup(String),
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::Id(id) => write!(f, "id {}", id),
            RecordKey::Entry(index) => write!(f, "entry #{}", index),
            RecordKey::Subgroup(name) => write!(f, "subgroup '{}'", name),
        }
    }
}

/// Failure of a single location, measurement row or series subgroup.
///
/// These are logged with the offending key and skipped; sibling
/// records are still attempted.
#[derive(Error, Debug)]
#[error("{key}: {source}")]
pub struct RecordError {
    pub key: RecordKey,
    #[source]
    pub source: AppError,
}

impl RecordError {
    pub fn new(id: i64, source: AppError) -> Self {
        Self::at(RecordKey::Id(id), source)
    }

    pub fn at(key: RecordKey, source: AppError) -> Self {
        Self { key, source }
    }

    /// Location identifier, if the failure is tied to one
    pub fn id(&self) -> Option<i64> {
        match self.key {
            RecordKey::Id(id) => Some(id),
            _ => None,
        }
    }
}

/// Failure that ends extraction for the current file.
#[derive(Error, Debug)]
pub enum IngestError {
    /// A required top-level group is absent. Work done so far is still committed.
    #[error("Group not found: {0}")]
    MissingGroup(String),

    /// The file could not be processed at all. Nothing from this run is committed.
    #[error("File processing failed: {0}")]
    File(#[from] AppError),
}

impl IngestError {
    pub fn is_structural(&self) -> bool {
        matches!(self, IngestError::MissingGroup(_))
    }
}
