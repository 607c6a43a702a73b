#![forbid(unsafe_code)]

use jd_core::ids::NamespaceError;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    Json(serde_json::Error),
    InvalidInput(&'static str),
    InvalidNamespace(NamespaceError),
    NotFound {
        collection: String,
        id: String,
    },
    /// Chunks before the failing one stay committed; nothing after it ran.
    PartialBatch {
        committed_chunks: usize,
        committed_ops: usize,
        total_chunks: usize,
        source: Box<StoreError>,
    },
    Poisoned,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::Json(err) => write!(f, "json: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::InvalidNamespace(err) => write!(f, "invalid namespace: {err}"),
            Self::NotFound { collection, id } => {
                write!(f, "not found (collection={collection}, id={id})")
            }
            Self::PartialBatch {
                committed_chunks,
                committed_ops,
                total_chunks,
                source,
            } => write!(
                f,
                "batch stopped after {committed_chunks}/{total_chunks} chunks ({committed_ops} ops committed): {source}"
            ),
            Self::Poisoned => write!(f, "store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sql(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::InvalidNamespace(err) => Some(err),
            Self::PartialBatch { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<NamespaceError> for StoreError {
    fn from(value: NamespaceError) -> Self {
        Self::InvalidNamespace(value)
    }
}
