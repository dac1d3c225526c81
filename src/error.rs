use thiserror::Error;

/// Numeric error codes recorded on a dictionary store as its last error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DictErrorCode {
    /// No error
    Ok = 0,
    /// A table or node could not be allocated
    AllocationFailure = 1,
    /// The key does not exist in the store
    ItemNotFound = 2,
    /// The key was empty
    NullKey = 3,
}

/// Classifies suffix-list download errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadErrorKind {
    /// Required path or URL not configured
    NotConfigured,
    /// HTTP request failed
    RequestFailed,
    /// Downloaded data is not a suffix list
    InvalidData,
    /// File write/rename failure
    FileError,
}

/// Suffix engine error types
#[derive(Error, Debug)]
pub enum PslError {
    #[error("Allocation failed: {0}")]
    AllocationFailure(String),

    #[error("Key can not be empty for a dictionary")]
    NullKey,

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("No match found for domain: {0}")]
    NoMatch(String),

    #[error("Domain can not be empty")]
    EmptyDomain,

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Download error: {message}")]
    Download {
        kind: DownloadErrorKind,
        message: String,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PslError {
    /// Dictionary error code for this error, if it is a dictionary error.
    pub fn dict_code(&self) -> Option<DictErrorCode> {
        match self {
            PslError::AllocationFailure(_) => Some(DictErrorCode::AllocationFailure),
            PslError::NotFound(_) => Some(DictErrorCode::ItemNotFound),
            PslError::NullKey => Some(DictErrorCode::NullKey),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PslError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_kind_is_matchable() {
        let err = PslError::Download {
            kind: DownloadErrorKind::InvalidData,
            message: "missing ICANN section".into(),
        };
        match &err {
            PslError::Download { kind, .. } => {
                assert!(matches!(kind, DownloadErrorKind::InvalidData));
            }
            _ => panic!("expected Download"),
        }
    }

    #[test]
    fn test_download_error_display_includes_message() {
        let err = PslError::Download {
            kind: DownloadErrorKind::RequestFailed,
            message: "connection refused".into(),
        };
        let display = format!("{}", err);
        assert!(display.contains("connection refused"), "got: {}", display);
    }

    #[test]
    fn test_dict_codes() {
        assert_eq!(PslError::NullKey.dict_code(), Some(DictErrorCode::NullKey));
        assert_eq!(
            PslError::NotFound("com".into()).dict_code(),
            Some(DictErrorCode::ItemNotFound)
        );
        assert_eq!(
            PslError::AllocationFailure("table".into()).dict_code(),
            Some(DictErrorCode::AllocationFailure)
        );
        assert_eq!(PslError::NoMatch("example".into()).dict_code(), None);
        assert_eq!(DictErrorCode::NullKey as u8, 3);
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: PslError = io.into();
        assert!(matches!(err, PslError::Io(_)));
        assert!(format!("{}", err).contains("no such file"));
    }
}
