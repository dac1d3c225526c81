use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DownloadErrorKind, PslError, Result};
use crate::parser::BEGIN_ICANN;

/// Default update interval: 7 days
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Upstream location of the Public Suffix List
pub const DEFAULT_LIST_URL: &str = "https://publicsuffix.org/list/public_suffix_list.dat";

/// File name used for the cached list
pub const DEFAULT_LIST_FILENAME: &str = "public_suffix_list.dat";

/// Trait for obtaining suffix-list text
pub trait ListLoader: Send + Sync {
    /// Return the full text of the suffix list
    fn load_list(&self) -> Result<String>;
}

/// Reads the list from a file
#[derive(Debug, Clone)]
pub struct FileListLoader {
    path: PathBuf,
}

impl FileListLoader {
    /// Create a loader for `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path this loader reads
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ListLoader for FileListLoader {
    fn load_list(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| {
            PslError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read suffix list '{}': {}", self.path.display(), e),
            ))
        })
    }
}

/// Serves list text held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryListLoader {
    data: String,
}

impl MemoryListLoader {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

impl ListLoader for MemoryListLoader {
    fn load_list(&self) -> Result<String> {
        Ok(self.data.clone())
    }
}

/// Check that a file looks like a suffix list (has an ICANN section).
pub fn verify_list_file(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)?;
    if !text.contains(BEGIN_ICANN) {
        return Err(PslError::Download {
            kind: DownloadErrorKind::InvalidData,
            message: format!("{} has no ICANN section", path.display()),
        });
    }
    Ok(())
}
