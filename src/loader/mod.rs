//! Suffix-list sources.

#[cfg(feature = "download")]
mod auto_loader;
#[allow(clippy::module_inception)]
mod loader;

#[cfg(feature = "download")]
pub use auto_loader::AutoListLoader;
pub use loader::{
    verify_list_file, FileListLoader, ListLoader, MemoryListLoader, DEFAULT_LIST_FILENAME,
    DEFAULT_LIST_URL, DEFAULT_UPDATE_INTERVAL,
};
