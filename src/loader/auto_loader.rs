use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log::{info, warn};
use parking_lot::Mutex;

use crate::error::{DownloadErrorKind, PslError, Result};

use super::loader::{
    verify_list_file, ListLoader, DEFAULT_LIST_FILENAME, DEFAULT_LIST_URL, DEFAULT_UPDATE_INTERVAL,
};

/// Logger callback type for list updates
type LoggerCallback = Box<dyn Fn(&str) + Send + Sync>;

/// List loader that keeps a downloaded copy of the suffix list fresh.
///
/// The cached file is downloaded again when it is missing, empty or older
/// than the update interval. If the download fails and a cached copy
/// exists, the cached copy is used.
pub struct AutoListLoader {
    pub list_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub url: String,
    pub update_interval: Duration,
    pub logger: Option<LoggerCallback>,
    download_lock: Mutex<()>,
}

impl AutoListLoader {
    /// Create a loader for the upstream list in the current directory
    pub fn new() -> Self {
        Self {
            list_path: None,
            data_dir: None,
            url: DEFAULT_LIST_URL.to_string(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            logger: None,
            download_lock: Mutex::new(()),
        }
    }

    /// Set data directory
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Use an explicit file path for the cached list
    pub fn with_list_path(mut self, path: impl AsRef<Path>) -> Self {
        self.list_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set custom download URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set update interval for checking file freshness
    /// Default is 7 days (DEFAULT_UPDATE_INTERVAL)
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Set logger
    pub fn with_logger<F>(mut self, logger: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.logger = Some(Box::new(logger));
        self
    }

    fn log(&self, msg: &str) {
        if let Some(ref logger) = self.logger {
            logger(msg);
        }
    }

    /// Path of the cached list
    pub fn list_path(&self) -> PathBuf {
        if let Some(ref path) = self.list_path {
            return path.clone();
        }
        match self.data_dir {
            Some(ref dir) => dir.join(DEFAULT_LIST_FILENAME),
            None => PathBuf::from(DEFAULT_LIST_FILENAME),
        }
    }

    /// Check if the cached file needs a download
    pub fn should_download(&self, path: &Path) -> bool {
        match fs::metadata(path) {
            Ok(meta) => {
                if meta.len() == 0 {
                    return true;
                }
                match meta.modified() {
                    Ok(mtime) => SystemTime::now()
                        .duration_since(mtime)
                        .map(|d| d > self.update_interval)
                        .unwrap_or(true),
                    Err(_) => true,
                }
            }
            Err(_) => true,
        }
    }

    /// Download the list to `path`
    fn download(&self, path: &Path) -> Result<()> {
        let _lock = self.download_lock.lock();

        // Double-check after acquiring lock
        if !self.should_download(path) {
            return Ok(());
        }

        self.log(&format!("Downloading {} from {}", path.display(), self.url));

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| file_error(parent, e))?;
        }

        let tmp_path = path.with_extension("tmp");

        let response = ureq::get(self.url.as_str()).call().map_err(|e| PslError::Download {
            kind: DownloadErrorKind::RequestFailed,
            message: format!("Download of {} failed: {}", self.url, e),
        })?;

        let (_, body) = response.into_parts();
        write_tmp(&mut body.into_reader(), &tmp_path)?;

        if let Err(e) = verify_list_file(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(PslError::Download {
                kind: DownloadErrorKind::InvalidData,
                message: format!("Verification failed: {}", e),
            });
        }

        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(file_error(path, e));
        }

        info!("Downloaded suffix list to {}", path.display());
        self.log(&format!("Downloaded {} successfully", path.display()));
        Ok(())
    }

    /// Make sure a usable copy of the list is on disk and return its path
    pub fn ensure_downloaded(&self) -> Result<PathBuf> {
        let path = self.list_path();

        if self.should_download(&path) {
            if let Err(e) = self.download(&path) {
                if !path.exists() {
                    return Err(e);
                }
                warn!("Suffix list download failed, using cached {}: {}", path.display(), e);
                self.log(&format!("Download failed, using existing file: {}", e));
            }
        }

        Ok(path)
    }
}

impl Default for AutoListLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ListLoader for AutoListLoader {
    fn load_list(&self) -> Result<String> {
        let path = self.ensure_downloaded()?;
        Ok(fs::read_to_string(&path)?)
    }
}

/// Copy a response body into `tmp_path`; the file is removed again on failure.
fn write_tmp(reader: &mut impl Read, tmp_path: &Path) -> Result<()> {
    let mut file = fs::File::create(tmp_path).map_err(|e| file_error(tmp_path, e))?;
    let result = std::io::copy(reader, &mut file)
        .map_err(|e| PslError::Download {
            kind: DownloadErrorKind::RequestFailed,
            message: format!("Reading response body failed: {}", e),
        })
        .and_then(|_| file.flush().map_err(|e| file_error(tmp_path, e)));
    drop(file);

    if result.is_err() {
        let _ = fs::remove_file(tmp_path);
    }
    result
}

fn file_error(path: &Path, e: std::io::Error) -> PslError {
    PslError::Download {
        kind: DownloadErrorKind::FileError,
        message: format!("{}: {}", path.display(), e),
    }
}
