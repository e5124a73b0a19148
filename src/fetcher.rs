use std::fs;
use std::io::Read;
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use url::Url;

use crate::error::FetchError;
use crate::http::ImageSource;
use crate::mime;
use crate::naming;
use crate::registry::{HashRegistry, content_digest};

/// Hard ceiling on a single image, declared or measured.
pub const MAX_IMAGE_BYTES: u64 = 50 * 1024 * 1024;
/// Bounded-read chunk size for the streaming size guard.
pub const CHUNK_SIZE: usize = 8 * 1024;
/// Pause between consecutive requests in a batch.
pub const POLITENESS_DELAY: Duration = Duration::from_millis(500);

/// Assumed when the probe fails outright; the full fetch re-validates.
const ASSUMED_CONTENT_TYPE: &str = "image/jpeg";

/// Outcome of one URL attempt. Immutable once produced; failures carry a
/// human-readable message and no path.
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub url: String,
    pub success: bool,
    pub message: String,
    pub path: Option<String>,
    pub bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    pub directory: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

struct SavedImage {
    path: Utf8PathBuf,
    bytes: u64,
}

pub struct ImageFetcher<S: ImageSource> {
    directory: Utf8PathBuf,
    source: S,
    registry: HashRegistry,
    delay: Duration,
}

impl<S: ImageSource> ImageFetcher<S> {
    /// Build a fetcher over `directory`, scanning any existing files into the
    /// hash registry. The scan skips unreadable files and never fails.
    pub fn new(directory: Utf8PathBuf, source: S) -> Self {
        let registry = HashRegistry::scan(&directory);
        Self {
            directory,
            source,
            registry,
            delay: POLITENESS_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    pub fn registry(&self) -> &HashRegistry {
        &self.registry
    }

    /// Fetch one URL. Every failure kind is converted to a failed report
    /// here; nothing escapes to abort batch processing.
    pub fn fetch_image(&mut self, raw_url: &str, sink: &dyn ProgressSink) -> FetchReport {
        sink.event(ProgressEvent {
            message: format!("connecting to {raw_url}"),
        });
        match self.try_fetch(raw_url) {
            Ok(saved) => {
                let name = saved.path.file_name().unwrap_or_default().to_string();
                FetchReport {
                    url: raw_url.to_string(),
                    success: true,
                    message: format!("saved {name} ({:.1} KB)", saved.bytes as f64 / 1024.0),
                    path: Some(saved.path.to_string()),
                    bytes: Some(saved.bytes),
                }
            }
            Err(err) => FetchReport {
                url: raw_url.to_string(),
                success: false,
                message: err.to_string(),
                path: None,
                bytes: None,
            },
        }
    }

    /// Fetch URLs in order, one report per input, with a politeness pause
    /// between consecutive attempts. One failure never stops the rest.
    pub fn fetch_many(&mut self, urls: &[String], sink: &dyn ProgressSink) -> Vec<FetchReport> {
        let mut reports = Vec::with_capacity(urls.len());
        for (index, url) in urls.iter().enumerate() {
            let report = self.fetch_image(url.trim(), sink);
            sink.event(ProgressEvent {
                message: report.message.clone(),
            });
            reports.push(report);
            if index + 1 < urls.len() && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
        }
        reports
    }

    fn try_fetch(&mut self, raw_url: &str) -> Result<SavedImage, FetchError> {
        let url =
            Url::parse(raw_url.trim()).map_err(|err| FetchError::InvalidUrl(err.to_string()))?;

        // Phase 1: advisory probe. A failed probe falls back to an assumed
        // type; a completed probe gates on declared type and length.
        let probed_type = match self.source.probe(&url) {
            Ok(info) => {
                let declared = info.content_type.unwrap_or_default();
                if !mime::is_allowed(&declared) {
                    return Err(FetchError::UnsafeType(declared));
                }
                if info.content_length.is_some_and(|len| len > MAX_IMAGE_BYTES) {
                    return Err(FetchError::TooLarge(MAX_IMAGE_BYTES));
                }
                declared
            }
            Err(_) => ASSUMED_CONTENT_TYPE.to_string(),
        };

        // Phase 2: the full response is the authority on type and size.
        let remote = self.source.get(&url)?;
        let content_type = remote.content_type.unwrap_or(probed_type);
        if !mime::is_allowed(&content_type) {
            return Err(FetchError::UnsafeType(content_type));
        }
        let content = read_bounded(remote.body, MAX_IMAGE_BYTES)?;

        // Duplicates are detected on full content only; no file is written
        // and the registry is left unchanged.
        let digest = content_digest(&content);
        if self.registry.contains(&digest) {
            return Err(FetchError::DuplicateContent);
        }

        fs::create_dir_all(self.directory.as_std_path())
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        let filename = naming::derive_filename(&url, &content_type);
        let path = naming::resolve_collision(&self.directory, &filename);
        write_bytes_atomic(&path, &content)?;
        self.registry.insert(digest);

        tracing::debug!(path = %path, bytes = content.len(), "image saved");
        Ok(SavedImage {
            path,
            bytes: content.len() as u64,
        })
    }
}

/// Pure function of the reports; the directory is rendered absolute.
pub fn summarize(reports: &[FetchReport], directory: &Utf8Path) -> Summary {
    let succeeded = reports.iter().filter(|report| report.success).count();
    let directory = std::path::absolute(directory.as_std_path())
        .map(|path| path.display().to_string())
        .unwrap_or_else(|_| directory.to_string());
    Summary {
        succeeded,
        failed: reports.len() - succeeded,
        directory,
    }
}

/// Accumulate the body in bounded chunks with a running-total check,
/// independent of the transport's own buffering.
fn read_bounded(mut body: Box<dyn Read>, limit: u64) -> Result<Vec<u8>, FetchError> {
    let mut content = Vec::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let read = body.read(&mut chunk).map_err(classify_read)?;
        if read == 0 {
            break;
        }
        total += read as u64;
        if total > limit {
            return Err(FetchError::TooLarge(limit));
        }
        content.extend_from_slice(&chunk[..read]);
    }
    Ok(content)
}

fn classify_read(err: std::io::Error) -> FetchError {
    if err.kind() == std::io::ErrorKind::TimedOut {
        FetchError::Timeout
    } else {
        FetchError::ConnectionFailed(err.to_string())
    }
}

fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), FetchError> {
    let tmp_path = path.with_extension("tmp");
    fs::write(tmp_path.as_std_path(), content)
        .map_err(|err| FetchError::Filesystem(err.to_string()))?;
    fs::rename(tmp_path.as_std_path(), path.as_std_path())
        .map_err(|err| FetchError::Filesystem(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn bounded_read_rejects_oversized_stream() {
        let body: Box<dyn Read> = Box::new(std::io::repeat(0x42).take(100));
        let result = read_bounded(body, 64);
        assert_matches!(result, Err(FetchError::TooLarge(64)));
    }

    #[test]
    fn bounded_read_accepts_stream_at_limit() {
        let body: Box<dyn Read> = Box::new(std::io::repeat(0x42).take(64));
        let content = read_bounded(body, 64).unwrap();
        assert_eq!(content.len(), 64);
    }

    #[test]
    fn summary_counts_successes_and_failures() {
        let reports = vec![
            FetchReport {
                url: "http://a".to_string(),
                success: true,
                message: "saved".to_string(),
                path: Some("a.png".to_string()),
                bytes: Some(3),
            },
            FetchReport {
                url: "http://b".to_string(),
                success: false,
                message: "connection timed out".to_string(),
                path: None,
                bytes: None,
            },
        ];
        let summary = summarize(&reports, Utf8Path::new("Fetched_Images"));
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.directory.ends_with("Fetched_Images"));
    }
}
