//! Input resolution: turn the user-supplied string into a local PDF path.
//!
//! pdfium opens documents by file-system path only, so URL inputs are
//! downloaded into a `TempDir` whose lifetime is tied to the returned
//! [`ResolvedInput`] — the file disappears when the caller drops the value,
//! panic or not. Both local and downloaded inputs have their `%PDF` magic
//! verified up front, turning a mis-supplied HTML page or text file into a
//! precise error instead of a cryptic pdfium failure later.

use crate::error::ScanlateError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A validated, locally-readable PDF input.
#[derive(Debug)]
pub enum ResolvedInput {
    /// The input string named a file that already exists on disk.
    Local(PathBuf),
    /// The input string was a URL; the body now lives in a temp directory
    /// that is removed when this value is dropped.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path to the local PDF file, wherever it came from.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Whether `input` should be fetched over HTTP rather than opened locally.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` (path or URL) to a readable local PDF.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ScanlateError> {
    if is_url(input) {
        fetch_remote(input, timeout_secs).await
    } else {
        open_local(input)
    }
}

fn open_local(path_str: &str) -> Result<ResolvedInput, ScanlateError> {
    let path = PathBuf::from(path_str);
    if !path.exists() {
        return Err(ScanlateError::FileNotFound { path });
    }

    let mut file = std::fs::File::open(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ScanlateError::PermissionDenied {
            path: path.clone(),
        },
        _ => ScanlateError::FileNotFound { path: path.clone() },
    })?;

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() && &magic != PDF_MAGIC {
        return Err(ScanlateError::NotAPdf { path, magic });
    }

    debug!("Using local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn fetch_remote(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ScanlateError> {
    info!("Fetching PDF: {}", url);

    let failed = |reason: String| ScanlateError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ScanlateError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let body = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    let temp_dir = TempDir::new().map_err(|e| ScanlateError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(remote_file_name(url));

    // Reject non-PDF bodies before anything touches disk.
    if body.len() < 4 || &body[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        let n = body.len().min(4);
        magic[..n].copy_from_slice(&body[..n]);
        return Err(ScanlateError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &body)
        .await
        .map_err(|e| ScanlateError::Internal(format!("temp file write: {e}")))?;

    info!("Fetched {} bytes → {}", body.len(), file_path.display());
    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Name for the downloaded temp file: the URL's last path segment when it
/// carries an extension, otherwise a fixed placeholder.
fn remote_file_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()?
                .next_back()
                .filter(|s| !s.is_empty() && s.contains('.'))
                .map(str::to_string)
        })
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn remote_names_come_from_the_last_segment() {
        assert_eq!(
            remote_file_name("https://example.com/books/kitab.pdf"),
            "kitab.pdf"
        );
        assert_eq!(remote_file_name("https://example.com/"), "downloaded.pdf");
        assert_eq!(remote_file_name("not a url"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn local_non_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"<html>nope</html>").unwrap();

        let err = resolve_input(path.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, ScanlateError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn local_pdf_magic_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"%PDF-1.7\n").unwrap();

        let resolved = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.path(), path.as_path());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = resolve_input("/definitely/not/here.pdf", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanlateError::FileNotFound { .. }));
    }
}
