//! Input resolution: read the Markdown source and work out where output goes.
//!
//! Paths are taken as given. There is no normalisation or sandboxing; the
//! caller (or the OS) decides what a path may point at.

use crate::error::ConvertError;
use crate::output::OutputKind;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read a Markdown file as UTF-8 text.
///
/// Distinguishes a missing file and a permission problem from other read
/// failures so the message returned to the tool caller says which it was.
pub async fn read_markdown(path: &Path) -> Result<String, ConvertError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            debug!("Read {} bytes from {}", text.len(), path.display());
            Ok(text)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ConvertError::InputNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(ConvertError::PermissionDenied {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(ConvertError::InputReadFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Default PDF path for a Markdown input: same path, extension replaced.
///
/// `/x/doc.md` → `/x/doc.pdf`; an input without an extension gets `.pdf`
/// appended.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension(OutputKind::Pdf.extension())
}

/// Make sure the directory that will hold `output` exists.
pub async fn prepare_output(output: &Path) -> Result<(), ConvertError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: output.to_path_buf(),
                source: e,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/x/doc.md")),
            PathBuf::from("/x/doc.pdf")
        );
        assert_eq!(
            default_output_path(Path::new("/x/notes.markdown")),
            PathBuf::from("/x/notes.pdf")
        );
        assert_eq!(
            default_output_path(Path::new("/x/README")),
            PathBuf::from("/x/README.pdf")
        );
        assert_eq!(
            default_output_path(Path::new("/x/archive.v2.md")),
            PathBuf::from("/x/archive.v2.pdf")
        );
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_markdown(&dir.path().join("absent.md"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::InputNotFound { .. }));
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn test_read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# Hello\n").unwrap();
        assert_eq!(read_markdown(&path).await.unwrap(), "# Hello\n");
    }

    #[tokio::test]
    async fn test_read_non_utf8_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();
        let err = read_markdown(&path).await.unwrap_err();
        assert!(matches!(err, ConvertError::InputReadFailed { .. }));
    }

    #[tokio::test]
    async fn test_prepare_output_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a/b/c/out.pdf");
        prepare_output(&out).await.unwrap();
        assert!(dir.path().join("a/b/c").is_dir());
    }
}
