//! Error types for the mermaid-pdf-mcp library.
//!
//! Every conversion failure is a [`ConvertError`]. The variants are grouped
//! by where the failure happened:
//!
//! * **Input** — a required argument is missing, or the Markdown file cannot
//!   be found or read.
//! * **Rendering** — Mermaid never produced an `<svg>` before the deadline,
//!   or the element to capture is absent.
//! * **Environment** — Chromium failed to launch or the DevTools session
//!   broke down.
//! * **Output** — the PDF/PNG could not be written to the target path.
//!
//! The conversion operations in [`crate::convert`] catch all of them at the
//! operation boundary and turn them into a failed
//! [`crate::output::ConversionResult`]; the fallible `render_*` twins
//! return them as-is for library callers that prefer `?`.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while converting a document.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// A required tool argument was absent or empty.
    #[error("Missing required argument '{name}'")]
    MissingArgument { name: String },

    /// A tool argument was present but of the wrong JSON type.
    #[error("Argument '{name}' must be a {expected}")]
    InvalidArgument { name: String, expected: &'static str },

    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read as UTF-8 text.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// Mermaid did not finish rendering before the deadline.
    #[error("Timed out after {secs}s waiting for Mermaid diagrams to render")]
    RenderTimeout { secs: u64 },

    /// The element to capture was not present in the rendered page.
    #[error("Rendered diagram not found (selector '{selector}')")]
    RenderTargetMissing { selector: String },

    /// Loading the document or evaluating script in the page failed.
    #[error("Page error: {0}")]
    Page(String),

    // ── Environment errors ────────────────────────────────────────────────
    /// Chromium could not be started.
    #[error("Failed to launch headless browser: {0}")]
    BrowserLaunch(String),

    /// The DevTools session failed after launch.
    #[error("Browser error: {0}")]
    Browser(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output directory or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The browser refused to produce the PDF or screenshot.
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ConvertError {
    /// Shorthand used by the tool front-end when validating arguments.
    pub fn missing(name: impl Into<String>) -> Self {
        ConvertError::MissingArgument { name: name.into() }
    }

    /// `true` for failures caused by the caller's arguments or input file,
    /// as opposed to the renderer or the filesystem.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ConvertError::MissingArgument { .. }
                | ConvertError::InvalidArgument { .. }
                | ConvertError::InputNotFound { .. }
                | ConvertError::PermissionDenied { .. }
                | ConvertError::InputReadFailed { .. }
        )
    }
}
