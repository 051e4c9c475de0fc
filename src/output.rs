//! Result records returned by the conversion operations.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outcome of a single conversion.
///
/// Exactly one of `output_path` / `error` is populated, matching `success`.
/// The constructors are the only way the library builds one, so that
/// invariant holds for every value it returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn succeeded(path: impl Into<PathBuf>) -> Self {
        Self {
            success: true,
            output_path: Some(path.into()),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output_path: None,
            error: Some(message.into()),
        }
    }

    /// Path of the written file, if the conversion succeeded.
    pub fn path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Convert back into a `Result`, e.g. for `?` in callers.
    ///
    /// The error side carries the stringified message; the original
    /// [`ConvertError`] is gone by the time a result is built.
    pub fn into_result(self) -> Result<PathBuf, String> {
        match (self.output_path, self.error) {
            (Some(path), None) if self.success => Ok(path),
            (_, Some(error)) => Err(error),
            _ => Err("Conversion produced no output".to_string()),
        }
    }
}

impl From<Result<PathBuf, ConvertError>> for ConversionResult {
    fn from(result: Result<PathBuf, ConvertError>) -> Self {
        match result {
            Ok(path) => Self::succeeded(path),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// What a conversion writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    Pdf,
    Png,
}

impl OutputKind {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputKind::Pdf => "pdf",
            OutputKind::Png => "png",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutputKind::Pdf => "PDF",
            OutputKind::Png => "PNG",
        }
    }
}
