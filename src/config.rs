//! Configuration types for document rendering.
//!
//! Every knob the conversion operations consult lives in [`RenderConfig`],
//! built via its [`RenderConfigBuilder`]. The defaults reproduce the stock
//! behaviour of the MCP tools: a 30 s rendering deadline, A4 paper, 20 mm
//! margins for Markdown documents and 10 mm margins for standalone diagrams.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Mermaid ESM bundle loaded by every generated document.
///
/// Pinned to an exact release so a new Mermaid version cannot change
/// diagram layout between runs.
pub const DEFAULT_MERMAID_URL: &str =
    "https://cdn.jsdelivr.net/npm/mermaid@10.9.1/dist/mermaid.esm.min.mjs";

/// Default deadline for client-side diagram rendering, in seconds.
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30;

const MM_PER_INCH: f64 = 25.4;

/// Configuration for a conversion.
///
/// Built via [`RenderConfig::builder()`] or using [`RenderConfig::default()`].
///
/// # Example
/// ```rust
/// use mermaid_pdf_mcp::{PageMargins, RenderConfig};
///
/// let config = RenderConfig::builder()
///     .render_timeout_secs(10)
///     .markdown_margins(PageMargins::uniform(15.0))
///     .no_sandbox(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.render_timeout_secs, 10);
/// ```
#[derive(Clone)]
pub struct RenderConfig {
    /// Upper bound on the readiness poll. Range: 1–600. Default: 30.
    ///
    /// Elapsing this deadline is the only way a conversion of a malformed
    /// diagram ends, so it doubles as the hang guard.
    pub render_timeout_secs: u64,

    /// Delay between two evaluations of the readiness predicate. Default: 100.
    pub poll_interval_ms: u64,

    /// URL of the Mermaid ES module imported by the generated HTML.
    pub mermaid_script_url: String,

    /// Mermaid theme passed to `mermaid.initialize`. Default: `"default"`.
    pub mermaid_theme: String,

    /// Paper size for PDF output. Default: A4.
    pub paper: PaperSize,

    /// Margins for the Markdown → PDF operation. Default: 20 mm.
    pub markdown_margins: PageMargins,

    /// Margins for the diagram → PDF operation. Default: 10 mm.
    pub diagram_margins: PageMargins,

    /// Explicit Chromium binary. If None, chromiumoxide auto-detects one.
    pub chrome_executable: Option<PathBuf>,

    /// Launch Chromium with `--no-sandbox` (needed in most containers).
    pub no_sandbox: bool,

    /// Extra command-line switches passed to Chromium.
    pub browser_args: Vec<String>,

    /// How long to wait for the browser's DevTools endpoint. Default: 20.
    pub launch_timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            render_timeout_secs: DEFAULT_RENDER_TIMEOUT_SECS,
            poll_interval_ms: 100,
            mermaid_script_url: DEFAULT_MERMAID_URL.to_string(),
            mermaid_theme: "default".to_string(),
            paper: PaperSize::default(),
            markdown_margins: PageMargins::uniform(20.0),
            diagram_margins: PageMargins::uniform(10.0),
            chrome_executable: None,
            no_sandbox: false,
            browser_args: Vec::new(),
            launch_timeout_secs: 20,
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("mermaid_script_url", &self.mermaid_script_url)
            .field("mermaid_theme", &self.mermaid_theme)
            .field("paper", &self.paper)
            .field("markdown_margins", &self.markdown_margins)
            .field("diagram_margins", &self.diagram_margins)
            .field("chrome_executable", &self.chrome_executable)
            .field("no_sandbox", &self.no_sandbox)
            .field("browser_args", &self.browser_args.len())
            .finish()
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms.max(10);
        self
    }

    pub fn mermaid_script_url(mut self, url: impl Into<String>) -> Self {
        self.config.mermaid_script_url = url.into();
        self
    }

    pub fn mermaid_theme(mut self, theme: impl Into<String>) -> Self {
        self.config.mermaid_theme = theme.into();
        self
    }

    pub fn paper(mut self, paper: PaperSize) -> Self {
        self.config.paper = paper;
        self
    }

    pub fn markdown_margins(mut self, margins: PageMargins) -> Self {
        self.config.markdown_margins = margins;
        self
    }

    pub fn diagram_margins(mut self, margins: PageMargins) -> Self {
        self.config.diagram_margins = margins;
        self
    }

    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    pub fn no_sandbox(mut self, v: bool) -> Self {
        self.config.no_sandbox = v;
        self
    }

    pub fn browser_arg(mut self, arg: impl Into<String>) -> Self {
        self.config.browser_args.push(arg.into());
        self
    }

    pub fn launch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.launch_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, ConvertError> {
        let c = &self.config;
        if c.render_timeout_secs == 0 || c.render_timeout_secs > 600 {
            return Err(ConvertError::InvalidConfig(format!(
                "Render timeout must be 1–600 seconds, got {}",
                c.render_timeout_secs
            )));
        }
        if c.mermaid_script_url.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "Mermaid script URL must not be empty".into(),
            ));
        }
        if c.mermaid_theme.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "Mermaid theme must not be empty".into(),
            ));
        }
        c.markdown_margins.validate(&c.paper)?;
        c.diagram_margins.validate(&c.paper)?;
        Ok(self.config)
    }
}

// ── Page geometry ────────────────────────────────────────────────────────

/// Paper size used when paginating to PDF, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperSize {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PaperSize {
    /// ISO A4, 210 × 297 mm.
    pub const A4: PaperSize = PaperSize {
        width_mm: 210.0,
        height_mm: 297.0,
    };

    /// US Letter, 8.5 × 11 in.
    pub const LETTER: PaperSize = PaperSize {
        width_mm: 215.9,
        height_mm: 279.4,
    };

    pub fn width_in(&self) -> f64 {
        mm_to_in(self.width_mm)
    }

    pub fn height_in(&self) -> f64 {
        mm_to_in(self.height_mm)
    }

    /// Look up a named paper size (`a4`, `letter`), case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "a4" => Some(Self::A4),
            "letter" => Some(Self::LETTER),
            _ => None,
        }
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    pub top_mm: f64,
    pub right_mm: f64,
    pub bottom_mm: f64,
    pub left_mm: f64,
}

impl PageMargins {
    /// The same margin on all four sides.
    pub fn uniform(mm: f64) -> Self {
        Self {
            top_mm: mm,
            right_mm: mm,
            bottom_mm: mm,
            left_mm: mm,
        }
    }

    /// Margins as inches in CSS order (top, right, bottom, left), the unit
    /// the DevTools print API expects.
    pub fn to_inches(&self) -> [f64; 4] {
        [
            mm_to_in(self.top_mm),
            mm_to_in(self.right_mm),
            mm_to_in(self.bottom_mm),
            mm_to_in(self.left_mm),
        ]
    }

    fn validate(&self, paper: &PaperSize) -> Result<(), ConvertError> {
        let all = [self.top_mm, self.right_mm, self.bottom_mm, self.left_mm];
        if all.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(ConvertError::InvalidConfig(format!(
                "Margins must be non-negative, got {self:?}"
            )));
        }
        if self.left_mm + self.right_mm >= paper.width_mm
            || self.top_mm + self.bottom_mm >= paper.height_mm
        {
            return Err(ConvertError::InvalidConfig(format!(
                "Margins {self:?} leave no printable area on {paper:?}"
            )));
        }
        Ok(())
    }
}

fn mm_to_in(mm: f64) -> f64 {
    mm / MM_PER_INCH
}
