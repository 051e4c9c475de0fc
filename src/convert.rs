//! The three conversion operations.
//!
//! Every operation runs the same four phases:
//!
//! 1. **Build** the HTML document ([`crate::pipeline::document`]; Markdown
//!    goes through [`crate::pipeline::markup`] first).
//! 2. **Acquire** a fresh [`BrowserSession`].
//! 3. **Render & gate**: load the document and poll until Mermaid has
//!    produced its SVGs, bounded by `render_timeout_secs`.
//! 4. **Capture** the PDF or PNG, then **release** the browser whether the
//!    capture worked or not.
//!
//! The public `convert_*` functions never fail: any error is turned into a
//! failed [`ConversionResult`] at the operation boundary. Library callers
//! who want the typed [`ConvertError`] use the `render_*` twins instead.
//! Nothing is retried.

use crate::config::{PageMargins, RenderConfig};
use crate::error::ConvertError;
use crate::output::{ConversionResult, OutputKind};
use crate::pipeline::browser::{BrowserSession, Readiness, DIAGRAM_SVG_SELECTOR};
use crate::pipeline::{document, input, markup};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Arguments of the Markdown → PDF operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownRequest {
    pub input_path: PathBuf,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// Extra CSS appended after the default stylesheet.
    #[serde(default)]
    pub custom_css: Option<String>,
}

impl MarkdownRequest {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: None,
            custom_css: None,
        }
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn custom_css(mut self, css: impl Into<String>) -> Self {
        self.custom_css = Some(css.into());
        self
    }

    /// Where the PDF will be written: the explicit output path, or the
    /// input path with its extension replaced by `.pdf`.
    pub fn resolved_output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| input::default_output_path(&self.input_path))
    }
}

/// Arguments of the two standalone diagram operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramRequest {
    pub mermaid_code: String,
    pub output_path: PathBuf,
}

impl DiagramRequest {
    pub fn new(mermaid_code: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            mermaid_code: mermaid_code.into(),
            output_path: output_path.into(),
        }
    }
}

// ── Operation boundary ───────────────────────────────────────────────────

/// Convert a Markdown file (with Mermaid fences) to PDF.
pub async fn convert_md_to_pdf(request: &MarkdownRequest, config: &RenderConfig) -> ConversionResult {
    finish("md→pdf", render_markdown_pdf(request, config).await)
}

/// Render a Mermaid diagram to a PNG clipped to the diagram.
pub async fn convert_mermaid_to_png(request: &DiagramRequest, config: &RenderConfig) -> ConversionResult {
    finish("mermaid→png", render_mermaid_png(request, config).await)
}

/// Render a Mermaid diagram to a single-diagram PDF.
pub async fn convert_mermaid_to_pdf(request: &DiagramRequest, config: &RenderConfig) -> ConversionResult {
    finish("mermaid→pdf", render_mermaid_pdf(request, config).await)
}

fn finish(operation: &str, result: Result<PathBuf, ConvertError>) -> ConversionResult {
    match result {
        Err(ref e) if e.is_input_error() => info!("{} rejected: {}", operation, e),
        Err(ref e) => warn!("{} failed: {}", operation, e),
        Ok(_) => {}
    }
    result.into()
}

// ── Fallible operations ──────────────────────────────────────────────────

/// Build the HTML document for a Markdown request without rendering it.
pub async fn assemble_markdown_document(
    request: &MarkdownRequest,
    config: &RenderConfig,
) -> Result<String, ConvertError> {
    let markdown = input::read_markdown(&request.input_path).await?;
    let body = markup::markdown_to_html(&markdown);
    Ok(document::full_document(
        &body,
        request.custom_css.as_deref(),
        config,
    ))
}

/// Markdown → PDF, returning the written path or the typed error.
pub async fn render_markdown_pdf(
    request: &MarkdownRequest,
    config: &RenderConfig,
) -> Result<PathBuf, ConvertError> {
    let started = Instant::now();
    let output = request.resolved_output_path();
    info!(
        "Converting {} → {}",
        request.input_path.display(),
        output.display()
    );

    // ── Build ────────────────────────────────────────────────────────────
    let html = assemble_markdown_document(request, config).await?;

    // ── Acquire / render / capture / release ─────────────────────────────
    let session = BrowserSession::launch(config).await?;
    let captured = async {
        session.load(&html).await?;
        session.wait_until_ready(Readiness::AllDiagrams, config).await?;
        input::prepare_output(&output).await?;
        session
            .print_pdf(&output, &config.paper, pdf_margins(PdfSource::Markdown, config))
            .await
    }
    .await;
    session.close().await;
    captured?;

    info!("Markdown converted in {}ms", started.elapsed().as_millis());
    Ok(output)
}

/// Mermaid → PNG, returning the written path or the typed error.
pub async fn render_mermaid_png(
    request: &DiagramRequest,
    config: &RenderConfig,
) -> Result<PathBuf, ConvertError> {
    render_diagram(request, config, OutputKind::Png).await
}

/// Mermaid → PDF, returning the written path or the typed error.
pub async fn render_mermaid_pdf(
    request: &DiagramRequest,
    config: &RenderConfig,
) -> Result<PathBuf, ConvertError> {
    render_diagram(request, config, OutputKind::Pdf).await
}

/// Shared body of the diagram operations; only the capture step differs.
async fn render_diagram(
    request: &DiagramRequest,
    config: &RenderConfig,
    kind: OutputKind,
) -> Result<PathBuf, ConvertError> {
    let started = Instant::now();
    let output = request.output_path.as_path();
    info!(
        "Rendering diagram ({} bytes) → {} {}",
        request.mermaid_code.len(),
        kind.label(),
        output.display()
    );

    // ── Build ────────────────────────────────────────────────────────────
    let html = document::diagram_document(&request.mermaid_code, config);

    // ── Acquire / render / capture / release ─────────────────────────────
    let session = BrowserSession::launch(config).await?;
    let captured = async {
        session.load(&html).await?;
        session
            .wait_until_ready(Readiness::SingleDiagram, config)
            .await?;
        input::prepare_output(output).await?;
        match kind {
            OutputKind::Png => {
                session
                    .capture_element_png(DIAGRAM_SVG_SELECTOR, output)
                    .await
            }
            OutputKind::Pdf => {
                session
                    .print_pdf(output, &config.paper, pdf_margins(PdfSource::Diagram, config))
                    .await
            }
        }
    }
    .await;
    session.close().await;
    captured?;

    debug!("Diagram rendered in {}ms", started.elapsed().as_millis());
    Ok(output.to_path_buf())
}

/// Which page a PDF is printed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PdfSource {
    Markdown,
    Diagram,
}

fn pdf_margins(source: PdfSource, config: &RenderConfig) -> &PageMargins {
    match source {
        PdfSource::Markdown => &config.markdown_margins,
        PdfSource::Diagram => &config.diagram_margins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_output_defaults_to_pdf_sibling() {
        let req = MarkdownRequest::new("/x/doc.md");
        assert_eq!(req.resolved_output_path(), PathBuf::from("/x/doc.pdf"));
    }

    #[test]
    fn explicit_output_wins() {
        let req = MarkdownRequest::new("/x/doc.md").output_path("/y/out.pdf");
        assert_eq!(req.resolved_output_path(), PathBuf::from("/y/out.pdf"));
    }

    #[test]
    fn requests_deserialise_from_tool_arguments() {
        let req: MarkdownRequest = serde_json::from_value(serde_json::json!({
            "input_path": "/x/doc.md",
            "custom_css": "h1 { color: red; }"
        }))
        .unwrap();
        assert_eq!(req.output_path, None);
        assert_eq!(req.custom_css.as_deref(), Some("h1 { color: red; }"));

        let req: DiagramRequest = serde_json::from_value(serde_json::json!({
            "mermaid_code": "graph TD\nA-->B",
            "output_path": "/x/d.png"
        }))
        .unwrap();
        assert_eq!(req.output_path, PathBuf::from("/x/d.png"));
    }

    #[test]
    fn pdf_margins_follow_source() {
        let config = RenderConfig::builder()
            .markdown_margins(PageMargins::uniform(25.0))
            .diagram_margins(PageMargins::uniform(5.0))
            .build()
            .unwrap();
        assert_eq!(
            pdf_margins(PdfSource::Markdown, &config),
            &PageMargins::uniform(25.0)
        );
        assert_eq!(
            pdf_margins(PdfSource::Diagram, &config),
            &PageMargins::uniform(5.0)
        );

        let defaults = RenderConfig::default();
        assert_eq!(pdf_margins(PdfSource::Markdown, &defaults).top_mm, 20.0);
        assert_eq!(pdf_margins(PdfSource::Diagram, &defaults).top_mm, 10.0);
    }

    #[tokio::test]
    async fn failed_launch_leaves_no_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = RenderConfig::builder()
            .chrome_executable(dir.path().join("no-such-chrome"))
            .build()
            .unwrap();

        let req = DiagramRequest::new("graph TD\nA-->B", dir.path().join("nested/out.png"));
        let result = convert_mermaid_to_png(&req, &config).await;
        assert!(!result.success);
        assert!(!dir.path().join("nested").exists());

        let md = dir.path().join("doc.md");
        std::fs::write(&md, "# Doc\n").unwrap();
        let req = MarkdownRequest::new(&md).output_path(dir.path().join("pdfs/doc.pdf"));
        let result = convert_md_to_pdf(&req, &config).await;
        assert!(!result.success);
        assert!(!dir.path().join("pdfs").exists());
    }

    #[tokio::test]
    async fn missing_input_fails_before_browser() {
        let dir = tempfile::tempdir().unwrap();
        let req = MarkdownRequest::new(dir.path().join("nope.md"));
        let result = convert_md_to_pdf(&req, &RenderConfig::default()).await;
        assert!(!result.success);
        assert!(result.output_path.is_none());
        assert!(result.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn assemble_includes_custom_css_and_diagrams() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# Doc\n\n```mermaid\ngraph TD\nA-->B\n```\n").unwrap();

        let req = MarkdownRequest::new(&path).custom_css("h1 { color: red; }");
        let html = assemble_markdown_document(&req, &RenderConfig::default())
            .await
            .unwrap();
        assert!(html.contains("<div class=\"mermaid\">graph TD\nA-->B\n</div>"));
        assert!(html.contains("h1 { color: red; }"));
        assert!(html.contains("<h1>Doc</h1>"));
    }
}
