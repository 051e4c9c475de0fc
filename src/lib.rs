//! # mermaid-pdf-mcp
//!
//! Convert Markdown documents and Mermaid diagrams to PDF and PNG using
//! headless Chromium, exposed as an MCP tool server.
//!
//! ## Why a browser?
//!
//! Mermaid only renders client-side in JavaScript. Rather than reimplement
//! diagram layout, each conversion loads an HTML page into a fresh headless
//! Chromium, waits for Mermaid to turn every diagram into SVG, and then
//! lets the browser paginate (PDF) or screenshot (PNG) the result.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown / Mermaid source
//!  │
//!  ├─ 1. Build    pulldown-cmark → HTML, ```mermaid fences → diagram containers
//!  ├─ 2. Acquire  launch one headless Chromium for this call
//!  ├─ 3. Render   load the page, poll until every diagram has an <svg>
//!  └─ 4. Capture  print to PDF or screenshot the diagram, then close the browser
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mermaid_pdf_mcp::{convert_md_to_pdf, MarkdownRequest, RenderConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RenderConfig::default();
//!     let request = MarkdownRequest::new("/docs/design.md");
//!     let result = convert_md_to_pdf(&request, &config).await;
//!     match result.into_result() {
//!         Ok(path) => println!("wrote {}", path.display()),
//!         Err(message) => eprintln!("failed: {message}"),
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mermaid-pdf-mcp` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when embedding only the library:
//! ```toml
//! mermaid-pdf-mcp = { version = "0.1", default-features = false }
//! ```
//!
//! ## Requirements
//!
//! A Chromium or Chrome executable must be installed (or pointed to with
//! [`RenderConfigBuilder::chrome_executable`]), and the page must be able to
//! fetch the Mermaid ES module from [`RenderConfig::mermaid_script_url`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod mcp;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PageMargins, PaperSize, RenderConfig, RenderConfigBuilder};
pub use convert::{
    assemble_markdown_document, convert_md_to_pdf, convert_mermaid_to_pdf, convert_mermaid_to_png,
    render_markdown_pdf, render_mermaid_pdf, render_mermaid_png, DiagramRequest, MarkdownRequest,
};
pub use error::ConvertError;
pub use mcp::run_server;
pub use output::{ConversionResult, OutputKind};
