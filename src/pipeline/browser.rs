//! Headless Chromium session: load a document, wait for Mermaid, capture.
//!
//! One [`BrowserSession`] is one Chromium process with one page. It is
//! created at the start of a conversion and closed at its end, so no
//! browser state is shared between calls and concurrent conversions never
//! interfere with each other.
//!
//! ## Lifecycle
//!
//! ```text
//! launch ──▶ load ──▶ wait_until_ready ──▶ print_pdf | capture_element_png ──▶ close
//! ```
//!
//! Callers must invoke [`BrowserSession::close`] whatever the outcome of
//! the steps in between. If a session is dropped without it, chromiumoxide
//! still kills the child process (`kill_on_drop`), but reaping is left to
//! the runtime.
//!
//! ## Readiness
//!
//! Mermaid renders client-side after the page has loaded, so the load
//! event alone says nothing about the diagrams. After loading, the session
//! polls a [`Readiness`] predicate in the page until it holds or the
//! configured deadline passes.

use crate::config::{PageMargins, PaperSize, RenderConfig};
use crate::error::ConvertError;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, PrintToPdfParams, Viewport,
};
use chromiumoxide::layout::BoundingBox;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Selector of the rendered diagram inside a standalone diagram page.
pub const DIAGRAM_SVG_SELECTOR: &str = ".mermaid svg";

/// Condition that must hold in the page before capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Every `.mermaid` element has an `<svg>` child. Vacuously true when
    /// the document has no diagrams.
    AllDiagrams,
    /// The single `.mermaid` element exists and has an `<svg>` child.
    SingleDiagram,
}

impl Readiness {
    /// JavaScript expression evaluating to a boolean in the page.
    pub fn script(&self) -> &'static str {
        match self {
            Readiness::AllDiagrams => {
                "Array.from(document.querySelectorAll('.mermaid')).every(el => el.querySelector('svg') !== null)"
            }
            Readiness::SingleDiagram => {
                "document.querySelector('.mermaid') !== null && document.querySelector('.mermaid').querySelector('svg') !== null"
            }
        }
    }
}

/// A disposable Chromium process with a single blank page.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl BrowserSession {
    /// Start Chromium and open one page.
    pub async fn launch(config: &RenderConfig) -> Result<Self, ConvertError> {
        let started = Instant::now();
        let browser_config = browser_config(config)?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ConvertError::BrowserLaunch(e.to_string()))?;

        // The handler stream drives the DevTools connection; it must be polled
        // for the whole life of the session. Individual errors (often
        // unknown CDP events) are not fatal to the session.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // Do not leak the process when the page cannot be opened.
                if let Err(close_err) = browser.close().await {
                    warn!("Failed to close browser after page error: {}", close_err);
                }
                let _ = browser.wait().await;
                handler.abort();
                return Err(ConvertError::Browser(format!("Failed to open page: {e}")));
            }
        };

        debug!("Browser ready in {}ms", started.elapsed().as_millis());
        Ok(Self {
            browser,
            handler,
            page,
        })
    }

    /// Replace the page content with `html` and wait for it to load.
    pub async fn load(&self, html: &str) -> Result<(), ConvertError> {
        self.page
            .set_content(html)
            .await
            .map_err(|e| ConvertError::Page(format!("Failed to load document: {e}")))?;
        debug!("Document loaded ({} bytes)", html.len());
        Ok(())
    }

    /// Poll `readiness` until it holds, failing with
    /// [`ConvertError::RenderTimeout`] once `render_timeout_secs` elapse.
    pub async fn wait_until_ready(
        &self,
        readiness: Readiness,
        config: &RenderConfig,
    ) -> Result<(), ConvertError> {
        let deadline = Duration::from_secs(config.render_timeout_secs);
        let interval = Duration::from_millis(config.poll_interval_ms);
        let started = Instant::now();

        // An evaluation error (e.g. the execution context being swapped while
        // the document is rewritten) counts as "not ready yet".
        let poll = async {
            loop {
                match self.evaluate_bool(readiness.script()).await {
                    Ok(true) => return,
                    Ok(false) => {}
                    Err(e) => debug!("Readiness check not conclusive: {}", e),
                }
                tokio::time::sleep(interval).await;
            }
        };

        match tokio::time::timeout(deadline, poll).await {
            Ok(()) => {
                debug!(
                    "Diagrams ready after {}ms ({:?})",
                    started.elapsed().as_millis(),
                    readiness
                );
                Ok(())
            }
            Err(_) => Err(ConvertError::RenderTimeout {
                secs: config.render_timeout_secs,
            }),
        }
    }

    /// Paginate the whole page into a PDF at `output`.
    pub async fn print_pdf(
        &self,
        output: &Path,
        paper: &PaperSize,
        margins: &PageMargins,
    ) -> Result<(), ConvertError> {
        let bytes = self
            .page
            .pdf(pdf_params(paper, margins))
            .await
            .map_err(|e| ConvertError::CaptureFailed(format!("PDF generation failed: {e}")))?;

        write_output(output, &bytes).await?;
        info!("Wrote PDF ({} bytes) to {}", bytes.len(), output.display());
        Ok(())
    }

    /// Screenshot the element matching `selector`, clipped to its bounding
    /// box, as a PNG at `output`.
    ///
    /// The clip is taken in document coordinates and may extend past the
    /// viewport, so diagrams taller or wider than the window come out whole.
    pub async fn capture_element_png(
        &self,
        selector: &str,
        output: &Path,
    ) -> Result<(), ConvertError> {
        let element =
            self.page
                .find_element(selector)
                .await
                .map_err(|_| ConvertError::RenderTargetMissing {
                    selector: selector.to_string(),
                })?;

        let bounds = element
            .bounding_box()
            .await
            .map_err(|e| ConvertError::CaptureFailed(format!("Cannot measure diagram: {e}")))?;
        let scroll = self
            .page
            .layout_metrics()
            .await
            .map_err(|e| ConvertError::CaptureFailed(format!("Cannot read layout metrics: {e}")))?
            .css_layout_viewport;
        let clip = document_clip(&bounds, scroll.page_x, scroll.page_y);
        debug!(
            "Diagram clip {}x{} at ({}, {})",
            clip.width, clip.height, clip.x, clip.y
        );

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .clip(clip)
            .capture_beyond_viewport(true)
            .build();
        let bytes = self
            .page
            .screenshot(params)
            .await
            .map_err(|e| ConvertError::CaptureFailed(format!("Screenshot failed: {e}")))?;

        write_output(output, &bytes).await?;
        info!("Wrote PNG ({} bytes) to {}", bytes.len(), output.display());
        Ok(())
    }

    /// Shut the browser down and reap the process.
    ///
    /// Problems during shutdown are logged, not returned: by the time a
    /// session is closed the conversion has already succeeded or failed.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser process: {}", e);
        }
        self.handler.abort();
        debug!("Browser closed");
    }

    async fn evaluate_bool(&self, script: &str) -> Result<bool, ConvertError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| ConvertError::Page(format!("Readiness check failed: {e}")))?
            .into_value::<bool>()
            .map_err(|e| ConvertError::Page(format!("Readiness check returned non-boolean: {e}")))
    }
}

fn browser_config(config: &RenderConfig) -> Result<BrowserConfig, ConvertError> {
    let mut builder = BrowserConfig::builder()
        .launch_timeout(Duration::from_secs(config.launch_timeout_secs))
        .request_timeout(Duration::from_secs(config.render_timeout_secs.max(30)))
        .arg("--disable-gpu")
        .arg("--hide-scrollbars");

    if let Some(ref path) = config.chrome_executable {
        builder = builder.chrome_executable(path);
    }
    if config.no_sandbox {
        builder = builder.no_sandbox();
    }
    for arg in &config.browser_args {
        builder = builder.arg(arg.clone());
    }

    builder.build().map_err(ConvertError::BrowserLaunch)
}

/// Turn a viewport-relative bounding box into a document-space clip.
///
/// The box model is reported relative to the current scroll position; the
/// scroll offset is added exactly once.
fn document_clip(bounds: &BoundingBox, page_x: i64, page_y: i64) -> Viewport {
    Viewport {
        x: bounds.x + page_x as f64,
        y: bounds.y + page_y as f64,
        width: bounds.width,
        height: bounds.height,
        scale: 1.0,
    }
}

fn pdf_params(paper: &PaperSize, margins: &PageMargins) -> PrintToPdfParams {
    let [top, right, bottom, left] = margins.to_inches();
    PrintToPdfParams {
        print_background: Some(true),
        paper_width: Some(paper.width_in()),
        paper_height: Some(paper.height_in()),
        margin_top: Some(top),
        margin_right: Some(right),
        margin_bottom: Some(bottom),
        margin_left: Some(left),
        ..Default::default()
    }
}

async fn write_output(output: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    tokio::fs::write(output, bytes)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: output.to_path_buf(),
            source: e,
        })
}
