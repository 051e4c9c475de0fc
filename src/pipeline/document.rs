//! HTML document assembly.
//!
//! Two shapes are produced:
//!
//! * [`full_document`] — a Markdown body wrapped with the default
//!   stylesheet, optional caller CSS, and the Mermaid bootstrap script.
//! * [`diagram_document`] — a single centred diagram container and the
//!   same script, used by the standalone diagram operations.
//!
//! Caller CSS is appended after the defaults inside the same `<style>`
//! element, so equally specific rules override the defaults through normal
//! cascade order. It is passed through untouched; invalid CSS simply fails
//! to apply in the browser.

use crate::config::RenderConfig;
use crate::pipeline::markup::diagram_container;

/// Default styling for Markdown documents.
pub const DEFAULT_STYLESHEET: &str = r#"
body {
  font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
  font-size: 14px;
  line-height: 1.6;
  color: #24292e;
  max-width: 100%;
  margin: 0;
  padding: 0;
}
h1, h2, h3, h4, h5, h6 {
  margin-top: 24px;
  margin-bottom: 16px;
  font-weight: 600;
  line-height: 1.25;
  page-break-after: avoid;
}
h1 { font-size: 2em; border-bottom: 1px solid #eaecef; padding-bottom: 0.3em; }
h2 { font-size: 1.5em; border-bottom: 1px solid #eaecef; padding-bottom: 0.3em; }
h3 { font-size: 1.25em; }
p, ul, ol, table, pre, blockquote { margin-top: 0; margin-bottom: 16px; }
code {
  font-family: "SFMono-Regular", Consolas, "Liberation Mono", Menlo, monospace;
  font-size: 85%;
  background-color: rgba(27, 31, 35, 0.05);
  border-radius: 3px;
  padding: 0.2em 0.4em;
}
pre {
  background-color: #f6f8fa;
  border-radius: 6px;
  padding: 16px;
  overflow: auto;
  page-break-inside: avoid;
}
pre code { background: none; padding: 0; font-size: 100%; }
blockquote { color: #6a737d; border-left: 0.25em solid #dfe2e5; padding: 0 1em; margin-left: 0; }
table { border-collapse: collapse; width: 100%; page-break-inside: avoid; }
th, td { border: 1px solid #dfe2e5; padding: 6px 13px; }
th { background-color: #f6f8fa; font-weight: 600; }
tr:nth-child(2n) { background-color: #f6f8fa; }
img { max-width: 100%; }
.mermaid { text-align: center; margin: 20px 0; page-break-inside: avoid; }
.mermaid svg { max-width: 100%; height: auto; }
"#;

/// Fixed styling for the standalone diagram page.
const DIAGRAM_STYLESHEET: &str = r#"
body {
  margin: 0;
  padding: 20px;
  display: flex;
  justify-content: center;
  align-items: center;
  min-height: 100vh;
  box-sizing: border-box;
  background: white;
}
.mermaid { display: flex; justify-content: center; }
"#;

/// Build the complete HTML document for the Markdown → PDF operation.
pub fn full_document(body_html: &str, custom_css: Option<&str>, config: &RenderConfig) -> String {
    let mut css = String::from(DEFAULT_STYLESHEET);
    if let Some(extra) = custom_css {
        css.push('\n');
        css.push_str(extra);
        css.push('\n');
    }

    format!(
        "<!DOCTYPE html>\n\
<html>\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<style>{css}</style>\n\
{script}\n\
</head>\n\
<body>\n\
{body_html}\n\
</body>\n\
</html>\n",
        script = mermaid_script(config),
    )
}

/// Build the minimal HTML document holding a single diagram.
pub fn diagram_document(source: &str, config: &RenderConfig) -> String {
    format!(
        "<!DOCTYPE html>\n\
<html>\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<style>{DIAGRAM_STYLESHEET}</style>\n\
{script}\n\
</head>\n\
<body>\n\
{container}\n\
</body>\n\
</html>\n",
        script = mermaid_script(config),
        container = diagram_container(source),
    )
}

/// Module script importing Mermaid and rendering every container on load.
///
/// `securityLevel: 'loose'` lets diagrams keep the inline event handlers
/// and HTML labels Mermaid generates.
fn mermaid_script(config: &RenderConfig) -> String {
    format!(
        "<script type=\"module\">\n\
import mermaid from {url};\n\
mermaid.initialize({{ startOnLoad: true, theme: {theme}, securityLevel: 'loose' }});\n\
</script>",
        url = js_string(&config.mermaid_script_url),
        theme = js_string(&config.mermaid_theme),
    )
}

/// Quote a value as a JavaScript string literal that is also safe inside
/// an HTML `<script>` element.
fn js_string(value: &str) -> String {
    // serde_json's escaping is valid JS; `</` is split so the literal cannot
    // close the surrounding script tag.
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace("</", "<\\/")
}
