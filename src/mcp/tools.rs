//! Tool descriptors and dispatch for the MCP server.
//!
//! Builds the `tools/list` response and routes `tools/call` requests to the
//! conversion operations. Required arguments are checked here, before any
//! conversion starts, so a malformed call never launches a browser.

use crate::config::RenderConfig;
use crate::convert::{
    convert_md_to_pdf, convert_mermaid_to_pdf, convert_mermaid_to_png, DiagramRequest,
    MarkdownRequest,
};
use crate::error::ConvertError;
use crate::output::{ConversionResult, OutputKind};
use serde_json::Value;
use tracing::{debug, info};

pub const CONVERT_MD_TO_PDF: &str = "convert_md_to_pdf";
pub const CONVERT_MERMAID_TO_PNG: &str = "convert_mermaid_to_png";
pub const CONVERT_MERMAID_TO_PDF: &str = "convert_mermaid_to_pdf";

// ── Tool descriptors ─────────────────────────────────────────────────────

fn md_to_pdf_tool() -> Value {
    serde_json::json!({
        "name": CONVERT_MD_TO_PDF,
        "description": "Convert a Markdown file to PDF. Fenced ```mermaid code blocks are rendered as diagrams.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "input_path": {
                    "type": "string",
                    "description": "Absolute path to the Markdown file"
                },
                "output_path": {
                    "type": "string",
                    "description": "Absolute path for the PDF (defaults to the input path with a .pdf extension)"
                },
                "custom_css": {
                    "type": "string",
                    "description": "Extra CSS appended after the default stylesheet"
                }
            },
            "required": ["input_path"]
        }
    })
}

fn diagram_tool(name: &str, kind: OutputKind) -> Value {
    let description = match kind {
        OutputKind::Png => "Render Mermaid diagram source to a PNG image cropped to the diagram.",
        OutputKind::Pdf => "Render Mermaid diagram source to a single-diagram PDF.",
    };
    serde_json::json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": {
                "mermaid_code": {
                    "type": "string",
                    "description": "Mermaid diagram source"
                },
                "output_path": {
                    "type": "string",
                    "description": format!("Absolute path for the {} file", kind.label())
                }
            },
            "required": ["mermaid_code", "output_path"]
        }
    })
}

// ── Dispatch ─────────────────────────────────────────────────────────────

/// Handle the `tools/list` request.
pub fn handle_tools_list() -> Value {
    serde_json::json!({
        "tools": [
            md_to_pdf_tool(),
            diagram_tool(CONVERT_MERMAID_TO_PNG, OutputKind::Png),
            diagram_tool(CONVERT_MERMAID_TO_PDF, OutputKind::Pdf),
        ]
    })
}

/// Handle the `tools/call` request.
///
/// Always yields a tool result; failures are reported in-band with
/// `isError: true` so the client sees the message.
pub async fn handle_tools_call(params: &Value, config: &RenderConfig) -> Value {
    let name = params.get("name").and_then(Value::as_str).unwrap_or("");
    let empty = Value::Object(Default::default());
    let args = params.get("arguments").unwrap_or(&empty);
    debug!("tools/call {}", name);

    match name {
        CONVERT_MD_TO_PDF => {
            let (input_path, output, css) = match (
                required_str(args, "input_path"),
                optional_str(args, "output_path"),
                optional_str(args, "custom_css"),
            ) {
                (Ok(input), Ok(output), Ok(css)) => (input, output, css),
                (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
            };
            let mut request = MarkdownRequest::new(input_path);
            if let Some(output) = output {
                request = request.output_path(output);
            }
            if let Some(css) = css {
                request = request.custom_css(css);
            }
            let result = convert_md_to_pdf(&request, config).await;
            tool_result("Markdown", OutputKind::Pdf, result)
        }
        CONVERT_MERMAID_TO_PNG | CONVERT_MERMAID_TO_PDF => {
            let (code, output) = match (
                required_str(args, "mermaid_code"),
                required_str(args, "output_path"),
            ) {
                (Ok(code), Ok(output)) => (code, output),
                (Err(e), _) | (_, Err(e)) => return e,
            };
            let request = DiagramRequest::new(code, output);
            let (kind, result) = if name == CONVERT_MERMAID_TO_PNG {
                (OutputKind::Png, convert_mermaid_to_png(&request, config).await)
            } else {
                (OutputKind::Pdf, convert_mermaid_to_pdf(&request, config).await)
            };
            tool_result("Mermaid diagram", kind, result)
        }
        _ => tool_error(&format!("Unknown tool: {name}")),
    }
}

/// Extract a required, non-empty string argument or a ready-made error result.
fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, Value> {
    optional_str(args, key)?.ok_or_else(|| tool_error(&ConvertError::missing(key).to_string()))
}

/// Optional string argument. Absent, `null` and blank strings count as not
/// given; any other non-string value is rejected.
fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, Value> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(v)) if v.trim().is_empty() => Ok(None),
        Some(Value::String(v)) => Ok(Some(v.as_str())),
        Some(_) => Err(tool_error(
            &ConvertError::InvalidArgument {
                name: key.to_string(),
                expected: "string",
            }
            .to_string(),
        )),
    }
}

fn tool_result(source: &str, kind: OutputKind, result: ConversionResult) -> Value {
    match result.into_result() {
        Ok(path) => {
            info!("{} → {} written to {}", source, kind.label(), path.display());
            tool_text(&format!(
                "Successfully converted {source} to {}: {}",
                kind.label(),
                path.display()
            ))
        }
        Err(message) => tool_error(&format!(
            "Error converting {source} to {}: {message}",
            kind.label()
        )),
    }
}

// ── Result helpers ───────────────────────────────────────────────────────

/// Build a successful text tool result.
pub fn tool_text(message: &str) -> Value {
    serde_json::json!({
        "content": [{
            "type": "text",
            "text": message
        }]
    })
}

/// Build a tool error result.
pub fn tool_error(message: &str) -> Value {
    serde_json::json!({
        "isError": true,
        "content": [{
            "type": "text",
            "text": message
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn text(result: &Value) -> &str {
        result["content"][0]["text"].as_str().unwrap()
    }

    #[test]
    fn required_lists_match_tools() {
        let list = handle_tools_list();
        let tools = list["tools"].as_array().unwrap();
        let required: Vec<(&str, Vec<&str>)> = tools
            .iter()
            .map(|t| {
                let req = t["inputSchema"]["required"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|v| v.as_str().unwrap())
                    .collect();
                (t["name"].as_str().unwrap(), req)
            })
            .collect();
        assert_eq!(
            required,
            vec![
                (CONVERT_MD_TO_PDF, vec!["input_path"]),
                (CONVERT_MERMAID_TO_PNG, vec!["mermaid_code", "output_path"]),
                (CONVERT_MERMAID_TO_PDF, vec!["mermaid_code", "output_path"]),
            ]
        );
    }

    #[test]
    fn blank_arguments_are_missing() {
        let args = serde_json::json!({ "a": "  ", "b": "x", "n": null });
        assert!(required_str(&args, "a").is_err());
        assert!(required_str(&args, "n").is_err());
        assert!(required_str(&args, "zzz").is_err());
        assert_eq!(required_str(&args, "b").unwrap(), "x");
        assert_eq!(optional_str(&args, "a"), Ok(None));
        assert_eq!(optional_str(&args, "n"), Ok(None));
    }

    #[test]
    fn wrongly_typed_arguments_are_rejected() {
        let args = serde_json::json!({ "output_path": 42, "custom_css": ["a"] });
        let err = optional_str(&args, "output_path").unwrap_err();
        assert_eq!(text(&err), "Argument 'output_path' must be a string");
        let err = optional_str(&args, "custom_css").unwrap_err();
        assert_eq!(text(&err), "Argument 'custom_css' must be a string");
        let err = required_str(&args, "output_path").unwrap_err();
        assert_eq!(err["isError"], true);
        assert!(!text(&err).contains("Missing"));
    }

    #[test]
    fn success_and_failure_text() {
        let ok = tool_result(
            "Markdown",
            OutputKind::Pdf,
            ConversionResult::succeeded(PathBuf::from("/tmp/a.pdf")),
        );
        assert!(ok.get("isError").is_none());
        assert_eq!(text(&ok), "Successfully converted Markdown to PDF: /tmp/a.pdf");

        let err = tool_result(
            "Mermaid diagram",
            OutputKind::Png,
            ConversionResult::failed("boom"),
        );
        assert_eq!(err["isError"], true);
        assert_eq!(text(&err), "Error converting Mermaid diagram to PNG: boom");
    }

    #[tokio::test]
    async fn missing_output_path_short_circuits() {
        let params = serde_json::json!({
            "name": CONVERT_MERMAID_TO_PNG,
            "arguments": { "mermaid_code": "graph TD\nA-->B" }
        });
        let result = handle_tools_call(&params, &RenderConfig::default()).await;
        assert_eq!(result["isError"], true);
        assert_eq!(text(&result), "Missing required argument 'output_path'");
    }
}
