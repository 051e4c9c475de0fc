//! CLI binary for mermaid-pdf-mcp.
//!
//! Runs the MCP stdio server by default; the `md`, `png` and `pdf`
//! subcommands run a single conversion and exit.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use mermaid_pdf_mcp::{
    assemble_markdown_document, convert_md_to_pdf, convert_mermaid_to_pdf, convert_mermaid_to_png,
    run_server, ConversionResult, DiagramRequest, MarkdownRequest, PaperSize, RenderConfig,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run as an MCP server over stdio (default)
  mermaid-pdf-mcp
  mermaid-pdf-mcp serve --no-sandbox

  # Markdown to PDF (writes notes.pdf next to notes.md)
  mermaid-pdf-mcp md notes.md

  # Markdown with extra styling, explicit output
  mermaid-pdf-mcp md notes.md --css print.css -o /tmp/notes.pdf

  # Inspect the generated HTML without launching a browser
  mermaid-pdf-mcp md notes.md --emit-html -o notes.html

  # Mermaid source to PNG / PDF, reading from stdin
  echo 'graph TD; A-->B' | mermaid-pdf-mcp png - -o flow.png
  mermaid-pdf-mcp pdf flow.mmd -o flow.pdf --theme dark

MCP CLIENT CONFIGURATION:
  {
    "mcpServers": {
      "mermaid-pdf": { "command": "mermaid-pdf-mcp", "args": ["serve"] }
    }
  }

ENVIRONMENT VARIABLES:
  MERMAID_PDF_TIMEOUT      Diagram rendering deadline in seconds
  MERMAID_PDF_CHROME       Path to the Chromium/Chrome executable
  MERMAID_PDF_NO_SANDBOX   Launch Chromium without its sandbox
  MERMAID_PDF_MERMAID_URL  Mermaid ES module URL loaded by each page
  MERMAID_PDF_THEME        Mermaid theme (default, dark, forest, neutral)
  MERMAID_PDF_PAPER        Paper size for PDFs (a4, letter)
  RUST_LOG                 Log filter; overrides -v / -q
"#;

/// Convert Markdown and Mermaid diagrams to PDF/PNG with headless Chromium.
#[derive(Parser, Debug)]
#[command(
    name = "mermaid-pdf-mcp",
    version,
    about = "Convert Markdown and Mermaid diagrams to PDF/PNG, as an MCP server or one-shot CLI",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    render: RenderArgs,

    /// Print the conversion result as JSON on stdout.
    #[arg(long, global = true, env = "MERMAID_PDF_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MERMAID_PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MERMAID_PDF_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Seconds to wait for diagrams to render (1–600).
    #[arg(long, global = true, env = "MERMAID_PDF_TIMEOUT", default_value_t = 30,
          value_parser = clap::value_parser!(u64).range(1..=600))]
    timeout: u64,

    /// Chromium/Chrome executable; auto-detected if not set.
    #[arg(long, global = true, env = "MERMAID_PDF_CHROME")]
    chrome: Option<PathBuf>,

    /// Launch Chromium with --no-sandbox (containers, CI).
    #[arg(long, global = true, env = "MERMAID_PDF_NO_SANDBOX")]
    no_sandbox: bool,

    /// URL of the Mermaid ES module imported by generated pages.
    #[arg(long, global = true, env = "MERMAID_PDF_MERMAID_URL")]
    mermaid_url: Option<String>,

    /// Mermaid theme.
    #[arg(long, global = true, env = "MERMAID_PDF_THEME", default_value = "default")]
    theme: String,

    /// Paper size for PDF output: a4 or letter.
    #[arg(long, global = true, env = "MERMAID_PDF_PAPER", default_value = "a4")]
    paper: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP server on stdin/stdout (default).
    Serve,

    /// Convert a Markdown file to PDF.
    Md {
        /// Markdown file.
        input: PathBuf,

        /// Output path; defaults to the input with a .pdf extension.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CSS file appended after the default stylesheet.
        #[arg(long)]
        css: Option<PathBuf>,

        /// Write the assembled HTML instead of rendering a PDF.
        #[arg(long)]
        emit_html: bool,
    },

    /// Render a Mermaid diagram to PNG.
    Png(DiagramArgs),

    /// Render a Mermaid diagram to PDF.
    Pdf(DiagramArgs),
}

#[derive(Args, Debug)]
struct DiagramArgs {
    /// File holding the diagram source, or `-` for stdin.
    input: String,

    /// Output path.
    #[arg(short, long)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Always stderr: in server mode stdout is the protocol channel.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.render)?;

    let command = cli.command.unwrap_or(Command::Serve);
    let show_progress = !cli.quiet && !cli.json && !matches!(command, Command::Serve);

    let result = match command {
        Command::Serve => {
            run_server(&config).await;
            return Ok(());
        }
        Command::Md {
            input,
            output,
            css,
            emit_html,
        } => {
            let mut request = MarkdownRequest::new(input);
            if let Some(css) = css {
                let text = tokio::fs::read_to_string(&css)
                    .await
                    .with_context(|| format!("Failed to read CSS from {:?}", css))?;
                request = request.custom_css(text);
            }

            if emit_html {
                let html = assemble_markdown_document(&request, &config)
                    .await
                    .context("Failed to assemble HTML")?;
                let target = output.unwrap_or_else(|| request.input_path.with_extension("html"));
                tokio::fs::write(&target, html)
                    .await
                    .with_context(|| format!("Failed to write HTML to {:?}", target))?;
                ConversionResult::succeeded(target)
            } else {
                if let Some(output) = output {
                    request = request.output_path(output);
                }
                let spinner = spinner(show_progress, "Rendering PDF…");
                let result = convert_md_to_pdf(&request, &config).await;
                spinner.finish_and_clear();
                result
            }
        }
        Command::Png(args) => {
            let request = diagram_request(args).await?;
            let spinner = spinner(show_progress, "Rendering PNG…");
            let result = convert_mermaid_to_png(&request, &config).await;
            spinner.finish_and_clear();
            result
        }
        Command::Pdf(args) => {
            let request = diagram_request(args).await?;
            let spinner = spinner(show_progress, "Rendering PDF…");
            let result = convert_mermaid_to_pdf(&request, &config).await;
            spinner.finish_and_clear();
            result
        }
    };

    report(&result, cli.json, cli.quiet)?;
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `RenderConfig`.
fn build_config(args: &RenderArgs) -> Result<RenderConfig> {
    let paper = match PaperSize::from_name(&args.paper) {
        Some(p) => p,
        None => bail!("Unknown paper size '{}'; expected a4 or letter", args.paper),
    };

    let mut builder = RenderConfig::builder()
        .render_timeout_secs(args.timeout)
        .mermaid_theme(args.theme.clone())
        .paper(paper)
        .no_sandbox(args.no_sandbox);
    if let Some(ref url) = args.mermaid_url {
        builder = builder.mermaid_script_url(url.clone());
    }
    if let Some(ref chrome) = args.chrome {
        builder = builder.chrome_executable(chrome.clone());
    }

    builder.build().context("Invalid configuration")
}

async fn diagram_request(args: DiagramArgs) -> Result<DiagramRequest> {
    let source = if args.input == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read diagram from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(&args.input)
            .await
            .with_context(|| format!("Failed to read diagram from {:?}", args.input))?
    };
    Ok(DiagramRequest::new(source, args.output))
}

fn spinner(enabled: bool, message: &'static str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn report(result: &ConversionResult, json: bool, quiet: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(result).context("Failed to serialise result")?
        );
        return Ok(());
    }

    match (result.path(), result.error.as_deref()) {
        (Some(path), _) if result.success => {
            if !quiet {
                eprintln!("{}  {}", green("✔"), bold(&path.display().to_string()));
            }
        }
        (_, error) => {
            eprintln!("{}  {}", red("✘"), error.unwrap_or("Conversion failed"));
        }
    }
    Ok(())
}
