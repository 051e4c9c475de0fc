//! Markdown → HTML with Mermaid fences turned into diagram containers.
//!
//! pulldown-cmark does all the parsing. The only customisation is the
//! [`MermaidBlocks`] iterator adapter, which sits between the parser and
//! the HTML writer: a fenced block tagged `mermaid` is swallowed and
//! replaced by a raw `<div class="mermaid">` carrying the untouched source,
//! which Mermaid.js later finds and renders in the browser. Every other
//! event, including other fenced blocks, reaches the writer unchanged and
//! gets the stock `<pre><code class="language-…">` treatment with an
//! escaped body.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

/// Fence language that marks a diagram rather than a code listing.
pub const DIAGRAM_LANGUAGE: &str = "mermaid";

/// CSS class of the element Mermaid.js renders into.
pub const DIAGRAM_CLASS: &str = "mermaid";

/// Convert Markdown text to an HTML fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, parser_options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, MermaidBlocks::new(parser));
    out
}

/// Wrap raw diagram source in the container element Mermaid.js looks for.
///
/// The source is not escaped: Mermaid reads the element's text and needs
/// its own syntax (`-->`, `<br>` labels) intact.
pub fn diagram_container(source: &str) -> String {
    format!("<div class=\"{DIAGRAM_CLASS}\">{source}</div>")
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// `true` when a fence info string declares the diagram language.
///
/// Only the first word counts, so `mermaid title="x"` is still a diagram.
fn is_diagram_fence(info: &str) -> bool {
    info.split_whitespace().next() == Some(DIAGRAM_LANGUAGE)
}

/// Iterator adapter replacing Mermaid code blocks with diagram containers.
pub struct MermaidBlocks<'a, I: Iterator<Item = Event<'a>>> {
    iter: I,
    state: BlockState,
    diagrams: usize,
}

#[derive(Debug)]
enum BlockState {
    Normal,
    InDiagram(String),
}

impl<'a, I: Iterator<Item = Event<'a>>> MermaidBlocks<'a, I> {
    pub fn new(iter: I) -> Self {
        Self {
            iter,
            state: BlockState::Normal,
            diagrams: 0,
        }
    }

    /// Number of diagram containers emitted so far.
    pub fn diagram_count(&self) -> usize {
        self.diagrams
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for MermaidBlocks<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let event = self.iter.next()?;

            match &mut self.state {
                BlockState::Normal => match event {
                    Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref info)))
                        if is_diagram_fence(info) =>
                    {
                        self.state = BlockState::InDiagram(String::new());
                    }
                    event => return Some(event),
                },
                BlockState::InDiagram(source) => match event {
                    Event::Text(text) => source.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        let html = format!("{}\n", diagram_container(source));
                        self.state = BlockState::Normal;
                        self.diagrams += 1;
                        return Some(Event::Html(CowStr::Boxed(html.into_boxed_str())));
                    }
                    // Code blocks only ever contain text; anything else is dropped.
                    _ => {}
                },
            }
        }
    }
}
