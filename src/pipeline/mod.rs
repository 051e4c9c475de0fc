//! Pipeline stages for document conversion.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and only [`browser`] needs a real Chromium.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ markup ──▶ document ──▶ browser
//! (read)    (md→html)  (assemble)   (load, wait, capture)
//! ```
//!
//! 1. [`input`]    — read the Markdown file and resolve output paths
//! 2. [`markup`]   — pulldown-cmark with Mermaid fences turned into
//!    diagram containers (Markdown operation only)
//! 3. [`document`] — wrap the body or raw diagram source into a complete
//!    HTML page with styles and the Mermaid bootstrap script
//! 4. [`browser`]  — one headless Chromium per call; the only stage with
//!    process and network I/O

pub mod browser;
pub mod document;
pub mod input;
pub mod markup;
