//! A streaming, incremental parser for AI code-edit directive markup.
//!
//! Code-generation chat models interleave narrative prose with structured
//! edit instructions, expressed as inline tags: whole-file writes
//! (`<write file_path="…">…</write>`), deletions
//! (`<delete file_path="…"/>`), renames
//! (`<rename original_path="…" new_path="…"/>`), and dependency additions
//! (`<add-dependency …/>`). The response arrives over a token stream, so a
//! tag may be split at any character boundary — including in the middle of
//! its name or an attribute value.
//!
//! [`StreamingParser`] consumes the stream fragment by fragment and yields
//! typed [`Directive`] chunks in document order while the document is still
//! being produced. [`parse_complete`] is the one-shot entry point for text
//! that has already fully arrived; both run the same state machine, so the
//! two modes agree by construction.
//!
//! Parsing is best-effort and infallible: the input comes from a language
//! model, so malformed markup degrades to plain text rather than raising an
//! error.
//!
//! # Examples
//!
//! ```rust
//! use tagmodem::{Directive, StreamingParser};
//!
//! let mut parser = StreamingParser::new();
//! parser.feed("Adding a file.<write file_path=\"src/main.rs\">fn main() {}");
//! parser.feed("</write> Done.");
//!
//! let chunks: Vec<Directive> = parser.finish().collect();
//! assert_eq!(
//!     chunks,
//!     vec![
//!         Directive::Text {
//!             content: "Adding a file.".into(),
//!         },
//!         Directive::FileWrite {
//!             path: "src/main.rs".into(),
//!             content: "fn main() {}".into(),
//!             is_complete: true,
//!         },
//!         Directive::Text {
//!             content: " Done.".into(),
//!         },
//!     ]
//! );
//! ```

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod directive;
mod parser;
mod scanner;

#[cfg(test)]
mod tests;

pub use directive::{Directive, coalesce};
pub use parser::{ClosedStreamingParser, StreamingParser, parse_complete};
