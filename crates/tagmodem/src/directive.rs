//! Typed chunks emitted by the streaming directive parser.
//!
//! [`Directive`] enumerates parser outputs: document-order segments of an AI
//! response, either narrative text or one of the four edit instructions.
//! [`coalesce`] folds the fragment chunks a mid-stream consumer observes
//! back into logical chunks.

use alloc::{string::String, vec::Vec};

// Helper used solely by serde `skip_serializing_if` to omit `is_complete`
// when it is `false`.
#[cfg(any(test, feature = "serde"))]
#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

/// A typed segment of an AI code-generation response.
///
/// Chunks are emitted in the left-to-right order their markers appear in the
/// logical document, interleaved across kinds. Every chunk is an independent
/// owned value; nothing references parser memory.
///
/// # Streaming contract
///
/// While a file-write span is still streaming, its payload reaches the
/// consumer as a sequence of [`FileWrite`] fragments for the same path: each
/// drain hands out the payload that arrived since the previous drain, and
/// only the fragment that observed the closing marker carries
/// `is_complete: true`. A consumer that drains once, after the stream ends,
/// sees exactly one chunk per span. [`coalesce`] merges fragments back into
/// logical chunks either way.
///
/// # Examples
///
/// ```rust
/// use tagmodem::{Directive, parse_complete};
///
/// let chunks = parse_complete("<add-dependency>lodash</add-dependency>");
/// assert_eq!(
///     chunks,
///     vec![Directive::DependencyAdd {
///         name: "lodash".into(),
///         version: None,
///     }]
/// );
/// ```
///
/// [`FileWrite`]: Directive::FileWrite
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(
    any(test, feature = "serde"),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum Directive {
    /// Narrative prose between directive markers.
    Text {
        /// The text, with wrapper tags already stripped.
        content: String,
    },
    /// A whole-file write, possibly still streaming.
    FileWrite {
        /// Project-relative path of the file being written.
        path: String,
        /// Payload bytes, preserved exactly as they appeared in the span.
        content: String,
        /// `false` while the span's closing marker has not been seen. A
        /// stream that ends mid-span leaves its final fragment incomplete
        /// forever; that is a valid terminal state, not an error.
        #[cfg_attr(
            any(test, feature = "serde"),
            serde(default, skip_serializing_if = "is_false")
        )]
        is_complete: bool,
    },
    /// A file deletion.
    FileDelete {
        /// Project-relative path of the file to delete.
        path: String,
    },
    /// A file rename/move.
    FileRename {
        /// Path the file currently has.
        from_path: String,
        /// Path the file should have.
        to_path: String,
    },
    /// A package dependency to add to the generated project.
    DependencyAdd {
        /// Package name, e.g. `lodash` or `@types/node`.
        name: String,
        /// Requested version; `None` means latest/unspecified. An empty
        /// version attribute normalizes to `None`.
        #[cfg_attr(
            any(test, feature = "serde"),
            serde(skip_serializing_if = "Option::is_none")
        )]
        version: Option<String>,
    },
}

impl Directive {
    /// Returns the narrative content if this is a [`Directive::Text`] chunk.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Directive::Text { content } => Some(content),
            _ => None,
        }
    }

    /// Whether this chunk is terminally complete.
    ///
    /// Every chunk kind is atomic except [`Directive::FileWrite`], which
    /// reports its streaming flag.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self {
            Directive::FileWrite { is_complete, .. } => *is_complete,
            _ => true,
        }
    }
}

/// Merges fragment chunks back into logical chunks.
///
/// A consumer that drains the parser while the stream is in flight observes
/// long text runs and file payloads as fragments (see the streaming contract
/// on [`Directive`]). `coalesce` merges adjacent `Text` chunks, and merges a
/// `FileWrite` fragment into its predecessor when the predecessor is the
/// same path and not yet complete. The result equals what a single drain
/// after end of stream would have produced.
///
/// # Examples
///
/// ```rust
/// use tagmodem::{Directive, StreamingParser, coalesce};
///
/// let mut parser = StreamingParser::new();
/// parser.feed("<write file_path=\"a.txt\">hel");
/// let mut chunks: Vec<Directive> = parser.by_ref().collect();
/// parser.feed("lo</write>");
/// chunks.extend(parser.finish());
///
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(
///     coalesce(chunks),
///     vec![Directive::FileWrite {
///         path: "a.txt".into(),
///         content: "hello".into(),
///         is_complete: true,
///     }]
/// );
/// ```
#[must_use]
pub fn coalesce(chunks: Vec<Directive>) -> Vec<Directive> {
    let mut out: Vec<Directive> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match out.last_mut() {
            Some(tail) => {
                if let Some(chunk) = merge_into(tail, chunk) {
                    out.push(chunk);
                }
            }
            None => out.push(chunk),
        }
    }
    out
}

/// Merges `chunk` into `tail` when both belong to the same logical segment;
/// hands the chunk back otherwise.
fn merge_into(tail: &mut Directive, chunk: Directive) -> Option<Directive> {
    match (tail, chunk) {
        (Directive::Text { content: tail }, Directive::Text { content }) => {
            tail.push_str(&content);
            None
        }
        (
            Directive::FileWrite {
                path: tail_path,
                content: tail,
                is_complete: tail_complete,
            },
            Directive::FileWrite {
                path,
                content,
                is_complete,
            },
        ) if !*tail_complete && *tail_path == path => {
            tail.push_str(&content);
            *tail_complete = is_complete;
            None
        }
        (_, chunk) => Some(chunk),
    }
}
