//! The streaming directive parser implementation.
//!
//! [`StreamingParser`] buffers arriving fragments, classifies as much of the
//! buffer as each fragment allows, and queues [`Directive`] chunks for
//! pull-based consumption through its `Iterator` impl. One scan round runs
//! synchronously inside every [`feed`]; nothing is deferred and nothing
//! blocks.
//!
//! # Examples
//!
//! ```rust
//! use tagmodem::{Directive, StreamingParser};
//!
//! let mut parser = StreamingParser::new();
//! parser.feed("Cleaning up.<delete file_path=\"src/legacy.rs\"/>");
//! let chunks: Vec<Directive> = parser.by_ref().collect();
//! assert_eq!(
//!     chunks,
//!     vec![
//!         Directive::Text {
//!             content: "Cleaning up.".into(),
//!         },
//!         Directive::FileDelete {
//!             path: "src/legacy.rs".into(),
//!         },
//!     ]
//! );
//! ```
//!
//! [`feed`]: StreamingParser::feed

use alloc::{
    collections::VecDeque,
    string::{String, ToString},
    vec::Vec,
};

use crate::{
    directive::Directive,
    scanner::{Marker, ScanFail, Scanned, scan_tag},
};

/// Closing tag of an instructions-reminder block, matched bytewise while
/// the parser is discarding.
const REMINDER_CLOSE: &str = "</instructions-reminder>";

/// A file-write span whose closing marker has not arrived yet.
#[derive(Debug)]
struct OpenSpan {
    path: String,
    /// True while the span's chunk is still queued. The chunk is always the
    /// queue tail (nothing else is emitted while a span is open), so payload
    /// appends and the completion flip go to `queue.back_mut()`. Once the
    /// consumer drains it, further payload goes on continuation chunks.
    queued: bool,
}

/// The streaming directive parser.
///
/// Create one per logical document (one chat response), [`feed`] it raw
/// fragments in arrival order, and drain typed chunks through the `Iterator`
/// impl. Each chunk is delivered at most once; draining twice without an
/// intervening `feed` yields nothing the second time.
///
/// The parser is infallible: arbitrary input produces a best-effort chunk
/// sequence, never an error. It performs no I/O and has no internal
/// concurrency; the transport layer sequences `feed` calls.
///
/// # Examples
///
/// ```rust
/// use tagmodem::{Directive, StreamingParser};
///
/// let mut parser = StreamingParser::new();
/// // The marker is split mid-attribute across fragments.
/// parser.feed("<rename original_path=\"a.txt\" new_");
/// assert_eq!(parser.next(), None);
/// parser.feed("path=\"b.txt\"/>");
/// assert_eq!(
///     parser.next(),
///     Some(Directive::FileRename {
///         from_path: "a.txt".into(),
///         to_path: "b.txt".into(),
///     })
/// );
/// ```
///
/// [`feed`]: StreamingParser::feed
#[derive(Debug)]
pub struct StreamingParser {
    /// Unconsumed input tail. Grows on `feed`, truncated after every scan
    /// round; between rounds it holds at most a candidate marker prefix (or
    /// a partial reminder closer while discarding).
    buf: String,
    open: Option<OpenSpan>,
    /// Inside an `<instructions-reminder>` block; input is dropped unread.
    discarding: bool,
    queue: VecDeque<Directive>,
    end_of_input: bool,
}

impl StreamingParser {
    /// Creates a parser for one logical document or stream.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            open: None,
            discarding: false,
            queue: VecDeque::new(),
            end_of_input: false,
        }
    }

    /// Feeds the next fragment of the stream.
    ///
    /// Fragments may split markers anywhere, including mid-name and
    /// mid-attribute; the parser holds ambiguous tails until they resolve.
    /// Chunks completed by this fragment become available to the iterator
    /// before `feed` returns.
    pub fn feed(&mut self, text: &str) {
        self.buf.push_str(text);
        self.scan();
    }

    /// Marks end of input and returns a closed parser draining the rest.
    ///
    /// A held candidate tail that never resolved is flushed as text (or file
    /// payload); an open file-write span stays `is_complete: false` forever,
    /// which is a valid terminal state for a truncated generation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tagmodem::{Directive, StreamingParser};
    ///
    /// let mut parser = StreamingParser::new();
    /// parser.feed("<write file_path=\"a.txt\">hi");
    /// let chunks: Vec<Directive> = parser.finish().collect();
    /// assert_eq!(
    ///     chunks,
    ///     vec![Directive::FileWrite {
    ///         path: "a.txt".into(),
    ///         content: "hi".into(),
    ///         is_complete: false,
    ///     }]
    /// );
    /// ```
    #[must_use]
    pub fn finish(mut self) -> ClosedStreamingParser {
        self.end_of_input = true;
        Self::scan(&mut self);
        ClosedStreamingParser { parser: self }
    }

    /// One scan round: classify as much of the buffer as possible, queue the
    /// resulting chunks, and truncate the consumed prefix.
    fn scan(&mut self) {
        // Start of the unemitted literal run (text or file payload); `<`
        // bytes between here and `search` were already rejected as literal.
        let mut run_start = 0;
        let mut search = 0;
        loop {
            if self.discarding {
                debug_assert_eq!(run_start, search);
                match self.buf[search..].find(REMINDER_CLOSE) {
                    Some(rel) => {
                        let after = search + rel + REMINDER_CLOSE.len();
                        run_start = after;
                        search = after;
                        self.discarding = false;
                        continue;
                    }
                    None => {
                        // Drop everything except a tail that could still be
                        // a prefix of the closer.
                        let keep = if self.end_of_input {
                            0
                        } else {
                            partial_suffix_len(&self.buf[search..], REMINDER_CLOSE)
                        };
                        run_start = self.buf.len() - keep;
                        break;
                    }
                }
            }

            let Some(rel) = self.buf[search..].find('<') else {
                self.emit_run(run_start, self.buf.len());
                run_start = self.buf.len();
                break;
            };
            let lt = search + rel;

            match scan_tag(&self.buf[lt..]) {
                Ok(Scanned { marker, len }) => {
                    if self.open.is_some() && in_span_literal(&marker) {
                        // Directive-shaped bytes inside an open span are
                        // payload, not instructions.
                        search = lt + len;
                        continue;
                    }
                    let action = Action::from_marker(marker);
                    self.emit_run(run_start, lt);
                    run_start = lt + len;
                    search = run_start;
                    self.apply(action);
                }
                Err(ScanFail::NeedMore) if !self.end_of_input => {
                    self.emit_run(run_start, lt);
                    run_start = lt;
                    break;
                }
                Err(_) => {
                    // Literal `<`: the run continues through it. At end of
                    // input an unresolved candidate lands here too.
                    search = lt + 1;
                }
            }
        }
        self.buf.drain(..run_start);
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::OpenWrite { path } => {
                debug_assert!(self.open.is_none());
                self.queue.push_back(Directive::FileWrite {
                    path: path.clone(),
                    content: String::new(),
                    is_complete: false,
                });
                self.open = Some(OpenSpan { path, queued: true });
            }
            Action::CloseWrite => match self.open.take() {
                Some(span) if span.queued => {
                    debug_assert!(matches!(
                        self.queue.back(),
                        Some(Directive::FileWrite { .. })
                    ));
                    if let Some(Directive::FileWrite { is_complete, .. }) = self.queue.back_mut() {
                        *is_complete = true;
                    }
                }
                Some(span) => {
                    self.queue.push_back(Directive::FileWrite {
                        path: span.path,
                        content: String::new(),
                        is_complete: true,
                    });
                }
                // Orphan closer: nothing to close, nothing to emit.
                None => {}
            },
            Action::Emit(chunk) => self.queue.push_back(chunk),
            Action::Strip => {}
            Action::BeginDiscard => self.discarding = true,
        }
    }

    /// Queues `buf[start..end]` as narrative text or file payload,
    /// coalescing into the unconsumed queue tail where possible.
    fn emit_run(&mut self, start: usize, end: usize) {
        if start == end {
            return;
        }
        match &mut self.open {
            Some(span) if span.queued => {
                debug_assert!(matches!(
                    self.queue.back(),
                    Some(Directive::FileWrite { .. })
                ));
                if let Some(Directive::FileWrite { content, .. }) = self.queue.back_mut() {
                    content.push_str(&self.buf[start..end]);
                }
            }
            Some(span) => {
                self.queue.push_back(Directive::FileWrite {
                    path: span.path.clone(),
                    content: self.buf[start..end].to_string(),
                    is_complete: false,
                });
                span.queued = true;
            }
            None => {
                if let Some(Directive::Text { content }) = self.queue.back_mut() {
                    content.push_str(&self.buf[start..end]);
                } else {
                    self.queue.push_back(Directive::Text {
                        content: self.buf[start..end].to_string(),
                    });
                }
            }
        }
    }
}

impl Default for StreamingParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for StreamingParser {
    type Item = Directive;

    fn next(&mut self) -> Option<Directive> {
        let chunk = self.queue.pop_front()?;
        if self.queue.is_empty() {
            // The open span's chunk is always the queue tail, so an emptied
            // queue means it was just handed out.
            if let Some(span) = &mut self.open {
                span.queued = false;
            }
        }
        Some(chunk)
    }
}

/// A parser whose input has ended.
///
/// Returned by [`StreamingParser::finish`]; iterating drains the remaining
/// chunks and then ends.
#[derive(Debug)]
pub struct ClosedStreamingParser {
    parser: StreamingParser,
}

impl Iterator for ClosedStreamingParser {
    type Item = Directive;

    fn next(&mut self) -> Option<Directive> {
        self.parser.next()
    }
}

/// Parses an already-complete document in one call.
///
/// Degenerate case of the streaming path — one `feed`, one drain — and
/// therefore guaranteed to agree with it.
///
/// # Examples
///
/// ```rust
/// use tagmodem::{Directive, parse_complete};
///
/// let chunks = parse_complete("Remove it.<delete file_path=\"src/old.rs\"/>Done.");
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(
///     chunks[1],
///     Directive::FileDelete {
///         path: "src/old.rs".into(),
///     }
/// );
/// ```
#[must_use]
pub fn parse_complete(text: &str) -> Vec<Directive> {
    let mut parser = StreamingParser::new();
    parser.feed(text);
    parser.finish().collect()
}

/// Markers that are literal payload while a file-write span is open: only
/// the closer, wrapper tags, and instructions-reminder blocks keep their
/// meaning inside a span.
fn in_span_literal(marker: &Marker<'_>) -> bool {
    matches!(
        marker,
        Marker::WriteOpen { .. }
            | Marker::Delete { .. }
            | Marker::Rename { .. }
            | Marker::Dependency { .. }
    )
}

/// A scanner match lowered to owned data, so the buffer it borrowed from
/// can be mutated while the action is handled.
enum Action {
    OpenWrite { path: String },
    CloseWrite,
    Emit(Directive),
    Strip,
    BeginDiscard,
}

impl Action {
    fn from_marker(marker: Marker<'_>) -> Self {
        match marker {
            Marker::WriteOpen { path } => Action::OpenWrite {
                path: path.to_string(),
            },
            Marker::WriteClose => Action::CloseWrite,
            Marker::Delete { path } => Action::Emit(Directive::FileDelete {
                path: path.to_string(),
            }),
            Marker::Rename { from_path, to_path } => Action::Emit(Directive::FileRename {
                from_path: from_path.to_string(),
                to_path: to_path.to_string(),
            }),
            Marker::Dependency { name, version } => Action::Emit(Directive::DependencyAdd {
                name: name.to_string(),
                version: version.map(ToString::to_string),
            }),
            Marker::Wrapper => Action::Strip,
            Marker::ReminderOpen => Action::BeginDiscard,
        }
    }
}

/// Length of the longest proper prefix of `marker` that `tail` ends with.
fn partial_suffix_len(tail: &str, marker: &str) -> usize {
    let max = core::cmp::min(tail.len(), marker.len() - 1);
    (1..=max)
        .rev()
        .find(|&k| tail.ends_with(&marker[..k]))
        .unwrap_or(0)
}
