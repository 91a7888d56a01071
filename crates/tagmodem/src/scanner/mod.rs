//! Tag recognition for the directive markup grammar.
//!
//! The scanner is the leaf of the parser: [`scan_tag`] looks at the
//! unconsumed buffer tail beginning at a `<` and decides whether it starts
//! with a complete marker, could still become one once more input arrives,
//! or is ordinary text. It holds no state across calls and knows nothing
//! about open spans; span policy lives in the parser.
//!
//! Recognition is strict where the grammar is strict (tag names are
//! lowercase, atomic markers must self-close, a write marker must not) and
//! generous where the model is sloppy (attributes in any order, unknown
//! attributes ignored, whitespace tolerated). Anything that fails to
//! classify is literal text — never an error.

/// Tags stripped from the stream without emitting anything: framing the
/// model puts around content it narrates.
const WRAPPER_NAMES: &[&str] = &["code", "thinking", "error", "success", "ai_message"];

/// Every tag name the grammar reserves. Used to distinguish "could still
/// become a marker" from "ordinary text" when input ends mid-name.
const TAG_NAMES: &[&str] = &[
    "write",
    "delete",
    "rename",
    "add-dependency",
    "code",
    "thinking",
    "error",
    "success",
    "ai_message",
    "instructions-reminder",
];

/// Closing tag of the dependency body form, matched as part of the whole
/// element.
const DEPENDENCY_CLOSE: &str = "</add-dependency>";

/// Upper bound on recognized marker length. A candidate that cannot be
/// classified within this many bytes is flushed as text instead of being
/// buffered without bound, and a marker longer than this is rejected even
/// when complete so that streaming and one-shot parses classify it the same
/// way.
pub(crate) const MAX_MARKER_LEN: usize = 4096;

/// A recognized marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Marker<'a> {
    /// `<write file_path="…">` — opens a file-write span.
    WriteOpen { path: &'a str },
    /// `</write>` — closes the open file-write span.
    WriteClose,
    /// `<delete file_path="…"/>`
    Delete { path: &'a str },
    /// `<rename original_path="…" new_path="…"/>`
    Rename { from_path: &'a str, to_path: &'a str },
    /// Either dependency grammar; `version` is `None` when unspecified.
    Dependency {
        name: &'a str,
        version: Option<&'a str>,
    },
    /// A framing tag (open or close) stripped from the stream.
    Wrapper,
    /// `<instructions-reminder>` — the parser discards everything up to and
    /// including the matching closer.
    ReminderOpen,
}

/// Why a candidate failed to classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanFail {
    /// The input ends before the candidate can be ruled in or out.
    NeedMore,
    /// Definitely not a marker; the `<` is literal text.
    Reject,
}

/// A complete marker and the input length it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scanned<'a> {
    pub marker: Marker<'a>,
    pub len: usize,
}

/// Classifies the buffer tail starting at a `<`.
///
/// Returns the marker and its byte length, [`ScanFail::NeedMore`] when the
/// tail is a proper prefix of some marker still in flight, or
/// [`ScanFail::Reject`] when the `<` is literal text. Malformed markup — an
/// unknown tag name, a missing or empty required attribute, an atomic
/// marker that does not self-close — is a `Reject`, never an error.
pub(crate) fn scan_tag(input: &str) -> Result<Scanned<'_>, ScanFail> {
    match classify(input) {
        Ok(scanned) if scanned.len > MAX_MARKER_LEN => Err(ScanFail::Reject),
        Err(ScanFail::NeedMore) if input.len() > MAX_MARKER_LEN => Err(ScanFail::Reject),
        outcome => outcome,
    }
}

fn classify(input: &str) -> Result<Scanned<'_>, ScanFail> {
    let mut cur = Cursor { input, pos: 0 };
    cur.expect(b'<')?;
    let closing = match cur.peek() {
        None => return Err(ScanFail::NeedMore),
        Some(b'/') => {
            cur.pos += 1;
            true
        }
        Some(_) => false,
    };
    let (name, terminated) = cur.read_name();
    if !terminated {
        // Ran out of input mid-name: a marker is still possible only if the
        // bytes so far prefix a reserved name.
        return if TAG_NAMES.iter().any(|tag| tag.starts_with(name)) {
            Err(ScanFail::NeedMore)
        } else {
            Err(ScanFail::Reject)
        };
    }
    if closing {
        return match name {
            "write" => {
                cur.expect(b'>')?;
                Ok(Scanned {
                    marker: Marker::WriteClose,
                    len: cur.pos,
                })
            }
            _ if WRAPPER_NAMES.contains(&name) => {
                cur.expect(b'>')?;
                Ok(Scanned {
                    marker: Marker::Wrapper,
                    len: cur.pos,
                })
            }
            // Stray closers of atomic markers (and of the reminder block
            // outside discard mode) stay literal.
            _ => Err(ScanFail::Reject),
        };
    }
    match name {
        "write" => {
            let (attrs, end) = parse_attrs(&mut cur)?;
            if end != TagEnd::Open {
                return Err(ScanFail::Reject);
            }
            let path = required(attrs.file_path)?;
            Ok(Scanned {
                marker: Marker::WriteOpen { path },
                len: cur.pos,
            })
        }
        "delete" => {
            let (attrs, end) = parse_attrs(&mut cur)?;
            if end != TagEnd::SelfClosing {
                return Err(ScanFail::Reject);
            }
            let path = required(attrs.file_path)?;
            Ok(Scanned {
                marker: Marker::Delete { path },
                len: cur.pos,
            })
        }
        "rename" => {
            let (attrs, end) = parse_attrs(&mut cur)?;
            if end != TagEnd::SelfClosing {
                return Err(ScanFail::Reject);
            }
            let from_path = required(attrs.original_path)?;
            let to_path = required(attrs.new_path)?;
            Ok(Scanned {
                marker: Marker::Rename { from_path, to_path },
                len: cur.pos,
            })
        }
        "add-dependency" => scan_dependency(&mut cur),
        "instructions-reminder" => {
            cur.expect(b'>')?;
            Ok(Scanned {
                marker: Marker::ReminderOpen,
                len: cur.pos,
            })
        }
        _ if WRAPPER_NAMES.contains(&name) => {
            cur.expect(b'>')?;
            Ok(Scanned {
                marker: Marker::Wrapper,
                len: cur.pos,
            })
        }
        _ => Err(ScanFail::Reject),
    }
}

/// Both dependency grammars, cursor positioned right after the tag name.
///
/// The body form is committed atomically: it only matches once its closing
/// tag has fully arrived, so a stream that ends mid-body degrades to text.
fn scan_dependency<'a>(cur: &mut Cursor<'a>) -> Result<Scanned<'a>, ScanFail> {
    if cur.peek() == Some(b'>') {
        // `<add-dependency>name@version</add-dependency>`
        cur.pos += 1;
        let body_start = cur.pos;
        let Some(rel) = cur.input[body_start..].find(DEPENDENCY_CLOSE) else {
            return Err(ScanFail::NeedMore);
        };
        let body = cur.input[body_start..body_start + rel].trim();
        let len = body_start + rel + DEPENDENCY_CLOSE.len();
        // Split at the last `@`; an `@` at position zero is a scope prefix
        // (`@types/node`), not a version separator.
        let (name, version) = match body.rfind('@') {
            Some(at) if at > 0 => {
                let version = body[at + 1..].trim();
                (body[..at].trim(), (!version.is_empty()).then_some(version))
            }
            _ => (body, None),
        };
        if name.is_empty() {
            return Err(ScanFail::Reject);
        }
        Ok(Scanned {
            marker: Marker::Dependency { name, version },
            len,
        })
    } else {
        // `<add-dependency name="…" version="…"/>`
        let (attrs, end) = parse_attrs(cur)?;
        if end != TagEnd::SelfClosing {
            return Err(ScanFail::Reject);
        }
        let name = required(attrs.name)?;
        let version = attrs.version.filter(|v| !v.is_empty());
        Ok(Scanned {
            marker: Marker::Dependency { name, version },
            len: cur.pos,
        })
    }
}

/// The attributes any directive marker may carry. Unknown attributes are
/// parsed and dropped.
#[derive(Debug, Default)]
struct AttrList<'a> {
    file_path: Option<&'a str>,
    original_path: Option<&'a str>,
    new_path: Option<&'a str>,
    name: Option<&'a str>,
    version: Option<&'a str>,
}

/// How an attribute list ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagEnd {
    /// `>`
    Open,
    /// `/>`
    SelfClosing,
}

fn parse_attrs<'a>(cur: &mut Cursor<'a>) -> Result<(AttrList<'a>, TagEnd), ScanFail> {
    let mut attrs = AttrList::default();
    loop {
        cur.skip_whitespace();
        match cur.peek() {
            None => return Err(ScanFail::NeedMore),
            Some(b'>') => {
                cur.pos += 1;
                return Ok((attrs, TagEnd::Open));
            }
            Some(b'/') => {
                cur.pos += 1;
                cur.expect(b'>')?;
                return Ok((attrs, TagEnd::SelfClosing));
            }
            Some(b) if Cursor::is_name_byte(b) => {
                let (key, terminated) = cur.read_name();
                if !terminated {
                    return Err(ScanFail::NeedMore);
                }
                cur.skip_whitespace();
                cur.expect(b'=')?;
                cur.skip_whitespace();
                let value = cur.read_quoted()?;
                match key {
                    "file_path" => attrs.file_path = Some(value),
                    "original_path" => attrs.original_path = Some(value),
                    "new_path" => attrs.new_path = Some(value),
                    "name" => attrs.name = Some(value),
                    "version" => attrs.version = Some(value),
                    _ => {}
                }
            }
            Some(_) => return Err(ScanFail::Reject),
        }
    }
}

fn required(value: Option<&str>) -> Result<&str, ScanFail> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ScanFail::Reject),
    }
}

/// Byte cursor over a candidate marker. Tag syntax is pure ASCII, so
/// byte-level stepping is safe; attribute values are sliced between quote
/// bytes and stay valid UTF-8.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Consumes `b` or fails: end of input is `NeedMore`, a different byte
    /// is `Reject`.
    fn expect(&mut self, b: u8) -> Result<(), ScanFail> {
        match self.peek() {
            None => Err(ScanFail::NeedMore),
            Some(got) if got == b => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(ScanFail::Reject),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn is_name_byte(b: u8) -> bool {
        b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_'
    }

    /// Reads a tag or attribute name. The flag is `false` when input ended
    /// while the name could still be growing.
    fn read_name(&mut self) -> (&'a str, bool) {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if Self::is_name_byte(b) {
                self.pos += 1;
            } else {
                return (&self.input[start..self.pos], true);
            }
        }
        (&self.input[start..self.pos], false)
    }

    /// Reads a `"…"` value, cursor on the opening quote. The value may
    /// contain anything but a quote, including `<` and `>`.
    fn read_quoted(&mut self) -> Result<&'a str, ScanFail> {
        self.expect(b'"')?;
        let start = self.pos;
        match self.input[start..].find('"') {
            Some(rel) => {
                let value = &self.input[start..start + rel];
                self.pos = start + rel + 1;
                Ok(value)
            }
            None => Err(ScanFail::NeedMore),
        }
    }
}
