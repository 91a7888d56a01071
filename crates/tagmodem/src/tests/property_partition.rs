use alloc::{string::String, vec::Vec};

use quickcheck::{Arbitrary, Gen, QuickCheck};
use quickcheck_macros::quickcheck;

use crate::{Directive, StreamingParser, coalesce, parse_complete};

/// Maps arbitrary bytes onto a directive-dense alphabet: whole markers,
/// marker fragments that land on feed boundaries, lone `<`, multi-byte
/// characters, and prose.
fn render_atoms(atoms: &[u8]) -> String {
    let mut doc = String::new();
    for &b in atoms {
        match b % 16 {
            0 => doc.push_str("<write file_path=\"a.txt\">"),
            1 => doc.push_str("</write>"),
            2 => doc.push_str("<delete file_path=\"gone.txt\"/>"),
            3 => doc.push_str("<rename original_path=\"old\" new_path=\"new\"/>"),
            4 => doc.push_str("<add-dependency name=\"lodash\" version=\"4\"/>"),
            5 => doc.push_str("<add-dependency>react@18</add-dependency>"),
            6 => doc.push_str("<thinking>"),
            7 => doc.push_str("</thinking>"),
            8 => doc.push_str("<instructions-reminder>"),
            9 => doc.push_str("</instructions-reminder>"),
            10 => doc.push_str("<wri"),
            11 => doc.push_str("te file_path=\"b\">"),
            12 => doc.push('<'),
            13 => doc.push('日'),
            14 => doc.push_str("plain text "),
            _ => doc.push(char::from(b'a' + (b % 26))),
        }
    }
    doc
}

/// Feeds `doc` in chunk sizes derived from `splits`, draining after every
/// feed, and returns everything drained.
fn stream_with_drains(doc: &str, splits: &[usize]) -> Vec<Directive> {
    let mut parser = StreamingParser::new();
    let mut drained = Vec::new();
    let chars: Vec<char> = doc.chars().collect();
    let mut idx = 0;
    let mut remaining = chars.len();
    for &s in splits {
        if remaining == 0 {
            break;
        }
        let size = 1 + (s % remaining);
        let chunk: String = chars[idx..idx + size].iter().collect();
        parser.feed(&chunk);
        drained.extend(parser.by_ref());
        idx += size;
        remaining -= size;
    }
    if remaining > 0 {
        let chunk: String = chars[idx..].iter().collect();
        parser.feed(&chunk);
        drained.extend(parser.by_ref());
    }
    drained.extend(parser.finish());
    drained
}

/// Property: feeding a document in arbitrary chunk sizes, draining between
/// feeds, must coalesce to the one-shot chunk sequence.
#[test]
fn partition_equivalence_quickcheck() {
    fn prop(atoms: Vec<u8>, splits: Vec<usize>) -> bool {
        let doc = render_atoms(&atoms);
        coalesce(stream_with_drains(&doc, &splits)) == parse_complete(&doc)
    }

    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    QuickCheck::new()
        .tests(tests)
        .quickcheck(prop as fn(Vec<u8>, Vec<usize>) -> bool);
}

/// Property: any split with a single final drain matches the one-shot parse
/// byte for byte, even on arbitrary (directive-free or malformed) input.
#[quickcheck]
fn single_drain_matches_one_shot(doc: String, splits: Vec<usize>) -> bool {
    let mut parser = StreamingParser::new();
    let chars: Vec<char> = doc.chars().collect();
    let mut idx = 0;
    let mut remaining = chars.len();
    for &s in &splits {
        if remaining == 0 {
            break;
        }
        let size = 1 + (s % remaining);
        let chunk: String = chars[idx..idx + size].iter().collect();
        parser.feed(&chunk);
        idx += size;
        remaining -= size;
    }
    if remaining > 0 {
        let chunk: String = chars[idx..].iter().collect();
        parser.feed(&chunk);
    }
    let streamed: Vec<Directive> = parser.finish().collect();
    streamed == parse_complete(&doc)
}

/// A well-formed segment with prose kept free of `<`, so the expected chunk
/// sequence can be computed directly.
#[derive(Clone, Debug)]
enum Seg {
    Text(String),
    Write { path: String, content: String },
    Delete { path: String },
    Rename { from: String, to: String },
    Dep { name: String, version: Option<String> },
}

const PROSE: &[char] = &[
    'a', 'b', 'c', ' ', '.', '>', '/', '"', '@', '\n', 'é', '本',
];
const PATH: &[char] = &['a', 'b', 'c', '0', '1', '/', '.', '_', '-'];

fn pick(g: &mut Gen, alphabet: &[char], max_len: usize) -> String {
    let len = 1 + usize::arbitrary(g) % max_len;
    let mut out = String::new();
    for _ in 0..len {
        out.push(*g.choose(alphabet).expect("non-empty alphabet"));
    }
    out
}

impl Arbitrary for Seg {
    fn arbitrary(g: &mut Gen) -> Seg {
        match u8::arbitrary(g) % 5 {
            0 => Seg::Text(pick(g, PROSE, 12)),
            1 => Seg::Write {
                path: pick(g, PATH, 8),
                content: pick(g, PROSE, 24),
            },
            2 => Seg::Delete {
                path: pick(g, PATH, 8),
            },
            3 => Seg::Rename {
                from: pick(g, PATH, 8),
                to: pick(g, PATH, 8),
            },
            _ => Seg::Dep {
                name: pick(g, PATH, 8),
                version: bool::arbitrary(g).then(|| pick(g, PATH, 4)),
            },
        }
    }
}

fn render_segs(segs: &[Seg]) -> String {
    use core::fmt::Write as _;

    let mut doc = String::new();
    for seg in segs {
        match seg {
            Seg::Text(content) => doc.push_str(content),
            Seg::Write { path, content } => {
                let _ = write!(doc, "<write file_path=\"{path}\">{content}</write>");
            }
            Seg::Delete { path } => {
                let _ = write!(doc, "<delete file_path=\"{path}\"/>");
            }
            Seg::Rename { from, to } => {
                let _ = write!(doc, "<rename original_path=\"{from}\" new_path=\"{to}\"/>");
            }
            Seg::Dep { name, version } => match version {
                Some(v) => {
                    let _ = write!(doc, "<add-dependency name=\"{name}\" version=\"{v}\"/>");
                }
                None => {
                    let _ = write!(doc, "<add-dependency>{name}</add-dependency>");
                }
            },
        }
    }
    doc
}

fn expected_chunks(segs: &[Seg]) -> Vec<Directive> {
    let mut out: Vec<Directive> = Vec::new();
    for seg in segs {
        match seg {
            Seg::Text(content) => {
                if let Some(Directive::Text { content: tail }) = out.last_mut() {
                    tail.push_str(content);
                } else {
                    out.push(Directive::Text {
                        content: content.clone(),
                    });
                }
            }
            Seg::Write { path, content } => out.push(Directive::FileWrite {
                path: path.clone(),
                content: content.clone(),
                is_complete: true,
            }),
            Seg::Delete { path } => out.push(Directive::FileDelete { path: path.clone() }),
            Seg::Rename { from, to } => out.push(Directive::FileRename {
                from_path: from.clone(),
                to_path: to.clone(),
            }),
            Seg::Dep { name, version } => out.push(Directive::DependencyAdd {
                name: name.clone(),
                version: version.clone(),
            }),
        }
    }
    out
}

/// Property: structured documents parse to the expected chunk sequence, both
/// one-shot and streamed with drains.
#[test]
fn structured_documents_quickcheck() {
    fn prop(segs: Vec<Seg>, splits: Vec<usize>) -> bool {
        let doc = render_segs(&segs);
        let expected = expected_chunks(&segs);
        parse_complete(&doc) == expected
            && coalesce(stream_with_drains(&doc, &splits)) == expected
    }

    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    QuickCheck::new()
        .tests(tests)
        .quickcheck(prop as fn(Vec<Seg>, Vec<usize>) -> bool);
}
