// src/ingest/atom.rs
//! Atom document → `FeedEntry` list.
//!
//! Lookups are namespace-qualified: only `entry` elements bound to the Atom
//! namespace directly under the root count, and only their Atom `id`,
//! `updated`, `title`, `summary` and `content` children are read. Anything else
//! (links, authors, foreign extensions) is skipped.

use anyhow::{bail, Context, Result};
use metrics::{counter, histogram};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::ingest::types::FeedEntry;

pub const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";

// Element depth, counting the document root as 1.
const ENTRY_DEPTH: usize = 2;
const FIELD_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy)]
enum Field {
    Id,
    Updated,
    Title,
    Summary,
    Content,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"id" => Some(Field::Id),
            b"updated" => Some(Field::Updated),
            b"title" => Some(Field::Title),
            b"summary" => Some(Field::Summary),
            b"content" => Some(Field::Content),
            _ => None,
        }
    }
}

/// Collects the first occurrence of every field.
#[derive(Default)]
struct EntryBuilder {
    id: Option<String>,
    updated: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    content: Option<String>,
}

impl EntryBuilder {
    fn set(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::Id => &mut self.id,
            Field::Updated => &mut self.updated,
            Field::Title => &mut self.title,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
        };
        if slot.is_none() {
            *slot = Some(text);
        }
    }

    fn build(self) -> FeedEntry {
        FeedEntry {
            id: self.id.unwrap_or_default(),
            updated: self.updated.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            summary: self.summary,
            content: self.content,
        }
    }
}

fn is_atom(ns: &ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == ATOM_NS)
}

/// Parse every Atom entry in document order (the feed lists newest first).
pub fn parse_entries(xml: &str) -> Result<Vec<FeedEntry>> {
    let t0 = std::time::Instant::now();

    let mut reader = NsReader::from_str(xml);
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut entry: Option<EntryBuilder> = None;
    let mut field: Option<(Field, String)> = None;

    loop {
        let pos = reader.buffer_position();
        let (ns, event) = reader
            .read_resolved_event()
            .with_context(|| format!("parsing atom xml near byte {pos}"))?;

        match event {
            Event::Start(e) => {
                depth += 1;
                saw_root = true;
                let local = e.local_name();
                if depth == ENTRY_DEPTH && is_atom(&ns) && local.as_ref() == b"entry" {
                    entry = Some(EntryBuilder::default());
                } else if depth == FIELD_DEPTH && entry.is_some() && is_atom(&ns) {
                    field = Field::from_local_name(local.as_ref()).map(|f| (f, String::new()));
                }
            }
            Event::Empty(e) => {
                saw_root = true;
                let local = e.local_name();
                // `<entry/>` or `<summary/>`: same position rules as Start, one level deeper.
                if depth + 1 == ENTRY_DEPTH && is_atom(&ns) && local.as_ref() == b"entry" {
                    out.push(FeedEntry::default());
                } else if depth + 1 == FIELD_DEPTH && is_atom(&ns) {
                    if let (Some(b), Some(f)) =
                        (entry.as_mut(), Field::from_local_name(local.as_ref()))
                    {
                        b.set(f, String::new());
                    }
                }
            }
            Event::Text(t) => {
                if let Some((_, buf)) = field.as_mut() {
                    buf.push_str(&t.unescape().context("unescaping atom text")?);
                }
            }
            Event::CData(c) => {
                if let Some((_, buf)) = field.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                if depth == FIELD_DEPTH {
                    if let (Some((f, text)), Some(b)) = (field.take(), entry.as_mut()) {
                        b.set(f, text);
                    }
                } else if depth == ENTRY_DEPTH {
                    if let Some(b) = entry.take() {
                        out.push(b.build());
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        bail!("atom document has no root element");
    }
    if depth != 0 {
        bail!("atom document ended with {depth} unclosed element(s)");
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    counter!("feed_entries_parsed_total").increment(out.len() as u64);
    Ok(out)
}
