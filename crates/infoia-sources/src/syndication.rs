//! RSS 2.0 / Atom splitting.
//!
//! Cuts a feed document into one [`SyndicationEntry`] per `<item>` or
//! `<entry>`, keeping field text as found. Cleaning and validation happen in
//! the normalizer.

use std::borrow::Cow;

use infoia_core::SyndicationEntry;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Guid,
    Summary,
    Content,
    Published,
    Updated,
    Author,
}

fn field_for(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        b"guid" | b"id" => Some(Field::Guid),
        b"description" | b"summary" => Some(Field::Summary),
        b"content:encoded" | b"content" => Some(Field::Content),
        b"pubDate" | b"published" | b"dc:date" => Some(Field::Published),
        b"updated" => Some(Field::Updated),
        b"author" | b"dc:creator" => Some(Field::Author),
        _ => None,
    }
}

fn is_feed_root(name: &[u8]) -> bool {
    let local = name.rsplit(|b| *b == b':').next().unwrap_or(name);
    matches!(local, b"rss" | b"feed" | b"RDF")
}

fn malformed(reason: impl Into<String>) -> FetchError {
    FetchError::Malformed {
        format: "xml",
        reason: reason.into(),
    }
}

/// Split a feed document into entries, in document order.
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] if the XML is not well formed or the
/// root element is not `rss`, `feed`, or `rdf:RDF`.
pub(crate) fn split_feed(xml: &str) -> Result<Vec<SyndicationEntry>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut root_seen = false;
    let mut item_depth: Option<usize> = None;
    let mut current = SyndicationEntry::default();
    let mut updated: Option<String> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let qname = e.name();
                let name = qname.as_ref();
                if !root_seen {
                    root_seen = true;
                    if !is_feed_root(name) {
                        return Err(malformed(format!(
                            "root element <{}> is not a feed",
                            String::from_utf8_lossy(name)
                        )));
                    }
                }
                match item_depth {
                    None if name == b"item" || name == b"entry" => {
                        item_depth = Some(depth);
                        current = SyndicationEntry::default();
                        updated = None;
                    }
                    Some(d) if depth == d + 1 => {
                        text.clear();
                        field = field_for(name);
                        if field == Some(Field::Link) {
                            if let Some(href) = alternate_href(&e) {
                                set_once(&mut current.link, &href);
                                field = None;
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if item_depth == Some(depth) && e.name().as_ref() == b"link" {
                    if let Some(href) = alternate_href(&e) {
                        set_once(&mut current.link, &href);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if field.is_some() {
                    let chunk = e
                        .unescape()
                        .map_or_else(|_| String::from_utf8_lossy(&e).into_owned(), Cow::into_owned);
                    push_text(&mut text, &chunk);
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    push_text(&mut text, &String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(_)) => {
                if let Some(d) = item_depth {
                    if depth == d + 1 {
                        if let Some(f) = field.take() {
                            assign(&mut current, &mut updated, f, &text);
                        }
                    } else if depth == d {
                        if current.published.is_none() {
                            current.published = updated.take();
                        }
                        entries.push(std::mem::take(&mut current));
                        item_depth = None;
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(e.to_string())),
            _ => {}
        }
    }

    if !root_seen {
        return Err(malformed("document has no root element"));
    }

    Ok(entries)
}

/// `href` of an Atom `<link>` that points at the item itself.
fn alternate_href(e: &BytesStart<'_>) -> Option<String> {
    let mut href = None;
    let mut rel = None;
    for attr in e.attributes().flatten() {
        let value = attr
            .unescape_value()
            .map_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned(), Cow::into_owned);
        match attr.key.as_ref() {
            b"href" => href = Some(value),
            b"rel" => rel = Some(value),
            _ => {}
        }
    }
    match rel.as_deref() {
        None | Some("alternate") => href,
        _ => None,
    }
}

fn push_text(buf: &mut String, chunk: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(chunk);
}

fn set_once(slot: &mut Option<String>, value: &str) {
    let value = value.trim();
    if slot.is_none() && !value.is_empty() {
        *slot = Some(value.to_string());
    }
}

fn assign(entry: &mut SyndicationEntry, updated: &mut Option<String>, field: Field, text: &str) {
    let slot = match field {
        Field::Title => &mut entry.title,
        Field::Link => &mut entry.link,
        Field::Guid => &mut entry.guid,
        Field::Summary => &mut entry.summary,
        Field::Content => &mut entry.content,
        Field::Published => &mut entry.published,
        Field::Updated => updated,
        Field::Author => &mut entry.author,
    };
    set_once(slot, text);
}
