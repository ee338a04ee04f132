//! Locating and extending `SKAdNetworkItems` inside an XML property list.
//!
//! The document is never re-serialized. [`scan`] records byte offsets while
//! reading it with quick-xml and [`insert_identifiers`] splices new entries
//! into the original text, so declarations, DOCTYPE, comments and formatting
//! stay exactly as they were.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use std::collections::BTreeSet;

const PLIST: &str = "plist";
const DICT: &str = "dict";
const ARRAY: &str = "array";
const KEY: &str = "key";
const STRING: &str = "string";
const SK_AD_NETWORK_ITEMS: &str = "SKAdNetworkItems";
const SK_AD_NETWORK_IDENTIFIER: &str = "SKAdNetworkIdentifier";

/// A document that could not be read as a property list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub message: String,
    pub offset: u64,
}

/// Where new identifiers go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Before the `</array>` of the existing items array.
    IntoArray { at: usize },
    /// `<array/>` spanning `start..end` must be opened up.
    ExpandArray { start: usize, end: usize },
    /// The key exists but has no array; the array goes right after `</key>`.
    AfterKey { at: usize },
    /// No key at all; key and array go before the top-level `</dict>`.
    IntoDict { at: usize },
    /// The top-level dict is `<dict/>` spanning `start..end`.
    ExpandDict { start: usize, end: usize },
}

/// What [`scan`] learned about a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub identifiers: BTreeSet<String>,
    pub insertion: Insertion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Items {
    NotFound,
    Open,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    MainKey,
    ItemKey,
    ItemString,
}

#[derive(Debug, Default)]
struct Item {
    key: Option<String>,
    string: Option<String>,
}

struct Scanner {
    stack: Vec<String>,
    main_dict_seen: bool,
    main_dict_open: bool,
    items: Items,
    /// Text and end offset of the last key read directly under the top-level dict.
    pending_key: Option<(String, usize)>,
    capture: Option<(Capture, usize, String)>,
    item: Option<Item>,
    identifiers: BTreeSet<String>,
    insertion: Option<Insertion>,
}

/// Reads `xml` and finds the existing identifiers and the insertion point.
pub fn scan(xml: &str) -> Result<Layout, ScanError> {
    let mut reader = Reader::from_str(xml);
    let mut scanner = Scanner {
        stack: Vec::new(),
        main_dict_seen: false,
        main_dict_open: false,
        items: Items::NotFound,
        pending_key: None,
        capture: None,
        item: None,
        identifiers: BTreeSet::new(),
        insertion: None,
    };

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| ScanError {
            message: e.to_string(),
            offset: reader.error_position() as u64,
        })?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                scanner.open(&name, before, after, false)?;
                scanner.stack.push(name);
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                scanner.open(&name, before, after, true)?;
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                scanner.stack.pop();
                scanner.close(&name, before, after);
            }
            Event::Text(e) => {
                if let Some((_, _, text)) = scanner.capture.as_mut() {
                    let unescaped = e.unescape().map_err(|err| ScanError {
                        message: err.to_string(),
                        offset: before as u64,
                    })?;
                    text.push_str(&unescaped);
                }
            }
            Event::CData(e) => {
                if let Some((_, _, text)) = scanner.capture.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !scanner.stack.is_empty() {
        return Err(ScanError {
            message: format!("unclosed <{}> element", scanner.stack.join("><")),
            offset: xml.len() as u64,
        });
    }

    match scanner.insertion {
        Some(insertion) if scanner.main_dict_seen => Ok(Layout {
            identifiers: scanner.identifiers,
            insertion,
        }),
        _ => Err(ScanError {
            message: "no top-level <dict> inside <plist>".to_string(),
            offset: 0,
        }),
    }
}

impl Scanner {
    fn open(&mut self, name: &str, before: usize, after: usize, empty: bool) -> Result<(), ScanError> {
        let depth = self.stack.len();

        if depth == 1 && self.stack[0] == PLIST && name == DICT && !self.main_dict_seen {
            self.main_dict_seen = true;
            if empty {
                self.insertion = Some(Insertion::ExpandDict {
                    start: before,
                    end: after,
                });
            } else {
                self.main_dict_open = true;
            }
            return Ok(());
        }

        if depth == 2 && self.main_dict_open {
            return self.open_main_dict_child(name, before, after, empty);
        }

        if depth == 3 && self.items == Items::Open && name == DICT && !empty {
            self.item = Some(Item::default());
            return Ok(());
        }

        if depth == 4 && self.item.is_some() {
            self.open_item_child(name, depth, empty);
        }

        Ok(())
    }

    fn open_main_dict_child(
        &mut self,
        name: &str,
        before: usize,
        after: usize,
        empty: bool,
    ) -> Result<(), ScanError> {
        let pending = self.pending_key.take();

        if name == KEY {
            // A key directly following the items key leaves it without a value
            if let Some((key, key_end)) = pending {
                self.missing_items_value(&key, key_end);
            }
            if empty {
                self.pending_key = Some((String::new(), after));
            } else {
                self.capture = Some((Capture::MainKey, 2, String::new()));
            }
            return Ok(());
        }

        let Some((key, _)) = pending else {
            return Ok(());
        };
        if key != SK_AD_NETWORK_ITEMS || self.items != Items::NotFound {
            return Ok(());
        }

        if name != ARRAY {
            return Err(ScanError {
                message: format!("{} must be an <array>, found <{}>", SK_AD_NETWORK_ITEMS, name),
                offset: before as u64,
            });
        }

        if empty {
            self.items = Items::Done;
            self.insertion = Some(Insertion::ExpandArray {
                start: before,
                end: after,
            });
        } else {
            self.items = Items::Open;
        }
        Ok(())
    }

    fn open_item_child(&mut self, name: &str, depth: usize, empty: bool) {
        let Some(item) = self.item.as_mut() else {
            return;
        };
        let target = match name {
            KEY if item.key.is_none() => Capture::ItemKey,
            STRING if item.string.is_none() => Capture::ItemString,
            _ => return,
        };
        if empty {
            match target {
                Capture::ItemKey => item.key = Some(String::new()),
                _ => item.string = Some(String::new()),
            }
        } else {
            self.capture = Some((target, depth, String::new()));
        }
    }

    fn close(&mut self, name: &str, before: usize, after: usize) {
        let depth = self.stack.len();

        let capture_done = matches!(&self.capture, Some((_, capture_depth, _)) if *capture_depth == depth);
        if capture_done {
            if let Some((target, _, text)) = self.capture.take() {
                self.finish_capture(target, text, after);
            }
            return;
        }

        if depth == 3 && name == DICT {
            if let Some(item) = self.item.take() {
                if item.key.as_deref() == Some(SK_AD_NETWORK_IDENTIFIER) {
                    if let Some(id) = item.string {
                        self.identifiers.insert(id);
                    }
                }
            }
            return;
        }

        if depth == 2 && name == ARRAY && self.items == Items::Open {
            self.items = Items::Done;
            self.insertion = Some(Insertion::IntoArray { at: before });
            return;
        }

        if depth == 1 && name == DICT && self.main_dict_open {
            self.main_dict_open = false;
            if let Some((key, key_end)) = self.pending_key.take() {
                self.missing_items_value(&key, key_end);
            }
            if self.items == Items::NotFound {
                self.items = Items::Done;
                self.insertion = Some(Insertion::IntoDict { at: before });
            }
        }
    }

    fn finish_capture(&mut self, target: Capture, text: String, after: usize) {
        match target {
            Capture::MainKey => self.pending_key = Some((text, after)),
            Capture::ItemKey => {
                if let Some(item) = self.item.as_mut() {
                    item.key = Some(text);
                }
            }
            Capture::ItemString => {
                if let Some(item) = self.item.as_mut() {
                    item.string = Some(text);
                }
            }
        }
    }

    fn missing_items_value(&mut self, key: &str, key_end: usize) {
        if key == SK_AD_NETWORK_ITEMS && self.items == Items::NotFound {
            self.items = Items::Done;
            self.insertion = Some(Insertion::AfterKey { at: key_end });
        }
    }
}

/// Returns `xml` with one `SKAdNetworkIdentifier` dict per identifier added at
/// the insertion point found by [`scan`].
pub fn insert_identifiers(xml: &str, insertion: Insertion, identifiers: &BTreeSet<String>) -> String {
    let unit = indent_unit(xml);
    let nl = line_ending(xml);

    let (start, end, snippet) = match insertion {
        Insertion::IntoArray { at } => match closing_indent(xml, at) {
            Some(indent) => {
                let child = format!("{}{}", indent, unit);
                let line_start = at - indent.len();
                (line_start, line_start, items_block(identifiers, &child, &unit, nl))
            }
            None => (at, at, items_inline(identifiers)),
        },
        Insertion::ExpandArray { start, end } => {
            let indent = line_indent(xml, start);
            let child = format!("{}{}", indent, unit);
            let snippet = format!(
                "<{a}>{nl}{items}{indent}</{a}>",
                a = ARRAY,
                items = items_block(identifiers, &child, &unit, nl),
            );
            (start, end, snippet)
        }
        Insertion::AfterKey { at } => {
            let indent = line_indent(xml, at);
            (at, at, format!("{}{}", nl, array_block(identifiers, indent, &unit, nl)))
        }
        Insertion::IntoDict { at } => match closing_indent(xml, at) {
            Some(indent) => {
                let child = format!("{}{}", indent, unit);
                let line_start = at - indent.len();
                let snippet = format!(
                    "{child}<{k}>{items_key}</{k}>{nl}{array}{nl}",
                    k = KEY,
                    items_key = SK_AD_NETWORK_ITEMS,
                    array = array_block(identifiers, &child, &unit, nl),
                );
                (line_start, line_start, snippet)
            }
            None => {
                let snippet = format!(
                    "<{k}>{items_key}</{k}><{a}>{items}</{a}>",
                    k = KEY,
                    a = ARRAY,
                    items_key = SK_AD_NETWORK_ITEMS,
                    items = items_inline(identifiers),
                );
                (at, at, snippet)
            }
        },
        Insertion::ExpandDict { start, end } => {
            let indent = line_indent(xml, start);
            let child = format!("{}{}", indent, unit);
            let snippet = format!(
                "<{d}>{nl}{child}<{k}>{items_key}</{k}>{nl}{array}{nl}{indent}</{d}>",
                d = DICT,
                k = KEY,
                items_key = SK_AD_NETWORK_ITEMS,
                array = array_block(identifiers, &child, &unit, nl),
            );
            (start, end, snippet)
        }
    };

    let mut out = String::with_capacity(xml.len() + snippet.len());
    out.push_str(&xml[..start]);
    out.push_str(&snippet);
    out.push_str(&xml[end..]);
    out
}

/// `<array>` holding the items, starting at `indent`, without a trailing newline.
fn array_block(identifiers: &BTreeSet<String>, indent: &str, unit: &str, nl: &str) -> String {
    let child = format!("{}{}", indent, unit);
    format!(
        "{indent}<{a}>{nl}{items}{indent}</{a}>",
        a = ARRAY,
        items = items_block(identifiers, &child, unit, nl),
    )
}

fn items_block(identifiers: &BTreeSet<String>, indent: &str, unit: &str, nl: &str) -> String {
    identifiers
        .iter()
        .map(|id| {
            format!(
                "{indent}<{d}>{nl}{indent}{unit}<{k}>{key}</{k}>{nl}{indent}{unit}<{s}>{id}</{s}>{nl}{indent}</{d}>{nl}",
                d = DICT,
                k = KEY,
                s = STRING,
                key = SK_AD_NETWORK_IDENTIFIER,
                id = escape(id.as_str()),
            )
        })
        .collect()
}

fn items_inline(identifiers: &BTreeSet<String>) -> String {
    identifiers
        .iter()
        .map(|id| {
            format!(
                "<{d}><{k}>{key}</{k}><{s}>{id}</{s}></{d}>",
                d = DICT,
                k = KEY,
                s = STRING,
                key = SK_AD_NETWORK_IDENTIFIER,
                id = escape(id.as_str()),
            )
        })
        .collect()
}

/// The whitespace before `at` on its line, if nothing else precedes it there.
fn closing_indent(xml: &str, at: usize) -> Option<&str> {
    let line_start = xml[..at].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &xml[line_start..at];
    prefix
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(prefix)
}

/// Leading whitespace of the line containing `at`.
fn line_indent(xml: &str, at: usize) -> &str {
    let line_start = xml[..at].rfind('\n').map_or(0, |i| i + 1);
    let line = &xml[line_start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// `\r\n` for documents written with Windows line endings, `\n` otherwise.
fn line_ending(xml: &str) -> &'static str {
    if xml.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Indentation used by the document: the leading whitespace of its first
/// indented element line, a tab when there is none.
fn indent_unit(xml: &str) -> String {
    xml.lines()
        .find_map(|line| {
            let trimmed = line.trim_start_matches([' ', '\t']);
            let width = line.len() - trimmed.len();
            (width > 0 && trimmed.starts_with('<')).then(|| line[..width].to_string())
        })
        .unwrap_or_else(|| "\t".to_string())
}
