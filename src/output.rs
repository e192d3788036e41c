//! Grouping and Alfred script-filter emission.
//!
//! Results are bucketed by top-level breadcrumb category, then by subtitle,
//! both in first-seen order, and written to stdout as the script-filter
//! `{"items": [...]}` document.

use crate::config;
use crate::search::hit::DisplayRecord;
use crate::update_check::UpdateInfo;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

/// Display width for subtitles in the result list.
const SUBTITLE_WIDTH: usize = 75;

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Two-level grouping with explicit insertion order.
///
/// Vec-backed on purpose: iteration order is creation order, not an
/// accident of a hash map. Result sets are bounded by the fetch limit, so
/// linear bucket lookup is fine.
#[derive(Debug, Default)]
pub struct GroupedResults {
    groups: Vec<Group>,
}

#[derive(Debug)]
pub struct Group {
    pub category: String,
    pub buckets: Vec<Bucket>,
}

#[derive(Debug)]
pub struct Bucket {
    pub subtitle: Option<String>,
    pub records: Vec<DisplayRecord>,
}

impl GroupedResults {
    /// Single left-to-right pass; every record lands in exactly one bucket.
    pub fn from_records(records: Vec<DisplayRecord>) -> Self {
        let mut grouped = Self::default();
        for record in records {
            grouped.push(record);
        }
        grouped
    }

    fn push(&mut self, record: DisplayRecord) {
        let category = record.trail.first().cloned().unwrap_or_default();
        let gi = match self.groups.iter().position(|g| g.category == category) {
            Some(i) => i,
            None => {
                self.groups.push(Group {
                    category,
                    buckets: Vec::new(),
                });
                self.groups.len() - 1
            }
        };

        let buckets = &mut self.groups[gi].buckets;
        let bi = match buckets.iter().position(|b| b.subtitle == record.subtitle) {
            Some(i) => i,
            None => {
                buckets.push(Bucket {
                    subtitle: record.subtitle.clone(),
                    records: Vec::new(),
                });
                buckets.len() - 1
            }
        };
        buckets[bi].records.push(record);
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }
}

// ---------------------------------------------------------------------------
// Script-filter items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<ItemText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quicklookurl: Option<String>,
    pub icon: Icon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemText {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icon {
    pub path: String,
}

impl Icon {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}

#[derive(Serialize)]
struct Feedback<'a> {
    items: &'a [Item],
}

/// Write the script-filter document.
pub fn emit(out: &mut dyn Write, items: &[Item]) -> Result<()> {
    serde_json::to_writer(&mut *out, &Feedback { items })?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Prompt shown for a blank query.
pub fn placeholder_item() -> Item {
    Item {
        uid: None,
        title: "Search the Vue.js docs...".to_string(),
        subtitle: None,
        arg: None,
        valid: false,
        text: None,
        quicklookurl: None,
        icon: Icon::new(config::VUE_ICON),
    }
}

/// Web-search fallback for a query with no hits.
pub fn google_fallback_item(phrase: &str) -> Item {
    let url = format!(
        "https://www.google.com/search?q={}",
        urlencoding::encode(&format!("Vue.js {phrase}"))
    );
    Item {
        uid: None,
        title: "No matching answers found".to_string(),
        subtitle: Some("Shall I try and search Google?".to_string()),
        arg: Some(url.clone()),
        valid: true,
        text: Some(ItemText {
            largetype: None,
            copy: Some(url.clone()),
        }),
        quicklookurl: Some(url),
        icon: Icon::new(config::GOOGLE_ICON),
    }
}

/// Leading notification when a newer release exists.
pub fn update_item(update: &UpdateInfo) -> Item {
    Item {
        uid: None,
        title: "New version available".to_string(),
        subtitle: Some(format!(
            "Version {} is out. Action this item to open the release page",
            update.latest_version
        )),
        arg: Some(update.release_url.clone()),
        valid: true,
        text: None,
        quicklookurl: None,
        icon: Icon::new(config::INFO_ICON),
    }
}

/// One item per record, walking groups, buckets and records in order.
pub fn grouped_items(grouped: &GroupedResults) -> Vec<Item> {
    let mut items = Vec::new();
    for group in grouped.groups() {
        for bucket in &group.buckets {
            let subtitle = bucket
                .subtitle
                .as_deref()
                .map(|key| decode_entities(&display_subtitle(key)));
            for record in &bucket.records {
                let title = decode_entities(&record.title);
                items.push(Item {
                    uid: Some(record.id.clone()),
                    title: title.clone(),
                    subtitle: subtitle.clone(),
                    arg: Some(record.url.clone()),
                    valid: true,
                    text: Some(ItemText {
                        largetype: Some(title),
                        copy: Some(record.url.clone()),
                    }),
                    quicklookurl: Some(record.url.clone()),
                    icon: Icon::new(config::VUE_ICON),
                });
            }
        }
    }
    items
}

/// First wrapped line of the bucket key, bounded to the display width.
fn display_subtitle(key: &str) -> String {
    let mut line = first_wrapped_line(key, SUBTITLE_WIDTH);
    if line.chars().count() > SUBTITLE_WIDTH {
        line.push_str("...");
    }
    line
}

/// Greedy word wrap, first line only. A single word longer than `width` is
/// cut at `width` characters.
fn first_wrapped_line(text: &str, width: usize) -> String {
    let mut line = String::new();
    let mut len = 0;
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line.is_empty() {
            if word_len > width {
                return word.chars().take(width).collect();
            }
            line.push_str(word);
            len = word_len;
        } else if len + 1 + word_len <= width {
            line.push(' ');
            line.push_str(word);
            len += 1 + word_len;
        } else {
            break;
        }
    }
    line
}

/// Decode the HTML entities the docs index emits in titles and snippets.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        // Entity names are short; a distant semicolon is ordinary text.
        if let Some(end) = rest.find(';').filter(|&end| end <= 10)
            && let Some(decoded) = decode_entity(&rest[1..end])
        {
            out.push(decoded);
            rest = &rest[end + 1..];
            continue;
        }
        out.push('&');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => return Some('&'),
        "lt" => return Some('<'),
        "gt" => return Some('>'),
        "quot" => return Some('"'),
        "apos" => return Some('\''),
        "nbsp" => return Some('\u{a0}'),
        _ => {}
    }
    let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse().ok()?
    } else {
        return None;
    };
    char::from_u32(code)
}
