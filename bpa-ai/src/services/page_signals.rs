//! DOM signal extraction from serialized HTML

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::types::PageSignals;

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
static META_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<meta\b([^>]*)>").expect("valid regex"));
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)([a-z_:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid regex")
});
static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script>").expect("valid regex"));
static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h[12]\b[^>]*>(.*?)</h[12]>").expect("valid regex"));
static INVISIBLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?is)<script\b[^>]*>.*?</script>|<style\b[^>]*>.*?</style>",
        r"|<noscript\b[^>]*>.*?</noscript>|<template\b[^>]*>.*?</template>|<!--.*?-->",
    ))
    .expect("valid regex")
});
static HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<head\b[^>]*>.*?</head>").expect("valid regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Parse every signal from `html`
pub fn parse_signals(html: &str, url: &str, max_visible_chars: usize) -> PageSignals {
    let metas = meta_tags(html);

    let description = metas
        .iter()
        .find(|attrs| attr_is(attrs, "name", "description"))
        .and_then(|attrs| attrs.get("content").cloned())
        .unwrap_or_default();

    let mut og_tags = BTreeMap::new();
    for attrs in &metas {
        let key = attrs
            .get("property")
            .or_else(|| attrs.get("name"))
            .map(|k| k.to_ascii_lowercase());
        if let (Some(key), Some(content)) = (key, attrs.get("content")) {
            if key.starts_with("og:") {
                og_tags.entry(key).or_insert_with(|| content.clone());
            }
        }
    }

    PageSignals {
        url: url.to_string(),
        title: TITLE_RE
            .captures(html)
            .map(|c| clean_text(&c[1]))
            .unwrap_or_default(),
        description,
        og_tags,
        structured_data: structured_data(html),
        headings: HEADING_RE
            .captures_iter(html)
            .map(|c| clean_text(&c[1]))
            .filter(|h| !h.is_empty())
            .collect(),
        visible_text: truncate_chars(&visible_text(html), max_visible_chars),
    }
}

fn meta_tags(html: &str) -> Vec<BTreeMap<String, String>> {
    META_RE
        .captures_iter(html)
        .map(|c| parse_attributes(&c[1]))
        .collect()
}

fn parse_attributes(raw: &str) -> BTreeMap<String, String> {
    ATTR_RE
        .captures_iter(raw)
        .filter_map(|c| {
            let name = c.get(1)?.as_str().to_ascii_lowercase();
            let value = c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4))?.as_str();
            Some((name, decode_entities(value).trim().to_string()))
        })
        .collect()
}

fn attr_is(attrs: &BTreeMap<String, String>, name: &str, expected: &str) -> bool {
    attrs
        .get(name)
        .map(|v| v.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

/// `application/ld+json` blocks that parse; invalid blocks are skipped
fn structured_data(html: &str) -> Vec<serde_json::Value> {
    SCRIPT_RE
        .captures_iter(html)
        .filter(|c| {
            let attrs = parse_attributes(&c[1]);
            attr_is(&attrs, "type", "application/ld+json")
        })
        .filter_map(|c| serde_json::from_str(c[2].trim()).ok())
        .collect()
}

/// Body text with invisible elements and markup removed
pub fn visible_text(html: &str) -> String {
    let without_head = HEAD_RE.replace_all(html, " ");
    let without_hidden = INVISIBLE_RE.replace_all(&without_head, " ");
    let without_tags = TAG_RE.replace_all(&without_hidden, " ");
    clean_text(&without_tags)
}

fn clean_text(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, " ");
    let decoded = decode_entities(&stripped);
    SPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// First `max_chars` characters, never splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
