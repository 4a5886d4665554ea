//! Flat KEY=VALUE parser for remote `.env` files
//!
//! The file is read over SSH with `cat`, so parsing operates on a string
//! rather than a local path. Supports blank lines, `#` comments, an
//! optional `export ` prefix, and single- or double-quoted values.

use std::collections::HashMap;

/// Parse `.env`-style content into a flat key → value map.
///
/// Later assignments win. Lines without a `=` are skipped.
pub fn parse(input: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), unquote(value.trim()));
    }

    vars
}

fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return value[1..value.len() - 1].to_string();
        }
    }
    // Unquoted values may carry a trailing comment.
    match value.split_once(" #") {
        Some((bare, _)) => bare.trim_end().to_string(),
        None => value.to_string(),
    }
}
