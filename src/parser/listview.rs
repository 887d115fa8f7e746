use std::collections::HashMap;

use anyhow::{bail, Result};
use serde_json::Value;

const SPELL_LISTVIEW_MARKER: &str = "template: 'spell'";
const GATHERER_MARKER: &str = "WH.Gatherer.addData(3, 5, ";

/// Byte index of the bracket closing the one at `start`. Brackets inside
/// double-quoted strings are skipped, with backslash escapes honored.
/// Errors on an unbalanced literal — that means the page markup itself is
/// broken and the run should stop.
pub fn find_matching_bracket(text: &str, start: usize, open: u8, close: u8) -> Result<usize> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&open) {
        bail!("expected '{}' at byte {}", open as char, start);
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (idx, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Ok(idx);
            }
        }
    }

    bail!(
        "no matching '{}' for '{}' at byte {}",
        close as char,
        open as char,
        start
    )
}

/// Rows of the profession recipe listview. A skill page carries several
/// spell-type listviews; only those whose `data:` array has rows with a
/// `reagents` key qualify, and the longest qualifying array wins.
pub fn spell_listview_rows(html: &str) -> Result<Vec<Value>> {
    let mut candidates: Vec<Vec<Value>> = Vec::new();
    let mut pos = 0;

    while let Some(found) = html[pos..].find(SPELL_LISTVIEW_MARKER) {
        let idx = pos + found;
        pos = idx + SPELL_LISTVIEW_MARKER.len();

        let Some(data_off) = html[idx..].find("data:") else { continue };
        let Some(arr_off) = html[idx + data_off..].find('[') else { continue };
        let arr_start = idx + data_off + arr_off;
        let arr_end = find_matching_bracket(html, arr_start, b'[', b']')?;
        pos = arr_end + 1;

        let Ok(Value::Array(rows)) = serde_json::from_str::<Value>(&html[arr_start..=arr_end]) else {
            continue;
        };
        if rows.iter().any(|r| r.get("reagents").is_some()) {
            candidates.push(rows);
        }
    }

    candidates.sort_by_key(|c| std::cmp::Reverse(c.len()));
    match candidates.into_iter().next() {
        Some(rows) => Ok(rows),
        None => bail!("no spell listview with reagents[] found in the skill page"),
    }
}

/// Item display names embedded via the gatherer data call. The call appears
/// more than once; the object with the most keys is the full table.
pub fn embedded_item_names(html: &str) -> Result<HashMap<u32, String>> {
    let mut best: Option<serde_json::Map<String, Value>> = None;
    let mut pos = 0;

    while let Some(found) = html[pos..].find(GATHERER_MARKER) {
        let idx = pos + found;
        pos = idx + GATHERER_MARKER.len();

        let Some(obj_off) = html[idx..].find('{') else { continue };
        let obj_start = idx + obj_off;
        let obj_end = find_matching_bracket(html, obj_start, b'{', b'}')?;
        pos = obj_end + 1;

        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&html[obj_start..=obj_end]) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| map.len() > b.len()) {
            best = Some(map);
        }
    }

    let Some(map) = best else {
        bail!("no parseable item gatherer data found in the skill page");
    };

    let mut names = HashMap::new();
    for (key, value) in map {
        let Ok(item_id) = key.parse::<u32>() else { continue };
        if let Some(name) = value.get("name_enus").and_then(Value::as_str) {
            names.insert(item_id, name.to_string());
        }
    }
    Ok(names)
}
