use std::sync::LazyLock;

use regex::Regex;

// <tr><th>Cooldown</th><td><span class="q0">n/a</span></td></tr>
// <tr><th>Cooldown</th><td>4 days</td></tr>
static COOLDOWN_CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<th>\s*Cooldown\s*</th>\s*<td[^>]*>(.*?)</td>").unwrap());

// Wowhead embeds spell data like: "creates":[2996,1,1]
static CREATES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""creates"\s*:\s*\[\s*(\d+)\s*,"#).unwrap());

// Fallback: the Create Item table links /item=NNN.
static ITEM_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/item=(\d+)").unwrap());

/// Raw inner HTML of the cell after the first Cooldown header, if any.
pub fn cooldown_cell(html: &str) -> Option<&str> {
    COOLDOWN_CELL_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Id of the item the spell creates. Prefers the embedded `"creates":[id,…]`
/// fragment, falls back to the first item link on the page.
pub fn creates_item_id(html: &str) -> Option<u32> {
    if let Some(caps) = CREATES_RE.captures(html) {
        return caps[1].parse().ok().filter(|&id| id > 0);
    }
    ITEM_LINK_RE
        .captures(html)
        .and_then(|caps| caps[1].parse().ok())
        .filter(|&id| id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_cell_plain() {
        let html = "<tr><th>Cooldown</th><td>4 days</td></tr>";
        assert_eq!(cooldown_cell(html), Some("4 days"));
    }

    #[test]
    fn cooldown_cell_with_markup_and_attrs() {
        let html = r#"<tr><th>cooldown</th> <td class="x"><span class="q0">n/a</span></td></tr>"#;
        assert_eq!(cooldown_cell(html), Some(r#"<span class="q0">n/a</span>"#));
    }

    #[test]
    fn cooldown_cell_missing() {
        assert_eq!(cooldown_cell("<tr><th>Duration</th><td>4 days</td></tr>"), None);
    }

    #[test]
    fn creates_from_embedded_fragment() {
        let html = r#"g_spells[1234]={"creates":[2996,1,1]}; <a href="/item=999/foo">x</a>"#;
        assert_eq!(creates_item_id(html), Some(2996));
    }

    #[test]
    fn creates_from_item_link_fallback() {
        let html = r#"<a href="/item=14048/bolt-of-runecloth">Bolt of Runecloth</a>"#;
        assert_eq!(creates_item_id(html), Some(14048));
    }

    #[test]
    fn creates_missing() {
        assert_eq!(creates_item_id("<html><body>nothing here</body></html>"), None);
    }
}
