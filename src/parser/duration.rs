use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d+(?:\.\d+)?)\s*(sec|secs|second|seconds|min|mins|minute|minutes|hour|hours|day|days)\b",
    )
    .unwrap()
});

/// Flatten an HTML fragment to plain text: tags become spaces, `&nbsp;` is
/// unescaped, runs of whitespace collapse.
pub fn strip_html(text: &str) -> String {
    let text = TAG_RE.replace_all(text, " ");
    let text = text.replace("&nbsp;", " ");
    WS_RE.replace_all(&text, " ").trim().to_string()
}

/// Parse a human-readable cooldown ("4 days", "1 hour 30 mins") into whole
/// seconds. "n/a"/"none" and unit-less text are not durations. Only positive
/// totals count.
pub fn parse_duration_seconds(text: &str) -> Option<u32> {
    let normalized = strip_html(text).to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    if normalized.contains("n/a") || normalized == "na" || normalized == "none" {
        return None;
    }

    let mut total = 0.0f64;
    let mut found = false;
    for caps in DURATION_RE.captures_iter(&normalized) {
        let Ok(n) = caps[1].parse::<f64>() else { continue };
        let unit_seconds = match &caps[2] {
            "sec" | "secs" | "second" | "seconds" => 1.0,
            "min" | "mins" | "minute" | "minutes" => 60.0,
            "hour" | "hours" => 3600.0,
            "day" | "days" => 86400.0,
            _ => continue,
        };
        total += n * unit_seconds;
        found = true;
    }

    if !found {
        return None;
    }
    let seconds = total.round() as i64;
    u32::try_from(seconds).ok().filter(|&s| s > 0)
}
