//! LRC text format.
//!
//! Lines look like `[mm:ss.ff]text`. Minutes are not capped at 99.

use std::collections::BTreeMap;
use std::time::Duration;

/// One timed line read back from LRC text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrcLine {
    pub time: Duration,
    pub text: String,
}

/// Render synchronized lyrics as LRC text.
///
/// Fragments sharing a timestamp are merged with a single space, groups are
/// emitted in ascending timestamp order, and empty groups are skipped.
/// Timestamps are milliseconds; the fraction is truncated to hundredths.
pub fn render(lines: &[(u32, String)]) -> String {
    let mut groups: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for (ms, text) in lines {
        let text = flatten(text);
        if !text.is_empty() {
            groups.entry(*ms).or_default().push(text);
        }
    }

    let mut out = String::new();
    for (ms, fragments) in groups {
        out.push_str(&format_timestamp(ms));
        out.push_str(&fragments.join(" "));
        out.push('\n');
    }
    out
}

/// `[mm:ss.ff]` for a millisecond offset.
pub fn format_timestamp(ms: u32) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1000) % 60;
    let hundredths = (ms % 1000) / 10;
    format!("[{minutes:02}:{seconds:02}.{hundredths:02}]")
}

/// Parse LRC text into timed lines, sorted by time.
///
/// A line may carry several leading timestamps, producing one entry each.
/// Metadata tags such as `[ar:Artist]` and untimed lines are ignored.
pub fn parse(text: &str) -> Vec<LrcLine> {
    let mut out = Vec::new();

    for line in text.lines() {
        let mut rest = line.trim();
        let mut times = Vec::new();

        while let Some(stripped) = rest.strip_prefix('[') {
            let Some(end) = stripped.find(']') else {
                break;
            };
            match parse_timestamp(&stripped[..end]) {
                Some(time) => times.push(time),
                None => break,
            }
            rest = &stripped[end + 1..];
        }

        let text = rest.trim();
        for time in times {
            out.push(LrcLine {
                time,
                text: text.to_string(),
            });
        }
    }

    out.sort_by_key(|line| line.time);
    out
}

/// `mm:ss`, `mm:ss.f`, `mm:ss.ff` or `mm:ss.fff`.
fn parse_timestamp(tag: &str) -> Option<Duration> {
    let (minutes, rest) = tag.split_once(':')?;
    let minutes: u64 = minutes.trim().parse().ok()?;

    let (seconds, fraction) = match rest.split_once(['.', ':']) {
        Some((s, f)) => (s, f),
        None => (rest, ""),
    };
    let seconds: u64 = seconds.trim().parse().ok()?;
    if seconds >= 60 || !fraction.chars().all(|c| c.is_ascii_digit()) || fraction.len() > 3 {
        return None;
    }

    // Right-pad to milliseconds: ".5" is 500ms, ".05" is 50ms
    let millis = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<3}").parse::<u64>().ok()?
    };

    // Oversized minute counts are rejected rather than wrapped
    let total = minutes
        .checked_mul(60_000)?
        .checked_add(seconds * 1000 + millis)?;
    Some(Duration::from_millis(total))
}

/// Collapse embedded line breaks so one fragment stays on one LRC line.
fn flatten(text: &str) -> String {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
