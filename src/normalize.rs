//! Canonicalization of free-text tag values.
//!
//! Every function here is pure and idempotent: normalizing an already
//! normalized value returns it unchanged.

use unicode_normalization::UnicodeNormalization;

/// Fallback for a missing artist or album artist.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Fallback for a missing album title.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Visible replacement for an embedded NUL terminator.
const NUL_ESCAPE: &str = "\\0";

/// Separators that join several performers in a single tag value.
const ARTIST_SEPARATORS: &[&str] = &[NUL_ESCAPE, ";", " / ", " feat. ", " ft. ", " & "];

/// Canonicalize a free-text tag value.
///
/// Applies NFC composition, strips control characters and trims. Returns
/// `None` for absent or whitespace-only input so callers can apply their
/// own typed fallback.
pub fn sanitize(raw: Option<&str>) -> Option<String> {
    // Controls go first so removing one can never expose a new composition
    let cleaned: String = raw?
        .chars()
        .filter(|c| !c.is_control())
        .nfc()
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// [`sanitize`] applied line by line, keeping line breaks.
///
/// Used for lyrics, where stripping `\n` as a control character would
/// collapse the text into one line.
pub fn sanitize_multiline(raw: Option<&str>) -> Option<String> {
    let lines: Vec<String> = raw?
        .lines()
        .map(|line| sanitize(Some(line)).unwrap_or_default())
        .collect();
    let joined = lines.join("\n");
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Canonicalize an artist name.
///
/// Like [`sanitize`], except embedded NUL terminators (ID3v2.4 multi-value
/// separators) are kept as a visible `\0` escape, and an empty result
/// becomes [`UNKNOWN_ARTIST`].
pub fn normalize_artist(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return UNKNOWN_ARTIST.to_string();
    };

    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\0' => escaped.push_str(NUL_ESCAPE),
            c if c.is_control() => {}
            c => escaped.push(c),
        }
    }

    let composed: String = escaped.nfc().collect();
    let trimmed = composed.trim();
    if trimmed.is_empty() {
        UNKNOWN_ARTIST.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Split a joined performer value into individual, normalized artists.
///
/// Duplicates are dropped, first occurrence wins. Returns an empty list
/// when nothing usable remains.
pub fn split_artists(joined: &str) -> Vec<String> {
    let normalized = normalize_artist(Some(joined));
    if normalized == UNKNOWN_ARTIST {
        return Vec::new();
    }

    let mut parts = vec![normalized];
    for sep in ARTIST_SEPARATORS {
        parts = parts
            .iter()
            .flat_map(|p| p.split(sep))
            .map(str::to_string)
            .collect();
    }

    let mut artists: Vec<String> = Vec::with_capacity(parts.len());
    for part in parts {
        if let Some(name) = sanitize(Some(&part))
            && !artists.iter().any(|a| a.eq_ignore_ascii_case(&name))
        {
            artists.push(name);
        }
    }
    artists
}
