//! M3U playlist parser
//!
//! Single forward scan over `#EXTINF:` / URI line pairs. Entries without a
//! usable URI line are skipped, missing attributes fall back to defaults.

use crate::models::{
    ChannelRecord, StreamType, DEFAULT_CATEGORY, DEFAULT_COUNTRY, DEFAULT_LANGUAGE, DEFAULT_NAME,
    FALLBACK_LOGO,
};

const EXTINF_TAG: &str = "#EXTINF:";
const HEADER_TAG: &str = "#EXTM3U";

#[derive(Debug, Clone, Default)]
pub struct M3uPlaylist {
    pub channels: Vec<ChannelRecord>,
    pub epg_url: Option<String>,        // From x-tvg-url in header
}

/// Parse M3U and return playlist with EPG URL
pub fn parse_m3u_playlist(content: &str) -> M3uPlaylist {
    let mut playlist = M3uPlaylist::default();

    // Check first line for EPG URL
    if let Some(first_line) = normalize(content).lines().next() {
        if first_line.starts_with(HEADER_TAG) {
            playlist.epg_url = extract_attr(first_line, "x-tvg-url")
                .or_else(|| extract_attr(first_line, "url-tvg"))
                .map(str::to_string);
        }
    }

    playlist.channels = parse_m3u(content);
    playlist
}

/// Parse M3U content and extract channels, in source order
pub fn parse_m3u(content: &str) -> Vec<ChannelRecord> {
    let lines: Vec<&str> = normalize(content).split('\n').collect();
    let mut channels = Vec::new();
    let mut skipped = 0usize;

    for (idx, line) in lines.iter().enumerate() {
        if !line.starts_with(EXTINF_TAG) {
            continue;
        }

        // Only the immediately following line can carry the stream URI
        match lines.get(idx + 1) {
            Some(url_line) if url_line.starts_with("http") => {
                channels.push(parse_entry(line, url_line.trim()));
            }
            _ => {
                skipped += 1;
                tracing::trace!(line = idx + 1, "skipping #EXTINF without stream URI");
            }
        }
    }

    tracing::debug!(channels = channels.len(), skipped, "parsed playlist");
    channels
}

/// Drop a leading byte-order mark, then surrounding whitespace
fn normalize(content: &str) -> &str {
    content.trim_start_matches('\u{feff}').trim()
}

/// Build a record from an info line and its (already trimmed) URI
fn parse_entry(info_line: &str, stream_uri: &str) -> ChannelRecord {
    let name = info_line
        .rfind(',')
        .map(|pos| info_line[pos + 1..].trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_NAME);

    let category = extract_attr(info_line, "group-title")
        .map(|group| group.split(';').next().unwrap_or(group))
        .unwrap_or(DEFAULT_CATEGORY);

    ChannelRecord {
        name: name.to_string(),
        logo_url: extract_attr(info_line, "tvg-logo")
            .unwrap_or(FALLBACK_LOGO)
            .to_string(),
        stream_uri: stream_uri.to_string(),
        stream_type: StreamType::Hls,
        country_code: extract_attr(info_line, "tvg-country")
            .unwrap_or(DEFAULT_COUNTRY)
            .to_string(),
        language: extract_attr(info_line, "tvg-language")
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string(),
        category: category.to_string(),
    }
}

/// Value of the first `key="value"` occurrence on the line.
///
/// Attribute order does not matter. A missing closing quote counts as absent.
pub fn extract_attr<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let search = format!("{}=\"", key);
    let start = line.find(&search)? + search.len();
    let rest = &line[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

#[cfg(test)]
#[path = "m3u_parser_tests.rs"]
mod tests;
