//! Playlist ingestion: resolve the source, fetch its text once, build the catalog

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::Catalog;
use crate::error::IngestError;
use crate::m3u_parser;

/// Where the playlist text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistSource {
    Url(String),
    File(PathBuf),
}

impl PlaylistSource {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            PlaylistSource::Url(input.to_string())
        } else {
            PlaylistSource::File(PathBuf::from(input))
        }
    }
}

impl fmt::Display for PlaylistSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaylistSource::Url(url) => write!(f, "{}", url),
            PlaylistSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Result of the one-shot ingestion, keeping "fetch failed" apart from
/// "fetched fine but nothing playable in it".
#[derive(Debug)]
pub enum IngestOutcome {
    Loaded {
        catalog: Catalog,
        epg_url: Option<String>,
    },
    Empty,
    FetchFailed(IngestError),
}

impl IngestOutcome {
    pub fn catalog(&self) -> Option<&Catalog> {
        match self {
            IngestOutcome::Loaded { catalog, .. } => Some(catalog),
            _ => None,
        }
    }
}

/// Fetch raw playlist text (HTTP/HTTPS or local file)
pub fn fetch_text(
    source: &PlaylistSource,
    user_agent: &str,
    timeout: Duration,
) -> Result<String, IngestError> {
    match source {
        PlaylistSource::Url(url) => download(url, user_agent, timeout),
        PlaylistSource::File(path) => fs::read_to_string(path).map_err(|e| IngestError::File {
            path: path.clone(),
            source: e,
        }),
    }
}

fn download(url: &str, user_agent: &str, timeout: Duration) -> Result<String, IngestError> {
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .new_agent();

    let mut response = agent
        .get(url)
        .header("User-Agent", user_agent)
        .call()
        .map_err(|e| match e {
            ureq::Error::StatusCode(code) => IngestError::Status(code),
            other => IngestError::Request(other.to_string()),
        })?;

    ensure_success(response.status().as_u16())?;

    response
        .body_mut()
        .read_to_string()
        .map_err(|e| IngestError::Read(e.to_string()))
}

/// Any 2xx counts as a successful fetch
fn ensure_success(status: u16) -> Result<(), IngestError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(IngestError::Status(status))
    }
}

/// Tags each ingestion run so only the latest one is applied.
///
/// A reload started while an older fetch is still running supersedes it;
/// the older outcome is discarded when it eventually arrives.
#[derive(Debug, Default)]
pub struct LoadGeneration {
    current: u64,
}

impl LoadGeneration {
    /// Start a new run and return its tag
    pub fn advance(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.current
    }
}

/// Turn already-fetched text into an outcome
pub fn outcome_from_text(content: &str) -> IngestOutcome {
    let playlist = m3u_parser::parse_m3u_playlist(content);
    if playlist.channels.is_empty() {
        return IngestOutcome::Empty;
    }
    IngestOutcome::Loaded {
        catalog: Catalog::build(playlist.channels),
        epg_url: playlist.epg_url,
    }
}

/// Fetch and parse once. No retry; callers re-run the whole flow.
pub fn ingest(source: &PlaylistSource, user_agent: &str, timeout: Duration) -> IngestOutcome {
    tracing::info!(%source, "fetching playlist");
    match fetch_text(source, user_agent, timeout) {
        Ok(content) => {
            tracing::info!(bytes = content.len(), "playlist fetched, parsing");
            let outcome = outcome_from_text(&content);
            match &outcome {
                IngestOutcome::Loaded { catalog, .. } => {
                    tracing::info!(channels = catalog.len(), "parsing complete")
                }
                _ => tracing::warn!("playlist contained no playable entries"),
            }
            outcome
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch playlist");
            IngestOutcome::FetchFailed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_detection() {
        assert_eq!(
            PlaylistSource::parse("https://iptv-org.github.io/iptv/index.m3u"),
            PlaylistSource::Url("https://iptv-org.github.io/iptv/index.m3u".to_string())
        );
        assert_eq!(
            PlaylistSource::parse(" HTTP://example.com/a.m3u "),
            PlaylistSource::Url("HTTP://example.com/a.m3u".to_string())
        );
        assert_eq!(
            PlaylistSource::parse("/tmp/list.m3u"),
            PlaylistSource::File(PathBuf::from("/tmp/list.m3u"))
        );
    }

    #[test]
    fn test_outcome_empty_vs_loaded() {
        assert!(matches!(outcome_from_text("#EXTM3U\n"), IngestOutcome::Empty));
        let outcome = outcome_from_text("#EXTINF:-1,One\nhttp://example.com/1.m3u8\n");
        assert_eq!(outcome.catalog().map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_missing_file_is_fetch_failure() {
        let path = std::env::temp_dir().join("iptv_directory_missing_playlist.m3u");
        let _ = fs::remove_file(&path);
        let outcome = ingest(&PlaylistSource::File(path), "test", Duration::from_secs(1));
        assert!(matches!(
            outcome,
            IngestOutcome::FetchFailed(IngestError::File { .. })
        ));
    }

    #[test]
    fn test_ingest_local_file() {
        let path = std::env::temp_dir().join("iptv_directory_ingest_test.m3u");
        fs::write(
            &path,
            "#EXTM3U\n#EXTINF:-1 group-title=\"News\",One\nhttp://example.com/1.m3u8\n",
        )
        .unwrap();
        let outcome = ingest(&PlaylistSource::File(path.clone()), "test", Duration::from_secs(1));
        let _ = fs::remove_file(&path);
        let catalog = outcome.catalog().expect("catalog loaded");
        assert_eq!(catalog.records()[0].category, "News");
    }

    #[test]
    fn test_status_success_range() {
        assert!(ensure_success(200).is_ok());
        assert!(ensure_success(203).is_ok());
        assert!(ensure_success(204).is_ok());
        assert!(matches!(ensure_success(301), Err(IngestError::Status(301))));
        assert!(matches!(ensure_success(404), Err(IngestError::Status(404))));
    }

    /// Serve one canned HTTP response on localhost and return its URL
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while let Ok(n) = stream.read(&mut buf) {
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    if request.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: audio/x-mpegurl\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}/index.m3u", addr)
    }

    #[test]
    fn test_non_authoritative_response_loads() {
        let url = serve_once(
            "203 Non-Authoritative Information",
            "#EXTM3U\n#EXTINF:-1,One\nhttp://example.com/1.m3u8\n",
        );
        let outcome = ingest(&PlaylistSource::Url(url), "test", Duration::from_secs(5));
        assert_eq!(outcome.catalog().map(|c| c.len()), Some(1));
    }

    #[test]
    fn test_error_status_is_fetch_failure() {
        let url = serve_once("404 Not Found", "missing");
        let outcome = ingest(&PlaylistSource::Url(url), "test", Duration::from_secs(5));
        assert!(matches!(
            outcome,
            IngestOutcome::FetchFailed(IngestError::Status(404))
        ));
    }

    #[test]
    fn test_superseded_generation_is_stale() {
        let mut generation = LoadGeneration::default();
        let first = generation.advance();
        assert!(generation.is_current(first));

        let second = generation.advance();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }
}
