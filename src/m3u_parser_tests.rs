//! Tests for M3U playlist parsing

#[cfg(test)]
mod tests {
    use crate::m3u_parser::*;
    use crate::models::*;

    #[test]
    fn test_parse_m3u() {
        let content = r#"
#EXTM3U
#EXTINF:-1 tvg-id="cnn" tvg-country="US" tvg-language="English" group-title="News",CNN
http://example.com/live/cnn.m3u8
#EXTINF:-1 tvg-id="bbc" tvg-country="UK" group-title="News",BBC World
https://example.com/live/bbc.m3u8
"#;
        let channels = parse_m3u(content);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].name, "CNN");
        assert_eq!(channels[0].stream_uri, "http://example.com/live/cnn.m3u8");
        assert_eq!(channels[0].country_code, "US");
        assert_eq!(channels[0].language, "English");
        assert_eq!(channels[0].category, "News");
        assert_eq!(channels[0].stream_type, StreamType::Hls);
        assert_eq!(channels[1].name, "BBC World");
        assert_eq!(channels[1].language, DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_name_after_last_comma() {
        let content = "#EXTINF:-1 group-title=\"Music\",Rock, Pop, and More  \nhttp://example.com/a.m3u8\n";
        let channels = parse_m3u(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "and More");
    }

    #[test]
    fn test_name_defaults_to_unknown() {
        let content = r#"#EXTINF:-1 tvg-logo="http://example.com/l.png"
http://example.com/1.m3u8
#EXTINF:-1 tvg-logo="http://example.com/l.png",
http://example.com/2.m3u8
"#;
        let channels = parse_m3u(content);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].name, "Unknown");
        assert_eq!(channels[1].name, "Unknown");
    }

    #[test]
    fn test_uri_line_is_trimmed() {
        let content = "#EXTINF:-1,Trailing\r\nhttp://example.com/live.m3u8   \r\n";
        let channels = parse_m3u(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "Trailing");
        assert_eq!(channels[0].stream_uri, "http://example.com/live.m3u8");
    }

    #[test]
    fn test_skips_entry_without_http_line() {
        let content = r#"#EXTM3U
#EXTINF:-1,Good One
http://example.com/1.m3u8
#EXTINF:-1,Multicast
udp://@233.50.230.1:5000
#EXTINF:-1,Has Option Line
#EXTVLCOPT:http-user-agent=Mozilla
http://example.com/3.m3u8
#EXTINF:-1,Good Two
http://example.com/4.m3u8
#EXTINF:-1,Dangling"#;
        let channels = parse_m3u(content);
        let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Good One", "Good Two"]);
        assert_eq!(channels[1].stream_uri, "http://example.com/4.m3u8");
    }

    #[test]
    fn test_defaults_for_missing_attributes() {
        let content = "#EXTINF:-1,Bare Channel\nhttp://example.com/bare.m3u8";
        let channels = parse_m3u(content);
        assert_eq!(channels.len(), 1);
        let ch = &channels[0];
        assert_eq!(ch.logo_url, FALLBACK_LOGO);
        assert_eq!(ch.country_code, "XX");
        assert_eq!(ch.language, "N/A");
        assert_eq!(ch.category, "General");
    }

    #[test]
    fn test_category_truncated_at_semicolon() {
        let content = "#EXTINF:-1 group-title=\"Sports;ExtraTag\",ESPN\nhttp://example.com/espn.m3u8";
        let channels = parse_m3u(content);
        assert_eq!(channels[0].category, "Sports");
    }

    #[test]
    fn test_attribute_order_independent() {
        let content = r#"#EXTINF:-1 group-title="Kids" tvg-language="French" tvg-logo="http://img/x.png" tvg-country="FR",Gulli
http://example.com/gulli.m3u8"#;
        let ch = &parse_m3u(content)[0];
        assert_eq!(ch.category, "Kids");
        assert_eq!(ch.language, "French");
        assert_eq!(ch.logo_url, "http://img/x.png");
        assert_eq!(ch.country_code, "FR");
    }

    #[test]
    fn test_malformed_quote_treated_as_absent() {
        let content = "#EXTINF:-1 tvg-logo=\"http://img/broken.png,Broken Logo\nhttp://example.com/b.m3u8";
        let ch = &parse_m3u(content)[0];
        assert_eq!(ch.logo_url, FALLBACK_LOGO);
        assert_eq!(ch.name, "Broken Logo");
    }

    #[test]
    fn test_empty_attribute_echoed_verbatim() {
        let content = "#EXTINF:-1 tvg-language=\"\" tvg-country=\"\",Quiet\nhttp://example.com/q.m3u8";
        let ch = &parse_m3u(content)[0];
        assert_eq!(ch.language, "");
        assert_eq!(ch.country_code, "");
        assert!(!ch.has_language());
    }

    #[test]
    fn test_parse_m3u_with_epg_url() {
        let content = r#"#EXTM3U x-tvg-url="http://example.com/epg.xml"
#EXTINF:-1 tvg-id="ch1" group-title="General",Channel 1
http://example.com/live/1.m3u8
"#;
        let playlist = parse_m3u_playlist(content);
        assert_eq!(playlist.epg_url.as_deref(), Some("http://example.com/epg.xml"));
        assert_eq!(playlist.channels.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_m3u("").is_empty());
        assert!(parse_m3u("#EXTM3U\n").is_empty());
        assert_eq!(parse_m3u_playlist("").epg_url, None);
    }

    #[test]
    fn test_extract_attr() {
        let line = r#"#EXTINF:-1 tvg-id="a" group-title="News;Politics",Name"#;
        assert_eq!(extract_attr(line, "tvg-id"), Some("a"));
        assert_eq!(extract_attr(line, "group-title"), Some("News;Politics"));
        assert_eq!(extract_attr(line, "tvg-logo"), None);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let content = "#EXTINF:-1,A\nhttp://a\n#EXTINF:-1,B\nhttp://b\n";
        assert_eq!(parse_m3u(content), parse_m3u(content));
    }

    #[test]
    fn test_extinf_followed_by_extinf() {
        let content = "#EXTINF:-1,A\n#EXTINF:-1,B\nhttp://example.com/b.m3u8\n";
        let channels = parse_m3u(content);
        let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B"]);
        assert_eq!(channels[0].stream_uri, "http://example.com/b.m3u8");
    }

    #[test]
    fn test_leading_bom_is_ignored() {
        let content = "\u{feff}#EXTINF:-1,A\nhttp://a\n";
        let channels = parse_m3u(content);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "A");

        let content = "\u{feff}#EXTM3U x-tvg-url=\"http://example.com/epg.xml\"\n#EXTINF:-1,B\nhttp://b\n";
        let playlist = parse_m3u_playlist(content);
        assert_eq!(playlist.epg_url.as_deref(), Some("http://example.com/epg.xml"));
        assert_eq!(playlist.channels.len(), 1);
    }
}
