//! Data models for the channel directory

/// Logo shown when a playlist entry has no `tvg-logo` or the image fails to load
pub const FALLBACK_LOGO: &str = "logo/favicon.svg";
pub const DEFAULT_NAME: &str = "Unknown";
pub const DEFAULT_COUNTRY: &str = "XX";
pub const DEFAULT_LANGUAGE: &str = "N/A";
pub const DEFAULT_CATEGORY: &str = "General";

/// Label of the "no filter" entry in the category menu
pub const ALL_CATEGORIES: &str = "All";

/// Stream flavour handed to the player. Only HLS manifests are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamType {
    #[default]
    Hls,
}

impl StreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Hls => "hls",
        }
    }
}

/// One playlist entry after normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub name: String,
    pub logo_url: String,
    pub stream_uri: String,
    pub stream_type: StreamType,
    pub country_code: String,
    pub language: String,
    pub category: String,
}

impl ChannelRecord {
    /// Deep-link key: the name with each whitespace run replaced by `-`
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    /// The entry carries a real language tag (not the placeholder, not empty)
    pub fn has_language(&self) -> bool {
        !self.language.is_empty() && self.language != DEFAULT_LANGUAGE
    }

    /// Regional-indicator flag for the country code, if it is two ASCII letters
    pub fn flag(&self) -> Option<String> {
        let code = self.country_code.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        if code.eq_ignore_ascii_case(DEFAULT_COUNTRY) {
            return None;
        }
        code.to_ascii_uppercase()
            .chars()
            .map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
            .collect()
    }
}

pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
                in_space = true;
            }
        } else {
            slug.push(c);
            in_space = false;
        }
    }
    slug
}

/// Active category filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    /// Map a menu label back to a filter; the sentinel label means no filter
    pub fn from_label(label: &str) -> Self {
        if label == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Named(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Named(name) => name,
        }
    }

    pub fn matches(&self, record: &ChannelRecord) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => record.category == *name,
        }
    }
}
