use std::fmt;

/// One entry of the crawl's output stream
///
/// Rendered as `data,{status},{source},{link}` or `error,{detail}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputRecord {
    /// A link seen on a fetched page, before any domain filtering
    Data {
        status_code: u16,
        source_url: String,
        raw_link: String,
    },

    /// A failed fetch attempt or a rejected page
    Error { detail: String },
}

impl OutputRecord {
    pub fn data(status_code: u16, source_url: impl Into<String>, raw_link: impl Into<String>) -> Self {
        Self::Data {
            status_code,
            source_url: source_url.into(),
            raw_link: raw_link.into(),
        }
    }

    pub fn error(detail: impl fmt::Display) -> Self {
        Self::Error {
            detail: detail.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Tag prefix distinguishing the two record kinds
    fn tag(&self) -> &'static str {
        match self {
            Self::Data { .. } => "data",
            Self::Error { .. } => "error",
        }
    }
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data {
                status_code,
                source_url,
                raw_link,
            } => write!(f, "{},{},{},{}", self.tag(), status_code, source_url, raw_link),
            Self::Error { detail } => write!(f, "{},{}", self.tag(), detail),
        }
    }
}
