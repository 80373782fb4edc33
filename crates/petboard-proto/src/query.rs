//! Pagination, sort and filter parameters.
//!
//! [`ListQuery`] is a pure value object: equality plus a canonical query
//! string. Page numbers are 0-based, matching the backend.

use std::{fmt, str::FromStr};

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::ProtocolError;

/// Default number of posts per list page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Which list surface a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListKind {
    /// Every forum post.
    All,
    /// Posts authored by the viewer.
    Mine,
    /// Posts the backend marks as featured.
    Featured,
}

impl ListKind {
    /// All list surfaces.
    pub const ALL: [ListKind; 3] = [ListKind::All, ListKind::Mine, ListKind::Featured];
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Mine => write!(f, "mine"),
            Self::Featured => write!(f, "featured"),
        }
    }
}

/// Sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortBy {
    /// Creation time.
    #[default]
    CreatedAt,
    /// Like count.
    LikesCount,
    /// Comment count.
    CommentsCount,
}

impl SortBy {
    /// Backend parameter value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::LikesCount => "likesCount",
            Self::CommentsCount => "commentsCount",
        }
    }
}

impl FromStr for SortBy {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created" => Ok(Self::CreatedAt),
            "likesCount" | "likes" => Ok(Self::LikesCount),
            "commentsCount" | "comments" => Ok(Self::CommentsCount),
            other => Err(ProtocolError::InvalidValue { field: "sortBy", value: other.to_string() }),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDir {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortDir {
    /// Backend parameter value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortDir {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ProtocolError::InvalidValue { field: "sortDir", value: s.to_string() }),
        }
    }
}

/// Effective filter of a query. Free-text and tag search are never combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// No filtering.
    None,
    /// Free-text search term (trimmed, non-empty).
    Search(String),
    /// Tag search (trimmed, non-empty tags).
    Tags(Vec<String>),
}

/// How a list view is sliced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    /// 0-based page number.
    pub page: u32,
    /// Items per page.
    pub size: u32,
    /// Sort key.
    pub sort_by: SortBy,
    /// Sort direction.
    pub sort_dir: SortDir,
    /// Raw free-text search input.
    pub search_term: String,
    /// Raw comma-separated tag search input.
    pub tag_search_term: String,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::with_size(DEFAULT_PAGE_SIZE)
    }
}

impl ListQuery {
    /// First page, default sort, no filter.
    pub fn with_size(size: u32) -> Self {
        Self {
            page: 0,
            size: size.max(1),
            sort_by: SortBy::default(),
            sort_dir: SortDir::default(),
            search_term: String::new(),
            tag_search_term: String::new(),
        }
    }

    /// Effective filter. Tag search takes precedence over free-text search.
    pub fn filter(&self) -> Filter {
        let tags = parse_tags(&self.tag_search_term);
        if !tags.is_empty() {
            return Filter::Tags(tags);
        }
        let term = self.search_term.trim();
        if term.is_empty() { Filter::None } else { Filter::Search(term.to_string()) }
    }

    /// Query parameters in canonical order.
    ///
    /// `page`, `size`, `sortBy`, `sortDir`, then either one `searchTerm` or
    /// one `tags` entry per tag.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("size".to_string(), self.size.to_string()),
            ("sortBy".to_string(), self.sort_by.as_str().to_string()),
            ("sortDir".to_string(), self.sort_dir.as_str().to_string()),
        ];
        match self.filter() {
            Filter::None => {},
            Filter::Search(term) => pairs.push(("searchTerm".to_string(), term)),
            Filter::Tags(tags) => pairs.extend(tags.into_iter().map(|t| ("tags".to_string(), t))),
        }
        pairs
    }

    /// Canonical, percent-encoded query string (without leading `?`).
    pub fn to_query_string(&self) -> String {
        encode_pairs(&self.query_pairs())
    }
}

/// Split comma-separated tag input, trimming and dropping empty segments.
pub fn parse_tags(input: &str) -> Vec<String> {
    input.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect()
}

pub(crate) fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| {
            let key = utf8_percent_encode(k, NON_ALPHANUMERIC);
            let value = utf8_percent_encode(v, NON_ALPHANUMERIC);
            format!("{key}={value}")
        })
        .collect::<Vec<_>>()
        .join("&")
}
