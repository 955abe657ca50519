use serde::{Deserialize, Deserializer, Serialize};

/// Pagination block returned alongside every listing.
///
/// `page` may exceed `pages` when the result set shrank between requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub pages: u32,
    pub total: u64,
}

impl PaginationMeta {
    /// Metadata for an empty result: requested position, nothing found.
    pub fn empty(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            pages: 0,
            total: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    pub fn empty(page: u32, per_page: u32) -> Self {
        Self {
            items: Vec::new(),
            pagination: PaginationMeta::empty(page, per_page),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookSummary {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub authors: Vec<String>,
    pub image: Option<String>,
    pub preview_link: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub info_link: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub categories: Vec<String>,
    pub ratings_count: Option<f64>,
}

impl BookSummary {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or("Untitled")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingEntry {
    /// Id of the rated book.
    pub id: Option<String>,
    pub title: Option<String>,
    pub price: Option<String>,
    pub user_id: Option<String>,
    pub profile_name: Option<String>,
    pub helpfulness: Option<String>,
    pub score: Option<f64>,
    pub time: Option<i64>,
    pub summary: Option<String>,
    pub text: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
