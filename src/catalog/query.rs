/// Outgoing query for `GET /books/`.
///
/// Empty filter strings mean "no filter" and are left out of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub page: u32,
    pub per_page: u32,
    pub search: String,
    pub category: String,
    pub author: String,
}

impl SearchQuery {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            search: String::new(),
            category: String::new(),
            author: String::new(),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        push_non_empty(&mut pairs, "search", &self.search);
        push_non_empty(&mut pairs, "category", &self.category);
        push_non_empty(&mut pairs, "author", &self.author);
        pairs
    }
}

/// Outgoing query for `GET /ratings/`.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingQuery {
    pub page: u32,
    pub per_page: u32,
    pub book_id: String,
    pub user_id: String,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

impl RatingQuery {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            book_id: String::new(),
            user_id: String::new(),
            min_score: None,
            max_score: None,
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        push_non_empty(&mut pairs, "book_id", &self.book_id);
        push_non_empty(&mut pairs, "user_id", &self.user_id);
        if let Some(min) = self.min_score {
            pairs.push(("min_score", min.to_string()));
        }
        if let Some(max) = self.max_score {
            pairs.push(("max_score", max.to_string()));
        }
        pairs
    }
}

fn push_non_empty(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: &str) {
    if !value.is_empty() {
        pairs.push((key, value.to_string()));
    }
}
