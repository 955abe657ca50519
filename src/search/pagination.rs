//! Page-number window for pagination controls.
//!
//! For page 8 of 20 with five visible pages the controls read
//! `1 … 6 7 [8] 9 10 … 20`.

use std::fmt;

use crate::catalog::PaginationMeta;

pub const DEFAULT_MAX_VISIBLE: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationWindow {
    /// The page the window was centered on, clamped into `1..=total_pages`.
    pub current: u32,
    pub total_pages: u32,
    /// Consecutive page numbers to render.
    pub pages: Vec<u32>,
    pub show_first: bool,
    pub show_leading_ellipsis: bool,
    pub show_last: bool,
    pub show_trailing_ellipsis: bool,
}

/// Compute the window of page numbers around `current_page`.
///
/// Returns `None` when there is at most one page and no controls are needed.
/// The window holds at most `max_visible` pages, is slid away from the edges so
/// it stays full whenever `total_pages >= max_visible`, and is flanked by
/// explicit first/last pages when those are outside it.
pub fn window(current_page: u32, total_pages: u32, max_visible: u32) -> Option<PaginationWindow> {
    if total_pages <= 1 {
        return None;
    }

    let max_visible = max_visible.max(1);
    let half = max_visible / 2;
    let current = current_page.clamp(1, total_pages);

    let mut start = current.saturating_sub(half).max(1);
    let end = start.saturating_add(max_visible - 1).min(total_pages);
    if end - start < max_visible - 1 {
        start = end.saturating_sub(max_visible - 1).max(1);
    }

    let show_first = current > half + 1 && start != 1;
    let show_last = current.saturating_add(half) < total_pages && end != total_pages;

    Some(PaginationWindow {
        current,
        total_pages,
        pages: (start..=end).collect(),
        show_first,
        show_leading_ellipsis: show_first && start > 2,
        show_last,
        show_trailing_ellipsis: show_last && end < total_pages - 1,
    })
}

impl PaginationWindow {
    pub fn has_previous(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total_pages
    }
}

impl fmt::Display for PaginationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if self.has_previous() {
            parts.push("‹ Prev".to_string());
        }
        if self.show_first {
            parts.push("1".to_string());
        }
        if self.show_leading_ellipsis {
            parts.push("…".to_string());
        }
        for page in &self.pages {
            if *page == self.current {
                parts.push(format!("[{}]", page));
            } else {
                parts.push(page.to_string());
            }
        }
        if self.show_trailing_ellipsis {
            parts.push("…".to_string());
        }
        if self.show_last {
            parts.push(self.total_pages.to_string());
        }
        if self.has_next() {
            parts.push("Next ›".to_string());
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// "Showing X-Y of Z items" for a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    pub first_item: u64,
    pub last_item: u64,
    pub total: u64,
}

impl PageSummary {
    pub fn from_meta(meta: &PaginationMeta) -> Self {
        let per_page = u64::from(meta.per_page);
        // A shrunken result set can leave the requested page past the end.
        let page = u64::from(meta.page.clamp(1, meta.pages.max(1)));
        let last_item = (page * per_page).min(meta.total);
        let first_item = ((page - 1) * per_page + 1).min(last_item);
        Self {
            first_item,
            last_item,
            total: meta.total,
        }
    }
}

impl fmt::Display for PageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Showing {}-{} of {} items",
            self.first_item, self.last_item, self.total
        )
    }
}
