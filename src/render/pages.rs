//! Pagination arithmetic for the structured reply surface.
//!
//! The pager tracks an externally-requested page and a page size; the
//! resolved [`PageView`] carries everything a presentation layer needs:
//! the clamped page, the half-open hydration slice, and the button window.

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct Pager {
    page_size: usize,
    requested: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self { page_size: page_size.max(1), requested: 1 }
    }

    /// Change the page size. The current page is re-clamped against the
    /// new page count the next time a view is computed.
    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
    }

    /// Request a page. Out-of-range values are clamped at view time.
    pub fn request_page(&mut self, page: usize) {
        self.requested = page.max(1);
    }

    /// Resolve the view over `total` identifiers.
    pub fn view(&self, total: usize) -> PageView {
        let total_pages = total_pages(total, self.page_size);
        let page = self.requested.clamp(1, total_pages.max(1));
        let start = (page - 1) * self.page_size;
        let end = (start + self.page_size).min(total);
        PageView {
            page,
            total_pages,
            page_size: self.page_size,
            total,
            start,
            end: end.max(start),
            buttons: button_window(page, total_pages),
        }
    }
}

/// One resolved page over an identifier list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total: usize,
    /// Half-open slice `[start, end)` of identifiers to hydrate for display.
    pub start: usize,
    pub end: usize,
    /// Page-number buttons to offer, at most five.
    pub buttons: Vec<usize>,
}

pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Sliding five-button window: all pages when there are five or fewer,
/// the first five while near the start, the last five while near the end,
/// a centered window otherwise.
pub fn button_window(current: usize, total_pages: usize) -> Vec<usize> {
    if total_pages <= 5 {
        return (1..=total_pages).collect();
    }
    if current <= 3 {
        (1..=5).collect()
    } else if current >= total_pages - 2 {
        (total_pages - 4..=total_pages).collect()
    } else {
        (current - 2..=current + 2).collect()
    }
}
