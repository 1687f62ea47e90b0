use std::fmt;
use std::ops::Range;

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const SHOW_AROUND_CURRENT: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageLabel {
    Page(usize),
    Ellipsis,
}

impl fmt::Display for PageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageLabel::Page(n) => write!(f, "{n}"),
            PageLabel::Ellipsis => f.write_str("..."),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    Previous,
    Next,
    First,
    Last,
    Goto(usize),
}

pub fn total_pages(record_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    record_count.div_ceil(page_size)
}

/// Clamps `page` into `[1, max(total, 1)]`.
pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, total.max(1))
}

pub fn page_bounds(page: usize, page_size: usize, record_count: usize) -> Range<usize> {
    let start = page
        .saturating_sub(1)
        .saturating_mul(page_size)
        .min(record_count);
    let end = start.saturating_add(page_size).min(record_count);
    start..end
}

pub fn visible_slice<T>(records: &[T], page: usize, page_size: usize) -> &[T] {
    &records[page_bounds(page, page_size, records.len())]
}

/// Page selector labels for `current` out of `total` pages.
///
/// The window of pages within `SHOW_AROUND_CURRENT` of the current page is
/// kept, page 1 and the last page are always present, and an ellipsis marks
/// every gap wider than one page. The window is contiguous, so prepending the
/// first page and appending the last keeps the sequence ascending.
pub fn page_labels(current: usize, total: usize) -> Vec<PageLabel> {
    if total == 0 {
        return Vec::new();
    }
    let current = clamp_page(current, total);
    let low = current.saturating_sub(SHOW_AROUND_CURRENT).max(1);
    let high = (current + SHOW_AROUND_CURRENT).min(total);

    let mut pages: Vec<usize> = (low..=high).collect();
    if pages.first() != Some(&1) {
        pages.insert(0, 1);
    }
    if pages.last() != Some(&total) {
        pages.push(total);
    }

    let mut labels = Vec::with_capacity(pages.len() + 2);
    for (idx, &page) in pages.iter().enumerate() {
        labels.push(PageLabel::Page(page));
        if let Some(&next) = pages.get(idx + 1) {
            if next - page > 1 {
                labels.push(PageLabel::Ellipsis);
            }
        }
    }
    labels
}

/// One rendered page of a record set.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<'a, T> {
    pub number: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub page_size: usize,
    pub items: &'a [T],
    pub labels: Vec<PageLabel>,
    pub has_previous: bool,
    pub has_next: bool,
    /// 1-based, inclusive range of records shown; `None` when the page is empty.
    pub showing: Option<(usize, usize)>,
}

impl<T> Page<'_, T> {
    pub fn is_active(&self, label: PageLabel) -> bool {
        label == PageLabel::Page(self.number) && self.total_pages > 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    current_page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self, record_count: usize) -> usize {
        total_pages(record_count, self.page_size)
    }

    /// Applies a navigation action and returns the resulting page.
    pub fn navigate(&mut self, action: Navigation, record_count: usize) -> usize {
        let total = self.total_pages(record_count);
        let target = match action {
            Navigation::Previous => self.current_page.saturating_sub(1),
            Navigation::Next => self.current_page.saturating_add(1).min(total),
            Navigation::First => 1,
            Navigation::Last => total,
            Navigation::Goto(page) => page,
        };
        self.current_page = clamp_page(target, total);
        self.current_page
    }

    /// Re-clamps the current page after the record set changed size.
    pub fn reconcile(&mut self, record_count: usize) {
        let total = self.total_pages(record_count);
        self.current_page = clamp_page(self.current_page, total);
    }

    pub fn page<'a, T>(&self, records: &'a [T]) -> Page<'a, T> {
        let total = self.total_pages(records.len());
        let number = clamp_page(self.current_page, total);
        let bounds = page_bounds(number, self.page_size, records.len());
        let showing = if bounds.is_empty() {
            None
        } else {
            Some((bounds.start + 1, bounds.end))
        };
        Page {
            number,
            total_pages: total,
            total_records: records.len(),
            page_size: self.page_size,
            items: &records[bounds],
            labels: page_labels(number, total),
            has_previous: number > 1,
            has_next: number < total,
            showing,
        }
    }
}
