//! Fixed-size, 1-based pagination over an already ordered candidate set.
//!
//! The engine itself does no sorting: stable pages require the caller to
//! hand in items in a repeatable order (the store orders images by id).

use serde::{Deserialize, Serialize};

use crate::error::PageError;

/// A validated page request: both numbers are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_no: usize,
    page_size: usize,
}

impl PageRequest {
    pub fn new(page_no: usize, page_size: usize) -> Result<Self, PageError> {
        if page_no == 0 {
            return Err(PageError::ZeroPageNumber);
        }
        if page_size == 0 {
            return Err(PageError::ZeroPageSize);
        }
        Ok(Self { page_no, page_size })
    }

    pub fn page_no(&self) -> usize {
        self.page_no
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    pub page_no: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub content: Vec<T>,
}

impl<T> Page<T> {
    /// Project the content, keeping the navigation metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page_no: self.page_no,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
            content: self.content.into_iter().map(f).collect(),
        }
    }
}

/// Cut `items` into the page described by `request`. Pages past the end are
/// empty, not an error.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let PageRequest { page_no, page_size } = request;
    let total = items.len();
    let total_pages = total.div_ceil(page_size);

    let start = (page_no - 1).saturating_mul(page_size);
    let content = if start >= total {
        Vec::new()
    } else {
        items.into_iter().skip(start).take(page_size).collect()
    };

    Page {
        page_no,
        page_size,
        total,
        total_pages,
        has_next: page_no < total_pages,
        has_previous: page_no > 1,
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: usize, page_no: usize, page_size: usize) -> Page<usize> {
        paginate((0..items).collect(), PageRequest::new(page_no, page_size).unwrap())
    }

    #[test]
    fn test_eleven_items_in_pages_of_ten() {
        let first = page(11, 1, 10);
        assert_eq!(first.content.len(), 10);
        assert_eq!(first.total, 11);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let second = page(11, 2, 10);
        assert_eq!(second.content, vec![10]);
        assert!(!second.has_next);
        assert!(second.has_previous);
    }

    #[test]
    fn test_pages_cover_everything_once() {
        for n in 0..40 {
            for size in 1..12 {
                let first = page(n, 1, size);
                assert_eq!(first.total_pages, (n + size - 1) / size);

                let mut seen = Vec::new();
                for page_no in 1..=first.total_pages {
                    seen.extend(page(n, page_no, size).content);
                }
                assert_eq!(seen, (0..n).collect::<Vec<_>>(), "n={n} size={size}");
            }
        }
    }

    #[test]
    fn test_empty_set() {
        let only = page(0, 1, 10);
        assert_eq!(only.total_pages, 0);
        assert!(only.content.is_empty());
        assert!(!only.has_next);
        assert!(!only.has_previous);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let beyond = page(5, 4, 2);
        assert!(beyond.content.is_empty());
        assert_eq!(beyond.total_pages, 3);
        assert!(!beyond.has_next);
        assert!(beyond.has_previous);
    }

    #[test]
    fn test_zero_values_rejected() {
        assert_eq!(PageRequest::new(0, 10), Err(PageError::ZeroPageNumber));
        assert_eq!(PageRequest::new(1, 0), Err(PageError::ZeroPageSize));
    }

    #[test]
    fn test_map_keeps_metadata() {
        let mapped = page(3, 1, 2).map(|n| n.to_string());
        assert_eq!(mapped.content, vec!["0".to_string(), "1".to_string()]);
        assert_eq!(mapped.total, 3);
        assert!(mapped.has_next);
    }
}
