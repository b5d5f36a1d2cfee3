//! Offset-based page slicing.

/// Return `items[offset..offset + page_size]`, clamped to the list.
///
/// An offset past the end yields an empty page rather than an error.
pub fn slice_page<T: Clone>(items: &[T], offset: usize, page_size: usize) -> Vec<T> {
    items.iter().skip(offset).take(page_size).cloned().collect()
}
