//! Result bounding
//!
//! A count limit only; document contents are never inspected.

use serde::Serialize;

/// A result sequence cut to at most `max` items
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bounded<T> {
    pub items: Vec<T>,
    /// True when items were dropped
    pub truncated: bool,
}

impl<T> Bounded<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Truncate `items` to at most `max` elements
pub fn bound<T>(mut items: Vec<T>, max: usize) -> Bounded<T> {
    let truncated = items.len() > max;
    items.truncate(max);
    Bounded { items, truncated }
}

/// The limit actually sent to the driver for a caller-requested limit
///
/// Missing, zero or negative requests fall back to `max`.
pub fn effective_limit(requested: Option<i64>, max: usize) -> usize {
    match requested {
        Some(n) if n > 0 => usize::try_from(n).map_or(max, |n| n.min(max)),
        _ => max,
    }
}
