//! Common type definitions.
//!
//! All entity IDs are store-assigned `BIGSERIAL` values wrapped in type aliases so
//! signatures say which table an id belongs to:
//!
//! - [`UserId`]: User account identifier
//! - [`ConferenceId`]: Conference (group chat) identifier
//! - [`MessageId`]: Message identifier

// Type aliases for IDs
pub type UserId = i64;
pub type ConferenceId = i64;
pub type MessageId = i64;

/// Remove duplicate ids, keeping the first occurrence of each.
pub fn dedup_preserving_order<T: PartialEq + Copy>(ids: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_preserving_order() {
        assert_eq!(dedup_preserving_order(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(dedup_preserving_order::<i64>(&[]).is_empty());
    }
}
