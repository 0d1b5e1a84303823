//! Home feed pagination.

/// The featured rail skips the two lead posts and shows the next ten.
const FEATURED_START: usize = 2;
const FEATURED_LEN: usize = 10;

/// Walks an ordered list in fixed-size batches ("load more").
#[derive(Debug, Clone)]
pub struct FeedCursor {
  batch_size: usize,
  /// Index of the first item not yet handed out
  next: usize,
}

impl FeedCursor {
  pub fn new(batch_size: usize) -> Self {
    Self {
      batch_size: batch_size.max(1),
      next: 0,
    }
  }

  /// Hand out the next batch. Empty once everything has been shown.
  pub fn next_batch<'a, T>(&mut self, items: &'a [T]) -> &'a [T] {
    let start = self.next.min(items.len());
    let end = (start + self.batch_size).min(items.len());
    self.next = end;
    &items[start..end]
  }

  pub fn is_exhausted(&self, total: usize) -> bool {
    self.next >= total
  }

  pub fn reset(&mut self) {
    self.next = 0;
  }
}

pub fn featured<T>(items: &[T]) -> &[T] {
  let start = FEATURED_START.min(items.len());
  let end = (FEATURED_START + FEATURED_LEN).min(items.len());
  &items[start..end]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cursor_walks_in_batches() {
    let items: Vec<u32> = (0..25).collect();
    let mut cursor = FeedCursor::new(10);

    assert_eq!(cursor.next_batch(&items), &items[0..10]);
    assert_eq!(cursor.next_batch(&items), &items[10..20]);
    assert_eq!(cursor.next_batch(&items), &items[20..25]);
    assert!(cursor.is_exhausted(items.len()));
    assert!(cursor.next_batch(&items).is_empty());
  }

  #[test]
  fn test_cursor_reset() {
    let items = [1, 2, 3];
    let mut cursor = FeedCursor::new(2);
    cursor.next_batch(&items);
    cursor.reset();
    assert_eq!(cursor.next_batch(&items), &[1, 2]);
  }

  #[test]
  fn test_zero_batch_size_is_clamped() {
    let items = [1, 2];
    let mut cursor = FeedCursor::new(0);
    assert_eq!(cursor.next_batch(&items), &[1]);
    assert_eq!(cursor.next_batch(&items), &[2]);
  }

  #[test]
  fn test_featured_window() {
    let items: Vec<u32> = (0..20).collect();
    assert_eq!(featured(&items), &items[2..12]);

    let short = [1, 2, 3, 4];
    assert_eq!(featured(&short), &[3, 4]);
    assert!(featured(&short[..2]).is_empty());
  }
}
