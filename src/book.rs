//! Ordered collection of ordered word groups.
//!
//! This is the Rust stand-in for the original's `do_book_t` container: an
//! append-only sequence of groups, each an append-only sequence of strings.
//! Three instances are kept on [`crate::Config`]: `sequences` (resource
//! values), `vars` (variable bindings and enum expansions), and `iteration`
//! (captured `FOR` bodies).

#[derive(Debug, Default, Clone)]
pub(crate) struct Book {
  groups: Vec<Vec<String>>,
}

impl Book {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Starts a new, empty group at the end of the book.
  pub(crate) fn push_group(&mut self) {
    self.groups.push(Vec::new());
  }

  /// Removes the last group, provided it is still empty. Used by handlers
  /// that speculatively open a group and then discover it has no values.
  pub(crate) fn undo_group(&mut self) {
    if matches!(self.groups.last(), Some(g) if g.is_empty()) {
      self.groups.pop();
    }
  }

  /// Appends a word to the last (current) group.
  pub(crate) fn push_word(&mut self, word: impl Into<String>) {
    if let Some(group) = self.groups.last_mut() {
      group.push(word.into());
    }
  }

  pub(crate) fn word(&self, group: usize, index: usize) -> Option<&str> {
    self.groups.get(group)?.get(index).map(String::as_str)
  }

  pub(crate) fn group_len(&self, group: usize) -> usize {
    self.groups.get(group).map_or(0, Vec::len)
  }

  /// Total number of groups currently stored.
  pub(crate) fn len(&self) -> usize {
    self.groups.len()
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.groups.is_empty()
  }

  pub(crate) fn clear(&mut self) {
    self.groups.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use pretty_assertions::assert_eq;

  #[test]
  fn push_and_undo_group() {
    let mut book = Book::new();
    book.push_group();
    book.push_word("alpha");
    book.push_word("beta");
    assert_eq!(book.len(), 1);
    assert_eq!(book.group_len(0), 2);
    assert_eq!(book.word(0, 0), Some("alpha"));
    assert_eq!(book.word(0, 1), Some("beta"));

    book.push_group();
    book.undo_group();
    assert_eq!(book.len(), 1);
  }

  #[test]
  fn undo_group_keeps_nonempty_groups() {
    let mut book = Book::new();
    book.push_group();
    book.push_word("x");
    book.undo_group();
    assert_eq!(book.len(), 1);
  }
}
