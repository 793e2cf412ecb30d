//! Keyed dictionary: `(name, namespace) -> group index`.
//!
//! Stands in for `do_dictionary_t`. Two instances live on [`crate::Config`]:
//! `keys_sequences` (resource lookup, keyed by a dynamically assigned
//! namespace id) and `keys_vars` (variables / iteration bindings / sections /
//! parameters, keyed by [`crate::context::VarNamespace`]).

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Default, Clone)]
pub(crate) struct KeyedDict<N> {
  map: HashMap<(String, N), usize>,
}

impl<N: Eq + Hash + Copy> KeyedDict<N> {
  pub(crate) fn new() -> Self {
    Self { map: HashMap::new() }
  }

  pub(crate) fn write(&mut self, key: &str, namespace: N, value: usize) {
    self.map.insert((key.to_owned(), namespace), value);
  }

  pub(crate) fn find(&self, key: &str, namespace: N) -> Option<usize> {
    self.map.get(&(key.to_owned(), namespace)).copied()
  }

  pub(crate) fn erase(&mut self, key: &str, namespace: N) {
    self.map.remove(&(key.to_owned(), namespace));
  }

  pub(crate) fn clear(&mut self) {
    self.map.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use pretty_assertions::assert_eq;

  #[test]
  fn write_find_erase() {
    let mut dict: KeyedDict<u8> = KeyedDict::new();
    dict.write("foo", 0, 3);
    assert_eq!(dict.find("foo", 0), Some(3));
    assert_eq!(dict.find("foo", 1), None);

    dict.write("foo", 0, 9);
    assert_eq!(dict.find("foo", 0), Some(9));

    dict.erase("foo", 0);
    assert_eq!(dict.find("foo", 0), None);
  }
}
