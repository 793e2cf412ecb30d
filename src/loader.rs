//! Filesystem side of the source loader: opening a path, reading it whole,
//! and producing an inode-like identifier used for include-cycle
//! detection. In-memory buffers never go through this module; they are
//! handed to [`crate::context::Context::load_buffer`] directly with inode
//! `0`.

use std::fs;
use std::io;
use std::path::Path;

#[cfg(unix)]
pub(crate) fn inode(path: &Path) -> Option<u64> {
  use std::os::unix::fs::MetadataExt;
  let ino = fs::metadata(path).ok()?.ino();
  Some(if ino == 0 { 1 } else { ino })
}

#[cfg(not(unix))]
pub(crate) fn inode(path: &Path) -> Option<u64> {
  use std::hash::{Hash, Hasher};
  let canonical = fs::canonicalize(path).ok()?;
  let mut hasher = std::collections::hash_map::DefaultHasher::new();
  canonical.hash(&mut hasher);
  let id = hasher.finish();
  Some(if id == 0 { 1 } else { id })
}

pub(crate) fn read_to_string(path: &Path) -> io::Result<String> {
  fs::read_to_string(path)
}

#[cfg(test)]
mod tests {
  use super::*;

  use pretty_assertions::assert_eq;
  use std::io::Write;

  #[test]
  fn inode_is_stable_for_same_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "hello").unwrap();
    let a = inode(file.path());
    let b = inode(file.path());
    assert!(a.is_some());
    assert_eq!(a, b);
  }

  #[test]
  fn inode_is_none_for_missing_file() {
    assert_eq!(inode(Path::new("/does/not/exist/surely")), None);
  }
}
