/// Tunables the original C implementation hardcoded as preprocessor
/// constants. Exposed here so an embedder can shrink or grow them without
/// forking the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
  /// Maximum byte length of a single token, terminator included. Characters
  /// past this length are silently dropped, matching the source corpus.
  pub token_capacity: usize,
  /// Maximum recursion depth shared by substitution, `FOR` nesting, and
  /// `INCLUDE` nesting.
  pub max_depth: usize,
  /// Upper bound on `ENUM` fractional-digit precision.
  pub max_precision: u32,
}

impl Default for Limits {
  fn default() -> Self {
    Self {
      token_capacity: 1024,
      max_depth: 32,
      max_precision: 16,
    }
  }
}
