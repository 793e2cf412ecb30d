use std::path::PathBuf;

/// The sticky error state carried on a [`Config`](crate::Config) instance.
///
/// Unlike [`ConfigError`], these are never returned from a method call: they
/// are latched on the instance and observed with `Config::error`. Only
/// [`ErrorKind::Overflow`] and [`ErrorKind::Memory`] can be cleared, via
/// `Config::repair`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
  /// No error latched.
  #[default]
  None,
  /// The instance is permanently unusable (the placeholder instance).
  Invalid,
  /// A container would have exceeded its capacity.
  Overflow,
  /// An allocation failed.
  Memory,
}

impl ErrorKind {
  /// Whether this kind blocks further mutation until repaired.
  pub fn is_set(self) -> bool {
    !matches!(self, ErrorKind::None)
  }
}

/// Failures surfaced directly from a fallible call, as opposed to the sticky
/// [`ErrorKind`] latched on the config instance.
///
/// Parse-level mistakes in a source file are never reported this way: per the
/// language's error discipline, those are silently skipped and logged at
/// `warn` level instead.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read source `{path}`: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("config instance is in the `{0:?}` error state")]
  Latched(ErrorKind),
}
