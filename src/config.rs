//! The public surface of the crate: registering sources and parameters,
//! driving a load, and querying the resources it produced.

use std::cell::Cell;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::book::Book;
use crate::context::{Context, VarNamespace, SEQUENCES_REGISTRY};
use crate::dict::KeyedDict;
use crate::error::ErrorKind;
use crate::limits::Limits;
use crate::loader;
use crate::rng::Rng;
use crate::sequence::dispatch_line;

/// A loaded configuration: the source list and parameters an embedder
/// registers, and the resources a `load` produces from them.
///
/// Once [`ErrorKind::Overflow`] or [`ErrorKind::Memory`] latches, every
/// mutating and querying method below becomes a no-op returning its
/// documented default, until [`Config::repair`] is called.
/// [`ErrorKind::Invalid`] (the state of [`Config::placeholder`]) never
/// clears.
#[derive(Debug, Clone)]
pub struct Config {
  sequences: Book,
  vars: Book,
  iteration: Book,
  keys_sequences: KeyedDict<u32>,
  keys_vars: KeyedDict<VarNamespace>,
  rng: Rng,
  sources: Vec<PathBuf>,
  parameter_names: Vec<String>,
  restricted: bool,
  limits: Limits,
  error: Cell<ErrorKind>,
  query_group: Option<usize>,
  query_index: Option<usize>,
}

impl Default for Config {
  fn default() -> Self {
    Self::new()
  }
}

impl Config {
  /// A fresh, unloaded instance using [`Limits::default`].
  pub fn new() -> Self {
    Self::with_limits(Limits::default())
  }

  /// A fresh instance with caller-supplied tunables.
  pub fn with_limits(limits: Limits) -> Self {
    Self {
      sequences: Book::new(),
      vars: Book::new(),
      iteration: Book::new(),
      keys_sequences: KeyedDict::new(),
      keys_vars: KeyedDict::new(),
      rng: Rng::new(),
      sources: Vec::new(),
      parameter_names: Vec::new(),
      restricted: false,
      limits,
      error: Cell::new(ErrorKind::None),
      query_group: None,
      query_index: None,
    }
  }

  /// An instance permanently latched to [`ErrorKind::Invalid`]. Every
  /// method below is a no-op on it.
  pub fn placeholder() -> Self {
    let config = Self::new();
    config.error.set(ErrorKind::Invalid);
    config
  }

  fn ok(&self) -> bool {
    !self.error.get().is_set()
  }

  /// Appends a source path to the fallback list consulted by [`Config::load`].
  pub fn push_source(&mut self, path: impl AsRef<Path>) {
    if !self.ok() {
      return;
    }
    self.sources.push(path.as_ref().to_path_buf());
  }

  /// Registers an integer parameter, exposed to `$` injection as a
  /// one-value variable under the `PARAMETER` namespace.
  pub fn push_parameter_long(&mut self, name: &str, value: i64) {
    self.push_parameter(name, value.to_string());
  }

  /// Registers a floating-point parameter, formatted the same way the
  /// substitution engine formats numerals.
  pub fn push_parameter_double(&mut self, name: &str, value: f64) {
    self.push_parameter(name, format!("{value:.8}"));
  }

  /// Registers a string parameter verbatim.
  pub fn push_parameter_str(&mut self, name: &str, value: &str) {
    self.push_parameter(name, value.to_owned());
  }

  fn push_parameter(&mut self, name: &str, value: String) {
    if !self.ok() {
      return;
    }
    self.vars.push_group();
    self.vars.push_word(value);
    let group = self.vars.len() - 1;
    self.keys_vars.write(name, VarNamespace::Parameter, group);
    self.parameter_names.push(name.to_owned());
  }

  pub fn clear_sources(&mut self) {
    if !self.ok() {
      return;
    }
    self.sources.clear();
  }

  pub fn clear_parameters(&mut self) {
    if !self.ok() {
      return;
    }
    for name in self.parameter_names.drain(..) {
      self.keys_vars.erase(&name, VarNamespace::Parameter);
    }
  }

  pub fn clear_resources(&mut self) {
    if !self.ok() {
      return;
    }
    self.sequences.clear();
    self.keys_sequences.clear();
    self.query_group = None;
    self.query_index = None;
  }

  /// Tries each pushed source in order, streaming the first one that can
  /// be opened. Not finding any openable source is not an error — callers
  /// use [`Config::can_open_sources`] to detect that up front.
  pub fn load(&mut self) {
    if !self.ok() {
      return;
    }
    self.sequences.clear();
    self.keys_sequences.clear();
    self.query_group = None;
    self.query_index = None;

    let sources = self.sources.clone();
    for path in &sources {
      let Some(inode) = loader::inode(path) else {
        warn!("could not open source `{}`, trying next", path.display());
        continue;
      };
      let contents = match loader::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
          warn!("could not read source `{}`: {err}", path.display());
          continue;
        }
      };
      info!("loading source `{}`", path.display());
      let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
      self.run(|ctx| ctx.load_file(path, inode, dir, &contents), inode);
      return;
    }
    debug!("no source could be opened");
  }

  /// Parses an in-memory buffer instead of a filesystem source.
  /// `INCLUDE` sequences are no-ops against a buffer loaded this way.
  pub fn load_internal(&mut self, buffer: &str) {
    if !self.ok() {
      return;
    }
    self.sequences.clear();
    self.keys_sequences.clear();
    self.query_group = None;
    self.query_index = None;
    self.run(|ctx| ctx.load_buffer(buffer), 0);
  }

  fn run(&mut self, load: impl FnOnce(&mut Context<'_>), root_inode: u64) {
    let mut ctx = Context::new(
      self.limits,
      &mut self.rng,
      &mut self.sequences,
      &mut self.vars,
      &mut self.iteration,
      &mut self.keys_sequences,
      &mut self.keys_vars,
      self.restricted,
    );
    load(&mut ctx);
    if root_inode != 0 {
      ctx.push_ancestor(root_inode);
    }
    while !ctx.eof_reached() {
      ctx.clear_eol();
      dispatch_line(&mut ctx);
    }
    self.restricted = ctx.restricted;
  }

  /// Looks up a `(namespace, property)` resource and resets the read
  /// cursor over it. A failed lookup leaves the cursor unset, so
  /// [`Config::resource`] returns the empty string until the next
  /// successful fetch.
  pub fn fetch(&mut self, namespace: &str, property: &str) {
    if !self.ok() {
      return;
    }
    self.query_group = None;
    self.query_index = None;
    if let Some(ns_id) = self.keys_sequences.find(namespace, SEQUENCES_REGISTRY) {
      if let Some(group) = self.keys_sequences.find(property, ns_id as u32) {
        self.query_group = Some(group);
      }
    }
  }

  /// Advances the read cursor set up by [`Config::fetch`]. Returns `true`
  /// while a value remains at the new cursor position.
  pub fn iterate(&mut self) -> bool {
    if !self.ok() {
      return false;
    }
    let Some(group) = self.query_group else { return false };
    let next = self.query_index.map_or(0, |i| i + 1);
    if next < self.sequences.group_len(group) {
      self.query_index = Some(next);
      true
    } else {
      false
    }
  }

  /// The value at the current read cursor, or the empty string if no
  /// fetch succeeded or the cursor hasn't been advanced yet.
  pub fn resource(&self) -> &str {
    if !self.ok() {
      return "";
    }
    match (self.query_group, self.query_index) {
      (Some(group), Some(index)) => self.sequences.word(group, index).unwrap_or(""),
      _ => "",
    }
  }

  /// Number of values in the resource the read cursor currently points
  /// at, or `0` if no fetch succeeded.
  pub fn resource_length(&self) -> usize {
    if !self.ok() {
      return 0;
    }
    self.query_group.map_or(0, |group| self.sequences.group_len(group))
  }

  pub fn error(&self) -> ErrorKind {
    self.error.get()
  }

  /// Clears a latched [`ErrorKind::Overflow`] or [`ErrorKind::Memory`].
  /// Has no effect on [`ErrorKind::Invalid`], which is permanent.
  pub fn repair(&mut self) {
    match self.error.get() {
      ErrorKind::Overflow | ErrorKind::Memory => self.error.set(ErrorKind::None),
      _ => {}
    }
  }

  /// Permanently disables `INCLUDE`, `VAR_*`, `ENUM`, `FOR`, `SEED`,
  /// `PRINT`, `SECTION_*`, and `RESTRICT` handling for the remainder of
  /// this instance's lifetime; resource declarations keep working.
  pub fn restrict(&mut self) {
    if !self.ok() {
      return;
    }
    self.restricted = true;
  }

  pub fn unrestrict(&mut self) {
    if !self.ok() {
      return;
    }
    self.restricted = false;
  }

  /// Whether any pushed source path can currently be opened, and if so,
  /// its position in the source list.
  pub fn can_open_sources(&self) -> Option<usize> {
    if !self.ok() {
      return None;
    }
    self.sources.iter().position(|path| loader::inode(path).is_some())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use pretty_assertions::assert_eq;

  #[test]
  fn declares_and_fetches_a_resource() {
    let mut config = Config::new();
    config.load_internal("widget color #ff0000\n");
    config.fetch("widget", "color");
    assert!(config.iterate());
    assert_eq!(config.resource(), "#ff0000");
    assert!(!config.iterate());
  }

  #[test]
  fn variable_injection_and_math() {
    let mut config = Config::new();
    config.load_internal("LET base 2\nwidget scale ( * $ base 3 )\n");
    config.fetch("widget", "scale");
    assert!(config.iterate());
    assert_eq!(config.resource(), "6.00000000");
  }

  #[test]
  fn enum_with_three_parameters() {
    let mut config = Config::new();
    config.load_internal("ENUM steps 0 10 2\nwidget x $ steps\n");
    config.fetch("widget", "x");
    assert!(config.iterate());
    assert_eq!(config.resource(), "0");
    assert!(config.iterate());
    assert_eq!(config.resource(), "5");
    assert!(config.iterate());
    assert_eq!(config.resource(), "10");
    assert!(!config.iterate());
  }

  #[test]
  fn iteration_binds_alias_per_value() {
    // Each pass through the body uses the current iterated value as the
    // resource namespace itself, so two distinct resources come out.
    let mut config = Config::new();
    config.load_internal("LET widgets label button\nFOR widgets w\n$ w border 1\nFOR_END\n");

    config.fetch("label", "border");
    assert!(config.iterate());
    assert_eq!(config.resource(), "1");

    config.fetch("button", "border");
    assert!(config.iterate());
    assert_eq!(config.resource(), "1");
  }

  #[test]
  fn section_skips_when_tag_undeclared() {
    let mut config = Config::new();
    config.load_internal("SECTION debug\nwidget visible 1\n");
    config.fetch("widget", "visible");
    assert_eq!(config.resource_length(), 0);
  }

  #[test]
  fn restrict_disables_variable_declarations() {
    // RESTRICT blocks the LET, so `$ x` fails to resolve and the resource
    // declaration that depends on it never gets a value and is dropped.
    let mut config = Config::new();
    config.load_internal("RESTRICT\nLET x 1\nwidget n $ x\n");
    config.fetch("widget", "n");
    assert_eq!(config.resource_length(), 0);
    assert!(!config.iterate());
  }

  #[test]
  fn restrict_still_allows_resource_declarations() {
    let mut config = Config::new();
    config.load_internal("RESTRICT\nwidget n 1\n");
    config.fetch("widget", "n");
    assert!(config.iterate());
    assert_eq!(config.resource(), "1");
  }

  #[test]
  fn placeholder_is_permanently_invalid() {
    let mut config = Config::placeholder();
    assert_eq!(config.error(), ErrorKind::Invalid);
    config.repair();
    assert_eq!(config.error(), ErrorKind::Invalid);
    config.push_source("whatever.cfg");
    config.load();
    assert_eq!(config.can_open_sources(), None);
  }

  #[test]
  fn can_open_sources_reports_first_openable_index() {
    let mut config = Config::new();
    config.push_source("/definitely/not/a/real/path.cfg");
    assert_eq!(config.can_open_sources(), None);
  }
}
