//! A small declarative configuration language and its interpreter.
//!
//! An embedder registers one or more source files (or an in-memory buffer),
//! optionally injects typed parameters, calls [`Config::load`], and then
//! walks the resulting resources with [`Config::fetch`]/[`Config::iterate`]/
//! [`Config::resource`].
//!
//! The language itself is line-oriented: variable declarations and
//! combinations, numeric enum generators, file inclusion with cycle
//! detection, conditional sections, `FOR`-style iteration, a prefix-notation
//! math/color mini-language, and resource declarations (a namespace, a
//! property, and one or more substituted values).

#![deny(clippy::all, clippy::pedantic)]
#![allow(
  clippy::default_trait_access,
  clippy::doc_markdown,
  clippy::missing_errors_doc,
  clippy::module_name_repetitions,
  clippy::must_use_candidate,
  clippy::needless_pass_by_value,
  clippy::too_many_lines,
  clippy::wildcard_imports
)]

mod book;
mod color;
mod config;
mod context;
mod dict;
mod error;
mod limits;
mod loader;
mod rng;
mod sequence;
mod substitution;
mod token;
mod util;

pub use crate::config::Config;
pub use crate::error::{ConfigError, ErrorKind};
pub use crate::limits::Limits;
