//! Per-load parser state: the active source buffer, the lexer, and the
//! replay positions used to splice variable/iteration values back into the
//! token stream.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::trace;

use crate::book::Book;
use crate::dict::KeyedDict;
use crate::limits::Limits;
use crate::rng::Rng;

/// Namespaces within `keys_vars`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum VarNamespace {
  Variable,
  Iteration,
  Section,
  Parameter,
}

/// Namespace id reserved in `keys_sequences` for the namespace-name
/// registry (name -> first-seen namespace id).
pub(crate) const SEQUENCES_REGISTRY: u32 = 0;

/// One swapped-in source: either a real file (tracked by inode, for cycle
/// detection and relative `INCLUDE` resolution) or an in-memory buffer.
struct SourceFrame {
  chars: Vec<char>,
  pos: usize,
  dir: PathBuf,
  inode: u64,
  eol_reached: bool,
  eof_reached: bool,
}

impl SourceFrame {
  fn from_buffer(buffer: &str) -> Self {
    Self {
      chars: buffer.chars().collect(),
      pos: 0,
      dir: PathBuf::new(),
      inode: 0,
      eol_reached: false,
      eof_reached: false,
    }
  }
}

pub(crate) struct Context<'a> {
  pub(crate) limits: Limits,
  pub(crate) depth: usize,
  ancestors: HashSet<u64>,
  pub(crate) rng: &'a mut Rng,
  pub(crate) sequences: &'a mut Book,
  pub(crate) vars: &'a mut Book,
  pub(crate) iteration: &'a mut Book,
  pub(crate) keys_sequences: &'a mut KeyedDict<u32>,
  pub(crate) keys_vars: &'a mut KeyedDict<VarNamespace>,
  pub(crate) restricted: bool,
  pub(crate) skip_sequences: bool,
  frame: SourceFrame,
  pub(crate) var_group: usize,
  pub(crate) var_i: usize,
  pub(crate) it_group: usize,
  pub(crate) it_i: usize,
}

const REPLAY_SENTINEL: usize = usize::MAX;

impl<'a> Context<'a> {
  #[allow(clippy::too_many_arguments)]
  pub(crate) fn new(
    limits: Limits,
    rng: &'a mut Rng,
    sequences: &'a mut Book,
    vars: &'a mut Book,
    iteration: &'a mut Book,
    keys_sequences: &'a mut KeyedDict<u32>,
    keys_vars: &'a mut KeyedDict<VarNamespace>,
    restricted: bool,
  ) -> Self {
    Self {
      limits,
      depth: 0,
      ancestors: HashSet::new(),
      rng,
      sequences,
      vars,
      iteration,
      keys_sequences,
      keys_vars,
      restricted,
      skip_sequences: false,
      frame: SourceFrame::from_buffer(""),
      var_group: 0,
      var_i: REPLAY_SENTINEL,
      it_group: 0,
      it_i: REPLAY_SENTINEL,
    }
  }

  pub(crate) fn load_buffer(&mut self, buffer: &str) {
    self.frame = SourceFrame::from_buffer(buffer);
  }

  pub(crate) fn load_file(&mut self, path: &Path, inode: u64, dir: PathBuf, contents: &str) {
    self.frame = SourceFrame {
      chars: contents.chars().collect(),
      pos: 0,
      dir,
      inode,
      eol_reached: false,
      eof_reached: false,
    };
    trace!("parsing source `{}`", path.display());
  }

  pub(crate) fn current_dir(&self) -> &Path {
    &self.frame.dir
  }

  pub(crate) fn current_inode(&self) -> u64 {
    self.frame.inode
  }

  pub(crate) fn eof_reached(&self) -> bool {
    self.frame.eof_reached
  }

  pub(crate) fn eol_reached(&self) -> bool {
    self.frame.eol_reached
  }

  pub(crate) fn clear_eol(&mut self) {
    self.frame.eol_reached = false;
  }

  /// Marks the active frame as exhausted without consuming further
  /// characters, matching the `EOF` token's effect.
  pub(crate) fn mark_eof(&mut self) {
    self.frame.eof_reached = true;
    self.frame.eol_reached = true;
  }

  pub(crate) fn is_in_memory(&self) -> bool {
    self.frame.inode == 0
  }

  pub(crate) fn has_ancestor(&self, inode: u64) -> bool {
    self.ancestors.contains(&inode)
  }

  pub(crate) fn push_ancestor(&mut self, inode: u64) {
    self.ancestors.insert(inode);
  }

  pub(crate) fn pop_ancestor(&mut self, inode: u64) {
    self.ancestors.remove(&inode);
  }

  /// Saves the active source frame, runs `body`, then restores it. Used by
  /// the include handler to recurse into a child file and come back.
  pub(crate) fn with_child_frame<T>(
    &mut self,
    path: &Path,
    inode: u64,
    dir: PathBuf,
    contents: &str,
    body: impl FnOnce(&mut Self) -> T,
  ) -> T {
    let saved = std::mem::replace(
      &mut self.frame,
      SourceFrame {
        chars: contents.chars().collect(),
        pos: 0,
        dir,
        inode,
        eol_reached: false,
        eof_reached: false,
      },
    );
    trace!("parsing source `{}`", path.display());
    let result = body(self);
    self.frame = saved;
    result
  }

  fn read_char(&mut self) -> char {
    match self.frame.chars.get(self.frame.pos) {
      Some(&c) => {
        self.frame.pos += 1;
        c
      }
      None => '\0',
    }
  }

  fn update_state(&mut self, c: char) {
    if c == '\0' {
      self.frame.eof_reached = true;
      self.frame.eol_reached = true;
    } else if c == '\n' {
      self.frame.eol_reached = true;
    }
  }

  /// Lexes one raw token from the active buffer, honoring quoting rules.
  /// Returns `None` once the logical line has ended.
  fn read_word(&mut self) -> Option<String> {
    if self.frame.eol_reached {
      return None;
    }

    let mut c;
    loop {
      c = self.read_char();
      match c {
        ' ' | '(' | ')' | '\t' | '\u{b}' => continue,
        _ => break,
      }
    }

    let mut word = String::new();
    let mut quotes_1 = false;
    let mut quotes_2 = false;
    loop {
      match c {
        '\0' => break,
        ' ' | '(' | ')' | '\t' | '\u{b}' | '\n' => {
          if quotes_1 || quotes_2 {
            if word.len() < self.limits.token_capacity - 1 {
              word.push(c);
            }
          } else {
            break;
          }
        }
        '\'' => {
          if !quotes_2 {
            quotes_1 = !quotes_1;
          } else if word.len() < self.limits.token_capacity - 1 {
            word.push(c);
          }
        }
        '"' => {
          if !quotes_1 {
            quotes_2 = !quotes_2;
          } else if word.len() < self.limits.token_capacity - 1 {
            word.push(c);
          }
        }
        _ => {
          if word.len() < self.limits.token_capacity - 1 {
            word.push(c);
          }
        }
      }
      c = self.read_char();
    }

    self.update_state(c);

    // A zero-length result (including an empty pair of quotes) means there
    // was no more meaningful token on this line, matching the source
    // corpus's `return i;` truthiness.
    if word.is_empty() {
      return None;
    }
    Some(word)
  }

  /// Drains any pending variable/iteration replay, then falls back to the
  /// lexer. Does not apply substitution.
  pub(crate) fn get_token_raw(&mut self) -> Option<String> {
    if self.var_i != REPLAY_SENTINEL && self.var_i < self.vars.group_len(self.var_group) {
      let word = self.vars.word(self.var_group, self.var_i).unwrap().to_owned();
      self.var_i += 1;
      return Some(word);
    }
    if self.it_i != REPLAY_SENTINEL && self.it_i < self.iteration.group_len(self.it_group) {
      let word = self
        .iteration
        .word(self.it_group, self.it_i)
        .unwrap()
        .to_owned();
      self.it_i += 1;
      return Some(word);
    }
    self.read_word()
  }

  /// Drains the remainder of the current logical line and resets the
  /// replay cursors to their sentinel.
  pub(crate) fn goto_eol(&mut self) {
    while !self.frame.eol_reached {
      let c = self.read_char();
      self.update_state(c);
    }
    self.var_i = REPLAY_SENTINEL;
    self.it_i = REPLAY_SENTINEL;
  }

  pub(crate) fn reset_var_iterator(&mut self, group: usize) {
    self.var_group = group;
    self.var_i = 0;
  }
}
