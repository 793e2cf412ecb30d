//! Per-line sequence dispatch: reads the first substituted token on a
//! logical line and routes to the handler for that keyword. Resource
//! declarations are the fallback case — any leader that isn't a recognized
//! keyword becomes the resource namespace name.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::context::{Context, VarNamespace, SEQUENCES_REGISTRY};
use crate::loader;
use crate::token::{classify, TokenKind};

/// Reads one token, dispatches to its handler, then drains whatever is
/// left on the line. Guarded by the same depth counter the substitution
/// engine uses, since `INCLUDE` and `FOR` both recurse back into this
/// function.
pub(crate) fn dispatch_line(ctx: &mut Context) {
  if ctx.depth >= ctx.limits.max_depth {
    warn!("sequence depth guard tripped, skipping line");
    ctx.goto_eol();
    return;
  }
  ctx.depth += 1;

  let resolved = ctx.get_token();
  let mut kind = resolved.as_ref().map(|r| r.kind).unwrap_or(TokenKind::Invalid);
  if kind != TokenKind::SectionBegin && ctx.skip_sequences {
    kind = TokenKind::Invalid;
  }

  use TokenKind::*;
  match kind {
    VarAppend | VarPrepend | VarMerge => combine_var(ctx, kind),
    VarDeclaration => declare_variable(ctx),
    EnumDeclaration => declare_enum(ctx),
    SectionBegin => section_begin(ctx),
    SectionAdd => section_add(ctx),
    SectionDel => section_del(ctx),
    Include => include(ctx),
    ForBegin => iterate(ctx),
    Seed => seed(ctx),
    Print => print_line(ctx),
    Restrict => {
      ctx.restricted = true;
    }
    Invalid => {}
    _ => {
      let namespace = resolved.map(|r| r.text).unwrap_or_default();
      declare_resource(ctx, &namespace);
    }
  }

  ctx.goto_eol();
  ctx.depth -= 1;
}

fn combine_var(ctx: &mut Context, kind: TokenKind) {
  if ctx.restricted {
    return;
  }
  let Some(name) = ctx.get_token() else { return };
  let Some(source_tok) = ctx.get_token() else { return };
  let Some(operand_tok) = ctx.get_token() else { return };
  let Some(source) = ctx.keys_vars.find(&source_tok.text, VarNamespace::Variable) else {
    return;
  };

  // For MERGE, the operand token is itself the name of a second variable,
  // paired element-wise with the source; for APPEND/PREPEND it is the
  // literal string glued onto every source value.
  let second = if kind == TokenKind::VarMerge {
    let Some(second_group) = ctx.keys_vars.find(&operand_tok.text, VarNamespace::Variable) else {
      return;
    };
    Some(second_group)
  } else {
    None
  };

  ctx.vars.push_group();
  let len = ctx.vars.group_len(source);
  for k in 0..len {
    let base = ctx.vars.word(source, k).unwrap_or("").to_owned();
    let value = match kind {
      TokenKind::VarAppend => format!("{base}{}", operand_tok.text),
      TokenKind::VarPrepend => format!("{}{base}", operand_tok.text),
      TokenKind::VarMerge => {
        let extra = second
          .and_then(|group| ctx.vars.word(group, k))
          .unwrap_or("")
          .to_owned();
        format!("{base}{extra}")
      }
      _ => unreachable!("combine_var called with non-combine kind"),
    };
    ctx.vars.push_word(value);
  }
  // No undo-if-empty here: unlike declare_variable/declare_resource, an
  // empty source group still binds `name` to the (now empty) new group.
  let group = ctx.vars.len() - 1;
  ctx.keys_vars.write(&name.text, VarNamespace::Variable, group);
}

fn declare_variable(ctx: &mut Context) {
  if ctx.restricted {
    return;
  }
  let Some(name) = ctx.get_token() else { return };
  ctx.vars.push_group();
  let mut n = 0;
  while let Some(value) = ctx.get_token() {
    ctx.vars.push_word(value.text);
    n += 1;
  }
  if n == 0 {
    ctx.vars.undo_group();
    return;
  }
  let group = ctx.vars.len() - 1;
  ctx.keys_vars.write(&name.text, VarNamespace::Variable, group);
}

fn declare_enum(ctx: &mut Context) {
  if ctx.restricted {
    return;
  }
  let Some(name) = ctx.get_token() else { return };

  // Each numeral is only read once the previous one parsed, so a
  // non-decimal token anywhere in the middle (`ENUM e 0 foo 5`) stops the
  // run right there instead of leaving a gap that `n` would miscount.
  let p1 = ctx.get_token_numeral();
  let p2 = p1.and_then(|_| ctx.get_token_numeral());
  let p3 = p2.and_then(|_| ctx.get_token_numeral());
  let p4 = p3.and_then(|_| ctx.get_token_numeral());

  let n = p1.is_some() as u8 + p2.is_some() as u8 + p3.is_some() as u8 + p4.is_some() as u8;
  if n < 1 {
    return;
  }

  let (min, max, steps, precision) = match n {
    1 => {
      let max = p1.unwrap();
      (0.0, max, max, 0.0)
    }
    2 => {
      let min = p1.unwrap();
      let max = p2.unwrap();
      (min, max, max - min, 0.0)
    }
    3 => {
      let min = p1.unwrap();
      let max = p2.unwrap();
      (min, max, p3.unwrap(), 0.0)
    }
    _ => (p1.unwrap(), p2.unwrap(), p3.unwrap(), p4.unwrap()),
  };

  if steps < 1.0 || steps >= usize::MAX as f64 || precision < 0.0 {
    return;
  }
  let precision = precision.min(ctx.limits.max_precision as f64) as usize;
  let steps = steps as usize;

  ctx.vars.push_group();
  for i in 0..=steps {
    let ratio = i as f64 / steps as f64;
    let value = crate::util::interpolate(min, max, ratio);
    ctx.vars.push_word(format!("{value:.precision$}"));
  }
  let group = ctx.vars.len() - 1;
  ctx.keys_vars.write(&name.text, VarNamespace::Variable, group);
}

fn declare_resource(ctx: &mut Context, namespace: &str) {
  let Some(name) = ctx.get_token() else { return };
  ctx.sequences.push_group();
  let mut n = 0;
  while let Some(value) = ctx.get_token() {
    ctx.sequences.push_word(value.text);
    n += 1;
  }
  if n == 0 {
    ctx.sequences.undo_group();
    return;
  }

  let ns_id = match ctx.keys_sequences.find(namespace, SEQUENCES_REGISTRY) {
    Some(id) => id as u32,
    None => {
      let id = ctx.sequences.len() as u32;
      ctx.keys_sequences.write(namespace, SEQUENCES_REGISTRY, id as usize);
      id
    }
  };

  let group = ctx.sequences.len() - 1;
  ctx.keys_sequences.write(&name.text, ns_id, group);
}

fn section_begin(ctx: &mut Context) {
  if ctx.restricted {
    return;
  }
  while let Some(tag) = ctx.get_token() {
    if ctx.keys_vars.find(&tag.text, VarNamespace::Section).is_none() {
      ctx.skip_sequences = true;
      return;
    }
  }
  ctx.skip_sequences = false;
}

fn section_add(ctx: &mut Context) {
  if ctx.restricted {
    return;
  }
  while let Some(tag) = ctx.get_token() {
    ctx.keys_vars.write(&tag.text, VarNamespace::Section, 0);
  }
}

fn section_del(ctx: &mut Context) {
  if ctx.restricted {
    return;
  }
  while let Some(tag) = ctx.get_token() {
    ctx.keys_vars.erase(&tag.text, VarNamespace::Section);
  }
}

fn seed(ctx: &mut Context) {
  if ctx.restricted {
    return;
  }
  if let Some(value) = ctx.get_token_numeral() {
    ctx.rng.reseed(value);
  }
}

fn print_line(ctx: &mut Context) {
  if ctx.restricted {
    return;
  }
  let mut fields = Vec::new();
  while let Some(tok) = ctx.get_token() {
    fields.push(tok.text);
  }
  info!("{}", fields.join(",\t"));
}

fn include(ctx: &mut Context) {
  if ctx.restricted || ctx.is_in_memory() {
    return;
  }
  while let Some(tok) = ctx.get_token() {
    let candidate = Path::new(&tok.text);
    let path = if candidate.is_absolute() {
      candidate.to_path_buf()
    } else {
      ctx.current_dir().join(candidate)
    };
    parse_include(ctx, &path);
  }
}

fn parse_include(ctx: &mut Context, path: &Path) {
  let Some(inode) = loader::inode(path) else {
    warn!("could not open include `{}`", path.display());
    return;
  };
  if ctx.has_ancestor(inode) {
    warn!("include cycle detected at `{}`, skipping", path.display());
    return;
  }
  let contents = match loader::read_to_string(path) {
    Ok(contents) => contents,
    Err(err) => {
      warn!("could not read include `{}`: {err}", path.display());
      return;
    }
  };
  let dir: PathBuf = path.parent().map(Path::to_path_buf).unwrap_or_default();

  ctx.push_ancestor(inode);
  ctx.with_child_frame(path, inode, dir, &contents, |ctx| {
    while !ctx.eof_reached() {
      ctx.clear_eol();
      dispatch_line(ctx);
    }
  });
  ctx.pop_ancestor(inode);
}

/// Captures every physical line from here to the matching `FOR_END` (not
/// yet nested inside another capture) into the `iteration` book, one group
/// per line. Returns `true` if EOF was hit before a matching `FOR_END`.
fn preproc_iter_new(ctx: &mut Context) -> bool {
  ctx.goto_eol();
  let mut depth = 0_i32;
  while !ctx.eof_reached() {
    ctx.clear_eol();
    let Some(first) = ctx.get_token_raw() else {
      ctx.goto_eol();
      continue;
    };
    match classify(&first) {
      TokenKind::ForBegin => depth += 1,
      TokenKind::ForEnd => {
        if depth == 0 {
          ctx.goto_eol();
          return false;
        }
        depth -= 1;
      }
      _ => {}
    }
    ctx.iteration.push_group();
    ctx.iteration.push_word(first);
    while let Some(tok) = ctx.get_token_raw() {
      ctx.iteration.push_word(tok);
    }
  }
  true
}

/// Scans an already-captured `iteration` range (used for a `FOR` nested
/// inside another `FOR` body) for the matching `FOR_END`, starting at
/// group `start`. Returns `(end_group, hit_eof_without_match)`.
fn preproc_iter_nest(ctx: &mut Context, start: usize) -> (usize, bool) {
  let total = ctx.iteration.len();
  let mut depth = 0_i32;
  let mut i = start;
  while i < total {
    ctx.it_group = i;
    ctx.it_i = 0;
    let Some(tok) = ctx.get_token_raw() else {
      i += 1;
      continue;
    };
    match classify(&tok) {
      TokenKind::ForBegin => depth += 1,
      TokenKind::ForEnd => {
        if depth == 0 {
          return (i, false);
        }
        depth -= 1;
      }
      _ => {}
    }
    i += 1;
  }
  (i, true)
}

fn iterate(ctx: &mut Context) {
  if ctx.restricted {
    return;
  }
  let Some(source_tok) = ctx.get_token() else { return };
  let Some(source_group) = ctx.keys_vars.find(&source_tok.text, VarNamespace::Variable) else {
    return;
  };
  let alias = match ctx.get_token() {
    Some(tok) => tok.text,
    None => source_tok.text.clone(),
  };
  if ctx.keys_vars.find(&alias, VarNamespace::Iteration).is_some() {
    return;
  }

  let nested = !ctx.iteration.is_empty();
  let (group_start, group_end, failed) = if nested {
    let start = ctx.it_group + 1;
    let (end, failed) = preproc_iter_nest(ctx, start);
    (start, end, failed)
  } else {
    let failed = preproc_iter_new(ctx);
    (0, ctx.iteration.len(), failed)
  };

  if !failed {
    let len = ctx.vars.group_len(source_group);
    for k in 0..len {
      let value = ctx.vars.word(source_group, k).unwrap_or("").to_owned();
      ctx.vars.push_group();
      ctx.vars.push_word(value);
      let value_group = ctx.vars.len() - 1;
      ctx.keys_vars.write(&alias, VarNamespace::Iteration, value_group);

      // `it_group` is advanced by this loop, but also by any nested `FOR`
      // a dispatched line turns out to start: its own body-scan and
      // replay leave `it_group` sitting past everything it consumed, so
      // resuming from the current value (rather than a fixed range)
      // skips the nested body instead of re-dispatching it line by line.
      ctx.it_group = group_start;
      while ctx.it_group < group_end {
        ctx.it_i = 0;
        dispatch_line(ctx);
        ctx.it_group += 1;
      }
    }
    ctx.keys_vars.erase(&alias, VarNamespace::Iteration);
  }

  if !nested {
    ctx.iteration.clear();
  }
}
