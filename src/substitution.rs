//! The recursive, depth-guarded expander behind every substituted token
//! read. This is the core described by the specification's "substitution
//! engine": math, color, conditionals, variable injection, string join,
//! escape, filler, comment, and EOF all live here.

use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;

use crate::color;
use crate::context::{Context, VarNamespace};
use crate::token::{classify, TokenKind};
use crate::util;

/// The result of substituting one token: its classified kind, its textual
/// form (always populated, even for numbers — formatted with 8 fractional
/// digits, matching the source corpus), and, for numeric/color results, the
/// numeral itself so callers don't have to re-parse the text.
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
  pub(crate) kind: TokenKind,
  pub(crate) text: String,
  pub(crate) number: Option<f64>,
}

impl Resolved {
  fn string(text: impl Into<String>) -> Self {
    Self {
      kind: TokenKind::String,
      text: text.into(),
      number: None,
    }
  }

  fn kind_passthrough(kind: TokenKind, text: String) -> Self {
    Self {
      kind,
      text,
      number: None,
    }
  }

  fn number(value: f64) -> Self {
    Self {
      kind: TokenKind::Number,
      text: format!("{value:.8}"),
      number: Some(value),
    }
  }

  fn packed_color(argb: u32) -> Self {
    Self {
      kind: TokenKind::Number,
      text: argb.to_string(),
      number: Some(argb as f64),
    }
  }
}

impl Context<'_> {
  /// Lexes (or replays) one raw token and substitutes it.
  pub(crate) fn get_token(&mut self) -> Option<Resolved> {
    let raw = self.get_token_raw()?;
    self.substitute(raw)
  }

  /// Reads a token and coerces it to a numeral: already-numeric results
  /// pass through, plain strings are parsed as decimals, and `#`-prefixed
  /// strings are parsed as hex colors.
  pub(crate) fn get_token_numeral(&mut self) -> Option<f64> {
    let resolved = self.get_token()?;
    match resolved.kind {
      TokenKind::Number => resolved.number,
      TokenKind::String => {
        if let Some(hex) = resolved.text.strip_prefix('#') {
          color::from_hex(&format!("#{hex}")).map(|argb| argb as f64)
        } else {
          resolved.text.trim().parse::<f64>().ok()
        }
      }
      _ => None,
    }
  }

  fn substitute(&mut self, raw: String) -> Option<Resolved> {
    if self.depth >= self.limits.max_depth {
      warn!("substitution depth guard tripped, discarding token `{raw}`");
      return None;
    }
    self.depth += 1;
    let kind = classify(&raw);
    let result = self.apply(kind, raw);
    self.depth -= 1;
    result
  }

  fn apply(&mut self, kind: TokenKind, raw: String) -> Option<Resolved> {
    use TokenKind::*;
    match kind {
      Comment => None,
      Eof => {
        self.mark_eof();
        None
      }
      Escape => {
        self.clear_eol();
        let next = self.get_token_raw()?;
        Some(Resolved::string(next))
      }
      Filler => self.get_token(),
      Join => self.join(),
      VarInjection => self.inject_variable(),
      _ if kind.is_comparator() => self.if_compare(kind),
      _ if kind.math_arity().is_some() => self.math(kind),
      _ if kind.color_arity().is_some() => self.math_color(kind),
      other => Some(Resolved::kind_passthrough(other, raw)),
    }
  }

  fn join(&mut self) -> Option<Resolved> {
    let first = self.get_token()?;
    let second = self.get_token()?;
    let mut text = first.text;
    text.push_str(&second.text);
    text.truncate(self.limits.token_capacity.saturating_sub(1));
    Some(Resolved::string(text))
  }

  /// Looks a name up under `VARIABLE` first, then `ITERATION` (the current
  /// value bound by an enclosing `FOR`), then `PARAMETER` (a value pushed
  /// from outside the source), and replays whichever group is found.
  fn inject_variable(&mut self) -> Option<Resolved> {
    let name = self.get_token()?;
    let group = self
      .keys_vars
      .find(&name.text, VarNamespace::Variable)
      .or_else(|| self.keys_vars.find(&name.text, VarNamespace::Iteration))
      .or_else(|| self.keys_vars.find(&name.text, VarNamespace::Parameter))?;
    self.reset_var_iterator(group);
    self.get_token()
  }

  fn if_compare(&mut self, kind: TokenKind) -> Option<Resolved> {
    use TokenKind::*;
    let a = self.get_token_numeral()?;
    let b = self.get_token_numeral()?;
    let holds = match kind {
      IfLess => a < b,
      IfLessEq => a <= b,
      IfMore => a > b,
      IfMoreEq => a >= b,
      IfEq => a == b,
      IfEqNot => a != b,
      _ => unreachable!("if_compare called with non-comparator kind"),
    };
    // Both branches are always read, in source order, so that the token
    // stream stays in sync regardless of which side wins.
    let on_true = self.get_token();
    let on_false = self.get_token();
    if holds {
      on_true
    } else {
      on_false
    }
  }

  fn math(&mut self, kind: TokenKind) -> Option<Resolved> {
    use TokenKind::*;
    let arity = kind.math_arity().expect("math() called with non-math kind");
    let mut d = [0.0_f64; 3];
    for slot in d.iter_mut().take(arity) {
      *slot = self.get_token_numeral()?;
    }

    let result = match kind {
      Timestamp => SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0),
      ConstPi => std::f64::consts::PI,
      ConstEuler => 0.5772156649015328,
      ConstTrue => 1.0,
      ConstFalse => 0.0,

      Sqrt => d[0].sqrt(),
      Cbrt => d[0].cbrt(),
      Abs => d[0].abs(),
      Ceil => d[0].ceil(),
      Floor => d[0].floor(),
      Round => d[0].round(),
      Cos => d[0].cos(),
      Sin => d[0].sin(),
      Tan => d[0].tan(),
      Acos => d[0].acos(),
      Asin => d[0].asin(),
      Atan => d[0].atan(),
      Cosh => d[0].cosh(),
      Sinh => d[0].sinh(),
      Ln => d[0].ln(),
      Log => d[0].log10(),

      Add => d[0] + d[1],
      Sub => d[0] - d[1],
      Mul => d[0] * d[1],
      Div => d[0] / d[1],
      Mod => d[0] % d[1],
      Pow => d[0].powf(d[1]),
      Max => d[0].max(d[1]),
      Min => d[0].min(d[1]),
      Random => self.rng.get(d[0], d[1]),

      Limit => util::limit(d[0], d[1], d[2]),
      Interpolate => util::interpolate(d[0], d[1], d[2]),

      _ => return None,
    };

    Some(Resolved::number(result))
  }

  fn math_color(&mut self, kind: TokenKind) -> Option<Resolved> {
    use TokenKind::*;
    let arity = kind
      .color_arity()
      .expect("math_color() called with non-color kind");
    let mut d = [0.0_f64; 4];
    for slot in d.iter_mut().take(arity) {
      *slot = self.get_token_numeral()?;
    }

    let argb = match kind {
      ClRgb => color::pack_argb(d[0], d[1], d[2], 255.0),
      ClRgba => color::pack_argb(d[0], d[1], d[2], d[3]),
      ClInterpolate => color::interpolate(d[0] as u32, d[1] as u32, d[2]),
      _ => return None,
    };

    Some(Resolved::packed_color(argb))
  }
}
