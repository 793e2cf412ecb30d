//! Token kinds and the keyword classifier.
//!
//! The surface keyword strings below are this implementation's choice; the
//! set is whole-token and prefix-free in the sense that matching is always
//! performed on a complete, already-lexed word, never on a partial scan.

use std::collections::HashMap;

use lazy_static::lazy_static;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TokenKind {
  Invalid,
  String,
  Number,

  Comment,
  Eof,
  Escape,
  Filler,
  Join,
  VarInjection,

  IfLess,
  IfLessEq,
  IfMore,
  IfMoreEq,
  IfEq,
  IfEqNot,

  Timestamp,
  ConstPi,
  ConstEuler,
  ConstTrue,
  ConstFalse,

  Sqrt,
  Cbrt,
  Abs,
  Ceil,
  Floor,
  Round,
  Cos,
  Sin,
  Tan,
  Acos,
  Asin,
  Atan,
  Cosh,
  Sinh,
  Ln,
  Log,

  Add,
  Sub,
  Mul,
  Div,
  Mod,
  Pow,
  Max,
  Min,
  Random,

  Limit,
  Interpolate,

  ClRgb,
  ClInterpolate,
  ClRgba,

  VarDeclaration,
  VarAppend,
  VarPrepend,
  VarMerge,
  EnumDeclaration,
  SectionBegin,
  SectionAdd,
  SectionDel,
  Include,
  ForBegin,
  ForEnd,
  Seed,
  Print,
  Restrict,
}

impl TokenKind {
  /// Arity (number of substituted numeral/token operands consumed) of math
  /// and color operators. `None` for kinds that are not fixed-arity
  /// operators.
  pub(crate) fn math_arity(self) -> Option<usize> {
    use TokenKind::*;
    match self {
      Timestamp | ConstPi | ConstEuler | ConstTrue | ConstFalse => Some(0),
      Sqrt | Cbrt | Abs | Ceil | Floor | Round | Cos | Sin | Tan | Acos | Asin | Atan | Cosh
      | Sinh | Ln | Log => Some(1),
      Add | Sub | Mul | Div | Mod | Pow | Max | Min | Random => Some(2),
      Limit | Interpolate => Some(3),
      _ => None,
    }
  }

  pub(crate) fn color_arity(self) -> Option<usize> {
    use TokenKind::*;
    match self {
      ClRgb | ClInterpolate => Some(3),
      ClRgba => Some(4),
      _ => None,
    }
  }

  pub(crate) fn is_comparator(self) -> bool {
    use TokenKind::*;
    matches!(self, IfLess | IfLessEq | IfMore | IfMoreEq | IfEq | IfEqNot)
  }
}

lazy_static! {
  static ref KEYWORDS: HashMap<&'static str, TokenKind> = {
    use TokenKind::*;
    let mut m = HashMap::new();
    m.insert("//", Comment);
    m.insert("EOF", Eof);
    m.insert("\\", Escape);
    m.insert("_", Filler);
    m.insert("&", Join);
    m.insert("$", VarInjection);

    m.insert("?<", IfLess);
    m.insert("?<=", IfLessEq);
    m.insert("?>", IfMore);
    m.insert("?>=", IfMoreEq);
    m.insert("?=", IfEq);
    m.insert("?!=", IfEqNot);

    m.insert("TIME", Timestamp);
    m.insert("PI", ConstPi);
    m.insert("EULER", ConstEuler);
    m.insert("TRUE", ConstTrue);
    m.insert("FALSE", ConstFalse);

    m.insert("SQRT", Sqrt);
    m.insert("CBRT", Cbrt);
    m.insert("ABS", Abs);
    m.insert("CEIL", Ceil);
    m.insert("FLOOR", Floor);
    m.insert("ROUND", Round);
    m.insert("COS", Cos);
    m.insert("SIN", Sin);
    m.insert("TAN", Tan);
    m.insert("ACOS", Acos);
    m.insert("ASIN", Asin);
    m.insert("ATAN", Atan);
    m.insert("COSH", Cosh);
    m.insert("SINH", Sinh);
    m.insert("LN", Ln);
    m.insert("LOG", Log);

    m.insert("+", Add);
    m.insert("-", Sub);
    m.insert("*", Mul);
    m.insert("/", Div);
    m.insert("%", Mod);
    m.insert("^", Pow);
    m.insert("MAX", Max);
    m.insert("MIN", Min);
    m.insert("RAND", Random);

    m.insert("LIMIT", Limit);
    m.insert("LERP", Interpolate);

    m.insert("RGB", ClRgb);
    m.insert("RGB_LERP", ClInterpolate);
    m.insert("RGBA", ClRgba);

    m.insert("LET", VarDeclaration);
    m.insert("APPEND", VarAppend);
    m.insert("PREPEND", VarPrepend);
    m.insert("MERGE", VarMerge);
    m.insert("ENUM", EnumDeclaration);
    m.insert("SECTION", SectionBegin);
    m.insert("SECTION_ADD", SectionAdd);
    m.insert("SECTION_DEL", SectionDel);
    m.insert("INCLUDE", Include);
    m.insert("FOR", ForBegin);
    m.insert("FOR_END", ForEnd);
    m.insert("SEED", Seed);
    m.insert("PRINT", Print);
    m.insert("RESTRICT", Restrict);

    m
  };
}

/// Classifies a raw lexed word. Anything not in the keyword table is a
/// plain `String`; callers upgrade to `Number` themselves once a value is
/// known to have come out of a math/color operator.
pub(crate) fn classify(word: &str) -> TokenKind {
  KEYWORDS.get(word).copied().unwrap_or(TokenKind::String)
}

#[cfg(test)]
mod tests {
  use super::*;

  use pretty_assertions::assert_eq;

  #[test]
  fn classifies_keywords_and_plain_strings() {
    assert_eq!(classify("LET"), TokenKind::VarDeclaration);
    assert_eq!(classify("+"), TokenKind::Add);
    assert_eq!(classify("hello"), TokenKind::String);
    assert_eq!(classify(""), TokenKind::String);
  }

  #[test]
  fn arity_tables_agree_with_keyword_set() {
    assert_eq!(TokenKind::Add.math_arity(), Some(2));
    assert_eq!(TokenKind::ClRgba.color_arity(), Some(4));
    assert_eq!(TokenKind::String.math_arity(), None);
  }
}
