//! End-to-end scenarios against the public `Config` surface.

use ccfg::Config;
use pretty_assertions::assert_eq;

fn values(config: &mut Config, namespace: &str, property: &str) -> Vec<String> {
  config.fetch(namespace, property);
  let mut out = Vec::new();
  while config.iterate() {
    out.push(config.resource().to_owned());
  }
  out
}

#[test]
fn basic_resource_declaration() {
  let mut config = Config::new();
  config.load_internal("myns prop alpha beta\n");
  assert_eq!(values(&mut config, "myns", "prop"), vec!["alpha", "beta"]);
}

#[test]
fn variable_injection_replays_the_whole_group() {
  let mut config = Config::new();
  config.load_internal("LET colors red green blue\nui accent $ colors\n");
  assert_eq!(
    values(&mut config, "ui", "accent"),
    vec!["red", "green", "blue"]
  );
}

#[test]
fn prefix_math() {
  let mut config = Config::new();
  config.load_internal("sizes big + 10 5\n");
  assert_eq!(values(&mut config, "sizes", "big"), vec!["15.00000000"]);
}

#[test]
fn enum_with_three_parameters() {
  let mut config = Config::new();
  config.load_internal("ENUM step 0 10 5\nsteps all $ step\n");
  // `step` has six values (0,2,4,6,8,10); injecting it replays the whole
  // group into the resource the same way a plain LET variable would.
  assert_eq!(
    values(&mut config, "steps", "all"),
    vec!["0", "2", "4", "6", "8", "10"]
  );
}

#[test]
fn enum_with_a_non_decimal_numeral_is_silently_skipped() {
  // A non-decimal numeral anywhere in the parameter list must not panic,
  // and parsing must continue normally afterwards.
  let mut config = Config::new();
  config.load_internal("ENUM broken foo 10\nENUM also_broken 0 foo 5\nplain n 1\n");
  assert_eq!(values(&mut config, "plain", "n"), vec!["1"]);
}

#[test]
fn for_iterate_over_a_variable() {
  let mut config = Config::new();
  config.load_internal("LET widgets label button\nFOR widgets w\n$ w border 1\nFOR_END\n");
  assert_eq!(values(&mut config, "label", "border"), vec!["1"]);
  assert_eq!(values(&mut config, "button", "border"), vec!["1"]);
}

#[test]
fn section_skip() {
  let mut config = Config::new();
  config.load_internal(
    "SECTION_ADD light\nSECTION dark\nbg color #000\nSECTION light\nbg color #fff\n",
  );
  assert_eq!(values(&mut config, "bg", "color"), vec!["#fff"]);
}

#[test]
fn nested_for_loops() {
  let mut config = Config::new();
  config.load_internal(
    "LET rows a b\nLET cols x y\nFOR rows r\nFOR cols c\ncell value $ r\nFOR_END\nFOR_END\n",
  );
  // Each outer pass re-declares (cell, value); only the last inner pass of
  // the last outer pass survives in the dictionary.
  assert_eq!(values(&mut config, "cell", "value"), vec!["b"]);
}

#[test]
fn include_relative_to_including_file() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(dir.path().join("child.cfg"), "child prop value\n").unwrap();
  std::fs::write(dir.path().join("root.cfg"), "INCLUDE child.cfg\n").unwrap();

  let mut config = Config::new();
  config.push_source(dir.path().join("root.cfg"));
  config.load();
  assert_eq!(values(&mut config, "child", "prop"), vec!["value"]);
}

#[test]
fn include_cycle_is_skipped_without_hanging() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(dir.path().join("a.cfg"), "INCLUDE b.cfg\nfrom a 1\n").unwrap();
  std::fs::write(dir.path().join("b.cfg"), "INCLUDE a.cfg\nfrom b 1\n").unwrap();

  let mut config = Config::new();
  config.push_source(dir.path().join("a.cfg"));
  config.load();
  assert_eq!(values(&mut config, "from", "a"), vec!["1"]);
  assert_eq!(values(&mut config, "from", "b"), vec!["1"]);
}

#[test]
fn parameters_are_injectable_variables() {
  let mut config = Config::new();
  config.push_parameter_long("count", 3);
  config.push_parameter_str("label", "widget");
  config.load_internal("item total $ count\nitem name $ label\n");
  assert_eq!(values(&mut config, "item", "total"), vec!["3"]);
  assert_eq!(values(&mut config, "item", "name"), vec!["widget"]);
}

#[test]
fn append_and_prepend_combine_every_value() {
  let mut config = Config::new();
  config.load_internal(
    "LET names foo bar\nAPPEND upper names _suffix\nPREPEND lower names prefix_\nout a $ upper\nout b $ lower\n",
  );
  assert_eq!(
    values(&mut config, "out", "a"),
    vec!["foo_suffix", "bar_suffix"]
  );
  assert_eq!(
    values(&mut config, "out", "b"),
    vec!["prefix_foo", "prefix_bar"]
  );
}

#[test]
fn merge_pairs_two_variables_element_wise() {
  let mut config = Config::new();
  config.load_internal("LET a 1 2 3\nLET b x y z\nMERGE ab a b\nout all $ ab\n");
  assert_eq!(values(&mut config, "out", "all"), vec!["1x", "2y", "3z"]);
}

#[test]
fn merge_with_missing_second_variable_is_silently_skipped() {
  let mut config = Config::new();
  config.load_internal("LET a 1 2 3\nMERGE ab a missing\nout all $ ab\n");
  assert!(values(&mut config, "out", "all").is_empty());
}

#[test]
fn restrict_blocks_declarations_not_resources() {
  let mut config = Config::new();
  config.load_internal("RESTRICT\nLET x 1\nwidget n $ x\nplain n 2\n");
  assert!(values(&mut config, "widget", "n").is_empty());
  assert_eq!(values(&mut config, "plain", "n"), vec!["2"]);
}

#[test]
fn can_open_sources_reflects_reality() {
  let dir = tempfile::tempdir().unwrap();
  let real = dir.path().join("real.cfg");
  std::fs::write(&real, "a b c\n").unwrap();

  let mut config = Config::new();
  config.push_source(dir.path().join("missing.cfg"));
  config.push_source(&real);
  assert_eq!(config.can_open_sources(), Some(1));
}

#[test]
fn placeholder_short_circuits_everything() {
  let mut config = Config::placeholder();
  config.load_internal("a b c\n");
  assert_eq!(values(&mut config, "a", "b"), Vec::<String>::new());
  assert_eq!(config.error(), ccfg::ErrorKind::Invalid);
}
