//! Unit tests for the resolution pass.

use rstest::{fixture, rstest};

use super::*;
use crate::options::csharp::LabelPositioning;

fn keys<const N: usize>(entries: [(&str, ConfigValue); N]) -> ConfigKeyMap {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

fn pairs(resolved: &ResolvedContext) -> Vec<(&str, &str)> {
    resolved
        .diagnostics()
        .iter()
        .map(|diagnostic| (diagnostic.property_name(), diagnostic.message()))
        .collect()
}

#[fixture]
fn global() -> GlobalConfig {
    GlobalConfig::default()
}

// ---------------------------------------------------------------------------
// Layout keys
// ---------------------------------------------------------------------------

#[rstest]
fn empty_input_yields_defaults(global: GlobalConfig) {
    let resolved = resolve(&global, ConfigKeyMap::new());
    assert_eq!(resolved.options(), &FormattingOptions::default());
    assert!(resolved.diagnostics().is_empty());
}

#[rstest]
fn global_indent_width_sets_indentation_and_tab_size() {
    let global = GlobalConfig {
        indent_width: Some(4),
        use_tabs: Some(true),
        new_line_kind: Some("lf".into()),
        ..GlobalConfig::default()
    };
    let resolved = resolve(&global, ConfigKeyMap::new());
    for language in Language::ALL {
        let layout = resolved.options().language(language);
        assert_eq!(layout.indentation_size, 4);
        assert_eq!(layout.tab_size, 4);
        assert!(layout.use_tabs);
        assert_eq!(layout.new_line, NewLine::Lf);
    }
}

#[rstest]
fn plugin_keys_override_global_config() {
    let global = GlobalConfig {
        indent_width: Some(4),
        ..GlobalConfig::default()
    };
    let resolved = resolve(&global, keys([("indentWidth", ConfigValue::Int(2))]));
    assert_eq!(
        resolved.options().language(Language::CSharp).indentation_size,
        2
    );
    assert_eq!(
        resolved.options().language(Language::VisualBasic).tab_size,
        2
    );
}

#[rstest]
fn language_prefix_wins_over_unprefixed_key(global: GlobalConfig) {
    let resolved = resolve(
        &global,
        keys([
            ("useTabs", ConfigValue::Bool(false)),
            ("visualBasic.useTabs", ConfigValue::Bool(true)),
            ("csharp.newLineKind", ConfigValue::from("lf")),
        ]),
    );
    let options = resolved.options();
    assert!(options.language(Language::VisualBasic).use_tabs);
    assert!(!options.language(Language::CSharp).use_tabs);
    assert_eq!(options.language(Language::CSharp).new_line, NewLine::Lf);
    assert_eq!(
        options.language(Language::VisualBasic).new_line,
        NewLine::system()
    );
    assert!(resolved.diagnostics().is_empty());
}

#[rstest]
fn unknown_new_line_kind_falls_back_to_crlf() {
    let global = GlobalConfig {
        new_line_kind: Some("cr".into()),
        ..GlobalConfig::default()
    };
    let resolved = resolve(&global, ConfigKeyMap::new());
    assert_eq!(
        resolved.options().language(Language::CSharp).new_line,
        NewLine::CrLf
    );
    assert_eq!(
        pairs(&resolved),
        vec![("newLineKind", "Unknown new line kind: cr")]
    );
}

#[rstest]
fn mistyped_layout_keys_are_diagnosed_and_consumed(global: GlobalConfig) {
    let resolved = resolve(
        &global,
        keys([
            ("indentWidth", ConfigValue::from("wide")),
            ("csharp.indentWidth", ConfigValue::Int(-1)),
        ]),
    );
    assert_eq!(
        pairs(&resolved),
        vec![
            (
                "indentWidth",
                "Property value was expected to be an int, but was a string."
            ),
            (
                "csharp.indentWidth",
                "Value must be between 0 and 64, but was -1."
            ),
        ]
    );
    assert_eq!(
        resolved.options().language(Language::CSharp).indentation_size,
        4
    );
}

#[rstest]
fn oversized_indent_widths_are_rejected() {
    let global = GlobalConfig {
        indent_width: Some(4_000_000_000),
        ..GlobalConfig::default()
    };
    let resolved = resolve(
        &global,
        keys([("visualBasic.indentWidth", ConfigValue::Int(65))]),
    );
    assert_eq!(
        pairs(&resolved),
        vec![
            (
                "indentWidth",
                "Value must be between 0 and 64, but was 4000000000."
            ),
            (
                "visualBasic.indentWidth",
                "Value must be between 0 and 64, but was 65."
            ),
        ]
    );
    for language in Language::ALL {
        assert_eq!(resolved.options().language(language).tab_size, 4);
    }
}

#[rstest]
fn the_widest_indent_is_accepted(global: GlobalConfig) {
    let resolved = resolve(&global, keys([("indentWidth", ConfigValue::Int(64))]));
    assert!(resolved.diagnostics().is_empty());
    assert_eq!(
        resolved.options().language(Language::CSharp).indentation_size,
        MAX_INDENT_WIDTH
    );
}

// ---------------------------------------------------------------------------
// Option table
// ---------------------------------------------------------------------------

#[rstest]
fn table_options_are_applied(global: GlobalConfig) {
    let resolved = resolve(
        &global,
        keys([
            ("csharp.indentBlock", ConfigValue::Bool(false)),
            ("csharp.labelPositioning", ConfigValue::from("noIndent")),
        ]),
    );
    let csharp = resolved.options().csharp_options();
    assert!(!csharp.indent_block);
    assert_eq!(csharp.label_positioning, LabelPositioning::NoIndent);
    assert!(resolved.diagnostics().is_empty());
}

#[rstest]
fn bad_table_input_yields_one_diagnostic_per_key(global: GlobalConfig) {
    let resolved = resolve(
        &global,
        keys([
            ("csharp.indentBlock", ConfigValue::from("asdf")),
            ("csharp.labelPositioning", ConfigValue::from("testing")),
            ("csharp.unknown", ConfigValue::Bool(true)),
        ]),
    );
    assert_eq!(
        pairs(&resolved),
        vec![
            (
                "csharp.indentBlock",
                "Property value was expected to be a bool, but was a string."
            ),
            (
                "csharp.labelPositioning",
                "Could not parse string 'testing' to enum: LabelPositioning. \
                 Expected one of: leftMost, oneLess, noIndent"
            ),
            (
                "csharp.unknown",
                "Could not find C# formatting option named 'unknown'"
            ),
        ]
    );
    assert_eq!(
        resolved.options().csharp_options(),
        &crate::options::csharp::CSharpOptions::default()
    );
}

#[rstest]
fn visual_basic_has_no_option_table(global: GlobalConfig) {
    let resolved = resolve(
        &global,
        keys([("visualBasic.indentBlock", ConfigValue::Bool(true))]),
    );
    assert_eq!(
        pairs(&resolved),
        vec![(
            "visualBasic.indentBlock",
            "Unknown configuration property name."
        )]
    );
}

// ---------------------------------------------------------------------------
// Leftovers
// ---------------------------------------------------------------------------

#[rstest]
fn unknown_property_is_reported_once(global: GlobalConfig) {
    let resolved = resolve(&global, keys([("unknownProp", ConfigValue::Bool(false))]));
    assert_eq!(
        pairs(&resolved),
        vec![("unknownProp", "Unknown configuration property name.")]
    );
}

#[rstest]
fn leftovers_follow_language_diagnostics(global: GlobalConfig) {
    let resolved = resolve(
        &global,
        keys([
            ("aaa", ConfigValue::Int(1)),
            ("csharp.nope", ConfigValue::Int(1)),
        ]),
    );
    let names: Vec<_> = resolved
        .diagnostics()
        .iter()
        .map(ConfigDiagnostic::property_name)
        .collect();
    assert_eq!(names, vec!["csharp.nope", "aaa"]);
}

fn int_accessor() -> OptionAccessor {
    OptionAccessor::Int {
        get: |options| i64::from(options.indent_block),
        set: |options, number| CSharpOptions {
            indent_block: number > 0,
            ..options
        },
    }
}

#[test]
fn int_entries_take_integers() {
    let updated = apply_entry(int_accessor(), CSharpOptions::default(), ConfigValue::Int(0))
        .expect("int value");
    assert!(!updated.indent_block);
}

#[rstest]
#[case(ConfigValue::Bool(true), "Property value was expected to be an int, but was a bool.")]
#[case(ConfigValue::from("2"), "Property value was expected to be an int, but was a string.")]
fn int_entries_reject_other_types(#[case] value: ConfigValue, #[case] expected: &str) {
    assert_eq!(
        apply_entry(int_accessor(), CSharpOptions::default(), value),
        Err(expected.to_owned())
    );
}
