//! The configuration resolution pass.
//!
//! A pass owns a copy of the plugin key map and removes each key as it is
//! handled, so whatever remains at the end is unknown. Problems are recorded
//! as [`ConfigDiagnostic`]s and never abort the pass.

use serde::Serialize;
use tracing::debug;

use crate::options::csharp::{CSharpOptions, OptionAccessor, find_option};
use crate::options::{FormattingOptions, Language, LanguageOptions, MAX_INDENT_WIDTH, NewLine};
use crate::value::{ConfigKeyMap, ConfigValue, GlobalConfig};

const RESOLVE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::resolve");

/// A configuration property that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDiagnostic {
    property_name: String,
    message: String,
}

impl ConfigDiagnostic {
    /// Creates a diagnostic for `property_name`.
    #[must_use]
    pub fn new(property_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            message: message.into(),
        }
    }

    /// The offending property name, including any language prefix.
    #[must_use]
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// Human-readable explanation.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Output of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    options: FormattingOptions,
    diagnostics: Vec<ConfigDiagnostic>,
}

impl ResolvedContext {
    /// The resolved options.
    #[must_use]
    pub const fn options(&self) -> &FormattingOptions {
        &self.options
    }

    /// Diagnostics in the order they were raised.
    #[must_use]
    pub fn diagnostics(&self) -> &[ConfigDiagnostic] {
        &self.diagnostics
    }
}

/// Mutable state of a single pass.
struct ResolutionContext {
    remaining: ConfigKeyMap,
    diagnostics: Vec<ConfigDiagnostic>,
}

impl ResolutionContext {
    const fn new(remaining: ConfigKeyMap) -> Self {
        Self {
            remaining,
            diagnostics: Vec::new(),
        }
    }

    fn add_diagnostic(&mut self, property_name: &str, message: impl Into<String>) {
        self.diagnostics
            .push(ConfigDiagnostic::new(property_name, message));
    }

    fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.remaining.remove(key)
    }

    fn remove_bool(&mut self, key: &str) -> Option<bool> {
        match self.remove(key)? {
            ConfigValue::Bool(value) => Some(value),
            other => {
                self.add_diagnostic(key, type_mismatch("bool", &other));
                None
            }
        }
    }

    fn remove_indent_width(&mut self, key: &str) -> Option<u32> {
        match self.remove(key)? {
            ConfigValue::Int(value) => self.indent_width(key, value),
            other => {
                self.add_diagnostic(key, type_mismatch("int", &other));
                None
            }
        }
    }

    fn indent_width(&mut self, key: &str, value: impl Into<i64>) -> Option<u32> {
        let raw = value.into();
        let width = u32::try_from(raw)
            .ok()
            .filter(|width| *width <= MAX_INDENT_WIDTH);
        if width.is_none() {
            self.add_diagnostic(
                key,
                format!("Value must be between 0 and {MAX_INDENT_WIDTH}, but was {raw}."),
            );
        }
        width
    }

    fn remove_string(&mut self, key: &str) -> Option<String> {
        match self.remove(key)? {
            ConfigValue::String(value) => Some(value),
            other => {
                self.add_diagnostic(key, type_mismatch("string", &other));
                None
            }
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.remaining
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn new_line(&mut self, property_name: &str, kind: &str) -> NewLine {
        NewLine::from_kind(kind).unwrap_or_else(|| {
            self.add_diagnostic(property_name, format!("Unknown new line kind: {kind}"));
            NewLine::CrLf
        })
    }

    fn finish(mut self, options: FormattingOptions) -> ResolvedContext {
        let leftovers = std::mem::take(&mut self.remaining);
        for key in leftovers.keys() {
            self.add_diagnostic(key, "Unknown configuration property name.");
        }
        ResolvedContext {
            options,
            diagnostics: self.diagnostics,
        }
    }
}

fn type_mismatch(expected: &str, value: &ConfigValue) -> String {
    let found = value.type_name();
    format!(
        "Property value was expected to be {} {expected}, but was {} {found}.",
        article(expected),
        article(found)
    )
}

fn article(noun: &str) -> &'static str {
    if noun.starts_with(['a', 'e', 'i', 'o', 'u']) {
        "an"
    } else {
        "a"
    }
}

/// Runs a full resolution pass over `global` and `plugin`.
///
/// `plugin` should already include any per-request overrides.
///
/// # Examples
///
/// ```
/// use dotfmt_config::{ConfigKeyMap, ConfigValue, GlobalConfig, Language, resolve};
///
/// let global = GlobalConfig { indent_width: Some(2), ..GlobalConfig::default() };
/// let mut plugin = ConfigKeyMap::new();
/// plugin.insert("csharp.useTabs".into(), ConfigValue::Bool(true));
///
/// let resolved = resolve(&global, plugin);
/// let csharp = resolved.options().language(Language::CSharp);
/// assert_eq!(csharp.indentation_size, 2);
/// assert!(csharp.use_tabs);
/// assert!(resolved.diagnostics().is_empty());
/// ```
#[must_use]
pub fn resolve(global: &GlobalConfig, plugin: ConfigKeyMap) -> ResolvedContext {
    let mut context = ResolutionContext::new(plugin);

    let mut options = apply_global_config(FormattingOptions::default(), global, &mut context);
    options = apply_layout_keys(options, &mut context, "", &Language::ALL);
    for language in Language::ALL {
        options = apply_layout_keys(options, &mut context, language.key_prefix(), &[language]);
        options = apply_option_table(options, &mut context, language);
    }

    let resolved = context.finish(options);
    debug!(
        target: RESOLVE_TARGET,
        diagnostics = resolved.diagnostics.len(),
        "resolved formatting options"
    );
    resolved
}

fn apply_global_config(
    options: FormattingOptions,
    global: &GlobalConfig,
    context: &mut ResolutionContext,
) -> FormattingOptions {
    let new_line = global
        .new_line_kind
        .as_deref()
        .map(|kind| context.new_line("newLineKind", kind));
    let indent_width = global
        .indent_width
        .and_then(|width| context.indent_width("indentWidth", width));

    options.with_all_languages(|layout| LanguageOptions {
        indentation_size: indent_width.unwrap_or(layout.indentation_size),
        tab_size: indent_width.unwrap_or(layout.tab_size),
        use_tabs: global.use_tabs.unwrap_or(layout.use_tabs),
        new_line: new_line.unwrap_or(layout.new_line),
    })
}

/// Applies `indentWidth`, `useTabs` and `newLineKind` under `prefix` to each
/// of `languages`.
fn apply_layout_keys(
    options: FormattingOptions,
    context: &mut ResolutionContext,
    prefix: &str,
    languages: &[Language],
) -> FormattingOptions {
    let indent_width = context.remove_indent_width(&format!("{prefix}indentWidth"));
    let use_tabs = context.remove_bool(&format!("{prefix}useTabs"));
    let new_line_key = format!("{prefix}newLineKind");
    let new_line = context
        .remove_string(&new_line_key)
        .map(|kind| context.new_line(&new_line_key, &kind));

    languages.iter().fold(options, |current, &language| {
        current.with_language(language, |layout| LanguageOptions {
            indentation_size: indent_width.unwrap_or(layout.indentation_size),
            tab_size: indent_width.unwrap_or(layout.tab_size),
            use_tabs: use_tabs.unwrap_or(layout.use_tabs),
            new_line: new_line.unwrap_or(layout.new_line),
        })
    })
}

fn apply_option_table(
    options: FormattingOptions,
    context: &mut ResolutionContext,
    language: Language,
) -> FormattingOptions {
    match language {
        Language::CSharp => apply_csharp_table(options, context),
        // Visual Basic has no language-specific options; its leftover keys
        // are reported as unknown properties.
        Language::VisualBasic => options,
    }
}

fn apply_csharp_table(
    options: FormattingOptions,
    context: &mut ResolutionContext,
) -> FormattingOptions {
    let prefix = Language::CSharp.key_prefix();
    let mut csharp = *options.csharp_options();

    for key in context.keys_with_prefix(prefix) {
        let Some(value) = context.remove(&key) else {
            continue;
        };
        let name = key.strip_prefix(prefix).unwrap_or(&key);
        let Some(entry) = find_option(name) else {
            context.add_diagnostic(
                &key,
                format!(
                    "Could not find {} formatting option named '{name}'",
                    Language::CSharp.display_name()
                ),
            );
            continue;
        };

        match apply_entry(entry.accessor, csharp, value) {
            Ok(updated) => csharp = updated,
            Err(message) => context.add_diagnostic(&key, message),
        }
    }

    options.with_csharp_options(csharp)
}

/// Applies one table value, or explains why it does not fit the option.
fn apply_entry(
    accessor: OptionAccessor,
    csharp: CSharpOptions,
    value: ConfigValue,
) -> Result<CSharpOptions, String> {
    match (accessor, value) {
        (OptionAccessor::Bool { set, .. }, ConfigValue::Bool(flag)) => Ok(set(csharp, flag)),
        (OptionAccessor::Int { set, .. }, ConfigValue::Int(number)) => Ok(set(csharp, number)),
        (
            OptionAccessor::Choice {
                type_name,
                variants,
                set,
                ..
            },
            ConfigValue::String(raw),
        ) => set(csharp, &raw).ok_or_else(|| {
            format!(
                "Could not parse string '{raw}' to enum: {type_name}. Expected one of: {}",
                variants.join(", ")
            )
        }),
        (OptionAccessor::Bool { .. }, other) => Err(type_mismatch("bool", &other)),
        (OptionAccessor::Int { .. }, other) => Err(type_mismatch("int", &other)),
        (OptionAccessor::Choice { .. }, other) => Err(type_mismatch("string", &other)),
    }
}

#[cfg(test)]
mod tests;
