//! Flattened view of resolved options, as reported to the host.
//!
//! The view is driven by declared `(key, getter)` tables rather than by
//! walking the option types, so every reported key is visible here.

use std::collections::BTreeMap;

use crate::options::csharp::{CSHARP_OPTIONS, OptionAccessor};
use crate::options::{FormattingOptions, Language, LanguageOptions};
use crate::value::ConfigValue;

type LayoutGetter = fn(&LanguageOptions) -> ConfigValue;

const LAYOUT_SCHEMA: [(&str, LayoutGetter); 4] = [
    ("indentationSize", |layout| layout.indentation_size.into()),
    ("tabSize", |layout| layout.tab_size.into()),
    ("useTabs", |layout| layout.use_tabs.into()),
    ("newLine", |layout| layout.new_line.as_str().into()),
];

/// Builds the `prefix.key -> value` map for every language.
///
/// ```
/// use dotfmt_config::{ConfigValue, FormattingOptions, NewLine, resolved_config};
///
/// let view = resolved_config(&FormattingOptions::default());
/// assert_eq!(view.get("csharp.tabSize"), Some(&ConfigValue::Int(4)));
/// let system = ConfigValue::from(NewLine::system().as_str());
/// assert_eq!(view.get("visualBasic.newLine"), Some(&system));
/// assert_eq!(view.get("csharp.indentBlock"), Some(&ConfigValue::Bool(true)));
/// ```
#[must_use]
pub fn resolved_config(options: &FormattingOptions) -> BTreeMap<String, ConfigValue> {
    let mut view = BTreeMap::new();
    for language in Language::ALL {
        let prefix = language.key_prefix();
        let layout = options.language(language);
        for (key, getter) in LAYOUT_SCHEMA {
            view.insert(format!("{prefix}{key}"), getter(layout));
        }
    }

    let prefix = Language::CSharp.key_prefix();
    let csharp = options.csharp_options();
    for entry in CSHARP_OPTIONS {
        let value = match entry.accessor {
            OptionAccessor::Bool { get, .. } => ConfigValue::Bool(get(csharp)),
            OptionAccessor::Int { get, .. } => ConfigValue::Int(get(csharp)),
            OptionAccessor::Choice { get, .. } => ConfigValue::from(get(csharp)),
        };
        view.insert(format!("{prefix}{}", entry.name), value);
    }
    view
}
