//! Formatting configuration for `dotfmt-plugin`.
//!
//! The host registers configuration under an opaque [`ConfigHandle`]: a
//! [`GlobalConfig`] shared by every plugin and a plugin-specific
//! [`ConfigKeyMap`]. Resolution merges the two, plus any per-request
//! overrides, into an immutable [`FormattingOptions`] record and a list of
//! [`ConfigDiagnostic`]s for everything that could not be applied.
//!
//! Resolution order, later steps winning:
//!
//! 1. built-in defaults;
//! 2. the global configuration, applied to every language;
//! 3. unprefixed `indentWidth`, `useTabs` and `newLineKind` plugin keys;
//! 4. the same keys under a language prefix (`csharp.`, `visualBasic.`),
//!    followed by the language's explicit option table;
//! 5. anything left over is reported as an unknown property.
//!
//! The [`ConfigStore`] memoizes the no-override result per handle.

mod error;
pub mod options;
pub mod resolve;
pub mod store;
mod value;
pub mod view;

pub use self::error::ConfigError;
pub use self::options::{
    FormattingOptions, Language, LanguageOptions, MAX_INDENT_WIDTH, NewLine,
    csharp::{BinaryOperatorSpacing, CSharpOptions, LabelPositioning},
};
pub use self::resolve::{ConfigDiagnostic, ResolvedContext, resolve};
pub use self::store::ConfigStore;
pub use self::value::{ConfigHandle, ConfigKeyMap, ConfigValue, GlobalConfig, parse_key_map};
pub use self::view::resolved_config;
