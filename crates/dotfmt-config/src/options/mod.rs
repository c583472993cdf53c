//! Resolved formatting options.
//!
//! [`FormattingOptions`] is an immutable value. Every `with_*` method
//! consumes the record and returns an updated copy, so a resolution pass is
//! a fold over the configuration inputs.

pub mod csharp;

use self::csharp::CSharpOptions;

/// Line ending written by the formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewLine {
    /// `\n`
    Lf,
    /// `\r\n`
    #[default]
    CrLf,
}

impl NewLine {
    /// Newline of the platform the plugin runs on.
    #[must_use]
    pub const fn system() -> Self {
        if cfg!(windows) { Self::CrLf } else { Self::Lf }
    }

    /// Maps a `newLineKind` setting. `auto` is treated as `crlf`.
    ///
    /// Returns `None` for unrecognised kinds.
    #[must_use]
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "lf" => Some(Self::Lf),
            "crlf" | "auto" => Some(Self::CrLf),
            "system" => Some(Self::system()),
            _ => None,
        }
    }

    /// The literal line terminator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Widest indentation level or tab stop resolution accepts, in columns.
pub const MAX_INDENT_WIDTH: u32 = 64;

/// Layout options every language shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageOptions {
    /// Columns per indentation level.
    pub indentation_size: u32,
    /// Columns a tab character spans.
    pub tab_size: u32,
    /// Indent with tabs instead of spaces.
    pub use_tabs: bool,
    /// Line ending.
    pub new_line: NewLine,
}

impl Default for LanguageOptions {
    fn default() -> Self {
        Self {
            indentation_size: 4,
            tab_size: 4,
            use_tabs: false,
            new_line: NewLine::system(),
        }
    }
}

/// Languages the plugin formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// C#, `.cs` files.
    CSharp,
    /// Visual Basic, `.vb` files.
    VisualBasic,
}

impl Language {
    /// Every supported language, in resolution order.
    pub const ALL: [Self; 2] = [Self::CSharp, Self::VisualBasic];

    /// Prefix of this language's plugin configuration keys.
    #[must_use]
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Self::CSharp => "csharp.",
            Self::VisualBasic => "visualBasic.",
        }
    }

    /// Human-readable language name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::CSharp => "C#",
            Self::VisualBasic => "Visual Basic",
        }
    }
}

/// The complete resolved option set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormattingOptions {
    csharp: LanguageOptions,
    visual_basic: LanguageOptions,
    csharp_options: CSharpOptions,
}

impl FormattingOptions {
    /// Layout options for `language`.
    #[must_use]
    pub const fn language(&self, language: Language) -> &LanguageOptions {
        match language {
            Language::CSharp => &self.csharp,
            Language::VisualBasic => &self.visual_basic,
        }
    }

    /// C#-specific options.
    #[must_use]
    pub const fn csharp_options(&self) -> &CSharpOptions {
        &self.csharp_options
    }

    /// Returns a copy with `language`'s layout options replaced by `update`.
    #[must_use]
    pub fn with_language(
        self,
        language: Language,
        update: impl FnOnce(LanguageOptions) -> LanguageOptions,
    ) -> Self {
        match language {
            Language::CSharp => Self {
                csharp: update(self.csharp),
                ..self
            },
            Language::VisualBasic => Self {
                visual_basic: update(self.visual_basic),
                ..self
            },
        }
    }

    /// Returns a copy with the layout options of every language updated.
    #[must_use]
    pub fn with_all_languages(
        self,
        update: impl Fn(LanguageOptions) -> LanguageOptions,
    ) -> Self {
        Language::ALL
            .into_iter()
            .fold(self, |options, language| options.with_language(language, &update))
    }

    /// Returns a copy with the C#-specific options replaced.
    #[must_use]
    pub const fn with_csharp_options(self, csharp_options: CSharpOptions) -> Self {
        Self {
            csharp_options,
            ..self
        }
    }
}
