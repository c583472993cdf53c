//! Formatter selection and the language engine boundary.
//!
//! A [`CodeFormatter`] receives the decoded text, an optional character range
//! and the resolved options, and returns either new text or `None` when
//! nothing changed. The built-in formatters delegate to the whitespace
//! [`layout`] engine.

pub mod layout;

use std::any::Any;
use std::ops::Range;
use std::sync::Arc;

use dotfmt_config::{FormattingOptions, Language};
use thiserror::Error;

use crate::cancellation::CancellationToken;

/// Errors raised while selecting a formatter or formatting text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// No registered formatter handles the path's extension.
    #[error("Could not find formatter for file path: {path}")]
    NoFormatter {
        /// The path that was looked up.
        path: String,
    },

    /// The byte range is reversed, out of bounds or splits a character.
    #[error("invalid byte range {start}..{end} for text of {len} bytes")]
    InvalidRange {
        /// Requested start byte.
        start: u32,
        /// Requested end byte.
        end: u32,
        /// Length of the text in bytes.
        len: usize,
    },

    /// The cancel token was observed before formatting finished.
    #[error("formatting was cancelled")]
    Cancelled,

    /// The engine panicked while formatting.
    #[error("formatter panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl FormatError {
    /// Converts a caught panic payload into an error.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|text| (*text).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Self::Panicked { message }
    }
}

/// Input to a single formatting call.
#[derive(Debug, Clone)]
pub struct FormatRequest<'a> {
    /// Full file text.
    pub text: &'a str,
    /// Character range to format, or `None` for the whole document.
    pub range: Option<Range<usize>>,
    /// Resolved options for the request.
    pub options: &'a FormattingOptions,
    /// Cooperative cancellation flag.
    pub cancel: &'a CancellationToken,
}

/// A language engine.
pub trait CodeFormatter: Send + Sync {
    /// Language this formatter handles.
    fn language(&self) -> Language;

    /// File extensions, without the leading dot.
    fn file_extensions(&self) -> &'static [&'static str];

    /// Formats `request.text`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Cancelled`] when the token is cancelled
    /// mid-run, or any engine failure.
    fn format(&self, request: &FormatRequest<'_>) -> Result<Option<String>, FormatError>;
}

/// Built-in formatter backed by the whitespace layout engine.
#[derive(Debug, Clone, Copy)]
pub struct LayoutFormatter {
    language: Language,
    extensions: &'static [&'static str],
}

impl LayoutFormatter {
    /// C# formatter for `.cs` files.
    #[must_use]
    pub const fn csharp() -> Self {
        Self {
            language: Language::CSharp,
            extensions: &["cs"],
        }
    }

    /// Visual Basic formatter for `.vb` files.
    #[must_use]
    pub const fn visual_basic() -> Self {
        Self {
            language: Language::VisualBasic,
            extensions: &["vb"],
        }
    }
}

impl CodeFormatter for LayoutFormatter {
    fn language(&self) -> Language {
        self.language
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    fn format(&self, request: &FormatRequest<'_>) -> Result<Option<String>, FormatError> {
        layout::layout(
            request.text,
            request.range.as_ref(),
            request.options.language(self.language),
            request.cancel,
        )
    }
}

/// Ordered set of formatters; the first whose extension matches wins.
#[derive(Clone)]
pub struct FormatterRegistry {
    formatters: Vec<Arc<dyn CodeFormatter>>,
}

impl FormatterRegistry {
    /// Creates a registry from `formatters`, in priority order.
    #[must_use]
    pub fn new(formatters: Vec<Arc<dyn CodeFormatter>>) -> Self {
        Self { formatters }
    }

    /// The C# and Visual Basic layout formatters.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            Arc::new(LayoutFormatter::csharp()),
            Arc::new(LayoutFormatter::visual_basic()),
        ])
    }

    /// Selects the formatter for `path` by case-insensitive extension.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::NoFormatter`] when nothing matches.
    pub fn select(&self, path: &str) -> Result<Arc<dyn CodeFormatter>, FormatError> {
        let lowered = path.to_ascii_lowercase();
        self.formatters
            .iter()
            .find(|formatter| {
                formatter.file_extensions().iter().any(|extension| {
                    lowered
                        .strip_suffix(extension)
                        .is_some_and(|stem| stem.ends_with('.'))
                })
            })
            .cloned()
            .ok_or_else(|| FormatError::NoFormatter {
                path: path.to_owned(),
            })
    }

    /// Every extension any formatter handles, in registry order.
    #[must_use]
    pub fn file_extensions(&self) -> Vec<&'static str> {
        self.formatters
            .iter()
            .flat_map(|formatter| formatter.file_extensions().iter().copied())
            .collect()
    }
}

/// Converts a peer-supplied byte range into a character range.
///
/// A range covering the whole text becomes `None`.
///
/// # Errors
///
/// Returns [`FormatError::InvalidRange`] if `start > end`, `end` is past the
/// end of the text, or either offset splits a UTF-8 sequence.
pub fn byte_range_to_char_range(
    text: &str,
    start: u32,
    end: u32,
) -> Result<Option<Range<usize>>, FormatError> {
    let invalid = || FormatError::InvalidRange {
        start,
        end,
        len: text.len(),
    };
    let start_byte = usize::try_from(start).map_err(|_| invalid())?;
    let end_byte = usize::try_from(end).map_err(|_| invalid())?;
    if start_byte > end_byte {
        return Err(invalid());
    }
    if start_byte == 0 && end_byte == text.len() {
        return Ok(None);
    }

    let before_start = text.get(..start_byte).ok_or_else(invalid)?;
    let selected = text.get(start_byte..end_byte).ok_or_else(invalid)?;
    let start_char = before_start.chars().count();
    Ok(Some(start_char..start_char + selected.chars().count()))
}
