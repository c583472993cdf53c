//! Whitespace layout engine shared by the built-in formatters.
//!
//! Only lines that intersect the requested character range are rewritten.
//! Within a rewritten line the engine:
//!
//! - drops trailing spaces and tabs,
//! - measures the leading indentation in columns (a tab advances to the next
//!   `tab_size` stop) and re-emits it, as one tab per `indentation_size`
//!   level plus spaces when `use_tabs` is set, or as spaces otherwise,
//! - replaces the line terminator with the resolved newline.
//!
//! Everything outside the touched lines is copied through unchanged.

use std::ops::Range;

use dotfmt_config::LanguageOptions;

use super::FormatError;
use crate::cancellation::CancellationToken;

/// Lays out `text`, returning `None` when the result is identical.
///
/// # Errors
///
/// Returns [`FormatError::Cancelled`] if `cancel` is observed before a
/// touched line is rewritten.
pub fn layout(
    text: &str,
    range: Option<&Range<usize>>,
    options: &LanguageOptions,
    cancel: &CancellationToken,
) -> Result<Option<String>, FormatError> {
    let mut output = String::with_capacity(text.len());
    let mut line_start = 0_usize;
    for line in text.split_inclusive('\n') {
        let line_end = line_start + line.chars().count();
        if touches(range, line_start, line_end) {
            if cancel.is_cancelled() {
                return Err(FormatError::Cancelled);
            }
            rewrite_line(line, options, &mut output);
        } else {
            output.push_str(line);
        }
        line_start = line_end;
    }

    Ok((output != text).then_some(output))
}

/// An empty range still selects the line its position falls on.
fn touches(range: Option<&Range<usize>>, line_start: usize, line_end: usize) -> bool {
    range.is_none_or(|selected| {
        let end = selected.end.max(selected.start.saturating_add(1));
        line_start < end && line_end > selected.start
    })
}

fn rewrite_line(line: &str, options: &LanguageOptions, output: &mut String) {
    let (content, terminated) = match line.strip_suffix('\n') {
        Some(body) => (body.strip_suffix('\r').unwrap_or(body), true),
        None => (line, false),
    };
    let trimmed = content.trim_end_matches([' ', '\t']);
    let body = trimmed.trim_start_matches([' ', '\t']);
    if !body.is_empty() {
        let width = indentation_width(trimmed, options.tab_size);
        push_indentation(output, width, options);
        output.push_str(body);
    }
    if terminated {
        output.push_str(options.new_line.as_str());
    }
}

fn indentation_width(line: &str, tab_size: u32) -> u32 {
    let tab_stop = tab_size.max(1);
    line.chars()
        .take_while(|ch| matches!(ch, ' ' | '\t'))
        .fold(0_u32, |width, ch| {
            if ch == '\t' {
                width.saturating_add(tab_stop - width.rem_euclid(tab_stop))
            } else {
                width.saturating_add(1)
            }
        })
}

fn push_indentation(output: &mut String, width: u32, options: &LanguageOptions) {
    if options.use_tabs {
        let level = options.indentation_size.max(1);
        push_repeated(output, '\t', width.div_euclid(level));
        push_repeated(output, ' ', width.rem_euclid(level));
    } else {
        push_repeated(output, ' ', width);
    }
}

fn push_repeated(output: &mut String, ch: char, count: u32) {
    output.extend((0..count).map(|_| ch));
}
