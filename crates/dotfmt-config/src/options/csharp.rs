//! C#-specific options and their explicit configuration table.
//!
//! Each option appears exactly once in the `csharp_options!` invocation
//! below, which generates the [`CSharpOptions`] record, its defaults and the
//! [`CSHARP_OPTIONS`] lookup table used by both resolution and the resolved
//! configuration view. Keys are the camelCase option name without the
//! `csharp.` prefix.

use strum::{EnumString, IntoStaticStr, VariantNames};

/// Placement of goto labels relative to the surrounding code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum LabelPositioning {
    /// Flush with the leftmost column.
    LeftMost,
    /// One indentation level less than the current block.
    OneLess,
    /// At the current block's indentation.
    NoIndent,
}

/// Spacing around binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum BinaryOperatorSpacing {
    /// Exactly one space on each side.
    Single,
    /// Leave existing spacing untouched.
    Ignore,
    /// Remove all spacing.
    Remove,
}

/// How a table entry reads and updates its option.
#[derive(Clone, Copy)]
pub enum OptionAccessor {
    /// Boolean option.
    Bool {
        /// Reads the current value.
        get: fn(&CSharpOptions) -> bool,
        /// Returns a copy with the value replaced.
        set: fn(CSharpOptions, bool) -> CSharpOptions,
    },
    /// Integer option.
    Int {
        /// Reads the current value.
        get: fn(&CSharpOptions) -> i64,
        /// Returns a copy with the value replaced.
        set: fn(CSharpOptions, i64) -> CSharpOptions,
    },
    /// Enumerated option configured by name.
    Choice {
        /// Rust type name, used in diagnostics.
        type_name: &'static str,
        /// Accepted names, in camelCase.
        variants: &'static [&'static str],
        /// Reads the current value's name.
        get: fn(&CSharpOptions) -> &'static str,
        /// Parses `raw` case-insensitively and returns an updated copy, or
        /// `None` if no variant matches.
        set: fn(CSharpOptions, &str) -> Option<CSharpOptions>,
    },
}

/// One row of the explicit option table.
#[derive(Clone, Copy)]
pub struct OptionEntry {
    /// Key without the language prefix.
    pub name: &'static str,
    /// Typed accessor pair.
    pub accessor: OptionAccessor,
}

/// Looks up an option by its unprefixed key. Matching is exact.
#[must_use]
pub fn find_option(name: &str) -> Option<&'static OptionEntry> {
    CSHARP_OPTIONS.iter().find(|entry| entry.name == name)
}

macro_rules! csharp_options {
    (
        bools {
            $( $(#[$bool_meta:meta])* $bool_field:ident = $bool_key:literal, $bool_default:literal; )*
        }
        choices {
            $( $(#[$choice_meta:meta])* $choice_field:ident: $choice_ty:ident = $choice_key:literal, $choice_default:expr; )*
        }
    ) => {
        /// C#-specific formatting options.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct CSharpOptions {
            $( $(#[$bool_meta])* pub $bool_field: bool, )*
            $( $(#[$choice_meta])* pub $choice_field: $choice_ty, )*
        }

        impl Default for CSharpOptions {
            fn default() -> Self {
                Self {
                    $( $bool_field: $bool_default, )*
                    $( $choice_field: $choice_default, )*
                }
            }
        }

        /// Every configurable C# option, in resolved-view order.
        pub static CSHARP_OPTIONS: &[OptionEntry] = &[
            $(
                OptionEntry {
                    name: $bool_key,
                    accessor: OptionAccessor::Bool {
                        get: |options| options.$bool_field,
                        set: |options, value| CSharpOptions { $bool_field: value, ..options },
                    },
                },
            )*
            $(
                OptionEntry {
                    name: $choice_key,
                    accessor: OptionAccessor::Choice {
                        type_name: stringify!($choice_ty),
                        variants: <$choice_ty as VariantNames>::VARIANTS,
                        get: |options| options.$choice_field.into(),
                        set: |options, raw| {
                            raw.parse::<$choice_ty>()
                                .ok()
                                .map(|value| CSharpOptions { $choice_field: value, ..options })
                        },
                    },
                },
            )*
        ];
    };
}

csharp_options! {
    bools {
        /// Indent the contents of blocks.
        indent_block = "indentBlock", true;
        /// Indent braces themselves.
        indent_braces = "indentBraces", false;
        /// Indent `case` sections inside `switch`.
        indent_switch_section = "indentSwitchSection", true;
        /// Indent statements under a `case` label.
        indent_switch_case_section = "indentSwitchCaseSection", true;
        /// Indent `case` blocks wrapped in braces.
        indent_switch_case_section_when_block = "indentSwitchCaseSectionWhenBlock", true;
        /// Open brace on a new line for types.
        new_lines_for_braces_in_types = "newLinesForBracesInTypes", true;
        /// Open brace on a new line for methods.
        new_lines_for_braces_in_methods = "newLinesForBracesInMethods", true;
        /// Open brace on a new line for properties.
        new_lines_for_braces_in_properties = "newLinesForBracesInProperties", true;
        /// Open brace on a new line for accessors.
        new_lines_for_braces_in_accessors = "newLinesForBracesInAccessors", true;
        /// Open brace on a new line for anonymous methods.
        new_lines_for_braces_in_anonymous_methods = "newLinesForBracesInAnonymousMethods", true;
        /// Open brace on a new line for control blocks.
        new_lines_for_braces_in_control_blocks = "newLinesForBracesInControlBlocks", true;
        /// Open brace on a new line for anonymous types.
        new_lines_for_braces_in_anonymous_types = "newLinesForBracesInAnonymousTypes", true;
        /// Open brace on a new line for object, collection and array initializers.
        new_lines_for_braces_in_object_collection_array_initializers =
            "newLinesForBracesInObjectCollectionArrayInitializers", true;
        /// Open brace on a new line for lambda bodies.
        new_lines_for_braces_in_lambda_expression_body = "newLinesForBracesInLambdaExpressionBody", true;
        /// `else` on its own line.
        new_line_for_else = "newLineForElse", true;
        /// `catch` on its own line.
        new_line_for_catch = "newLineForCatch", true;
        /// `finally` on its own line.
        new_line_for_finally = "newLineForFinally", true;
        /// Members of object initializers on separate lines.
        new_line_for_members_in_object_init = "newLineForMembersInObjectInit", true;
        /// Members of anonymous types on separate lines.
        new_line_for_members_in_anonymous_types = "newLineForMembersInAnonymousTypes", true;
        /// Query clauses on separate lines.
        new_line_for_clauses_in_query = "newLineForClausesInQuery", true;
        /// Space between a method name and its parameter list.
        spacing_after_method_declaration_name = "spacingAfterMethodDeclarationName", false;
        /// Space between a called method's name and its arguments.
        space_after_method_call_name = "spaceAfterMethodCallName", false;
        /// Space after `if`, `for`, `while` and friends.
        space_after_control_flow_statement_keyword = "spaceAfterControlFlowStatementKeyword", true;
        /// Space inside expression parentheses.
        space_within_expression_parentheses = "spaceWithinExpressionParentheses", false;
        /// Space inside cast parentheses.
        space_within_cast_parentheses = "spaceWithinCastParentheses", false;
        /// Space after a cast.
        space_after_cast = "spaceAfterCast", false;
        /// Space before `[`.
        space_before_open_square_bracket = "spaceBeforeOpenSquareBracket", false;
        /// Space inside square brackets.
        space_within_square_brackets = "spaceWithinSquareBrackets", false;
        /// Space after `:` in base type lists.
        space_after_colon_in_base_type_declaration = "spaceAfterColonInBaseTypeDeclaration", true;
        /// Space before `:` in base type lists.
        space_before_colon_in_base_type_declaration = "spaceBeforeColonInBaseTypeDeclaration", true;
        /// Space after commas.
        space_after_comma = "spaceAfterComma", true;
        /// Space before commas.
        space_before_comma = "spaceBeforeComma", false;
        /// Space after dots.
        space_after_dot = "spaceAfterDot", false;
        /// Space before dots.
        space_before_dot = "spaceBeforeDot", false;
        /// Space after semicolons in `for` headers.
        space_after_semicolons_in_for_statement = "spaceAfterSemicolonsInForStatement", true;
        /// Space before semicolons in `for` headers.
        space_before_semicolons_in_for_statement = "spaceBeforeSemicolonsInForStatement", false;
        /// Keep single-line blocks on one line.
        wrapping_preserve_single_line = "wrappingPreserveSingleLine", true;
        /// Keep several statements on one line when written that way.
        wrapping_keep_statements_on_single_line = "wrappingKeepStatementsOnSingleLine", true;
    }
    choices {
        /// Goto label placement.
        label_positioning: LabelPositioning = "labelPositioning", LabelPositioning::OneLess;
        /// Spacing around binary operators.
        spacing_around_binary_operator: BinaryOperatorSpacing =
            "spacingAroundBinaryOperator", BinaryOperatorSpacing::Single;
    }
}
