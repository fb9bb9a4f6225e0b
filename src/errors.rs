//! Diagnostic types for the reader
//!
//! The reader accumulates diagnostics rather than bailing out with them: each
//! recorded diagnostic keeps the token it was raised against so that line and
//! column information can be recovered later against the original document.
//! Callers see diagnostics as [StructuredError] records or as the formatted
//! message block.
use thiserror::Error;

use crate::lexer::Token;

/// Result type threaded through the individual reader stages
pub type ParserResult<T> = Result<T, ParseFailed>;

/// Marker returned by a reader stage that has recorded a diagnostic and
/// cannot continue. The diagnostic itself lives in the reader's error list.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParseFailed;

/// The different kinds of diagnostic the reader can raise. The rendered
/// message text is part of the crate's reporting contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Details {
    /// A value was required but the current token cannot begin one
    #[error("Syntax error: value, object or array expected.")]
    ValueExpected,
    /// An object member name (or the closing brace) was required
    #[error("Missing '}}' or object member name")]
    MemberNameExpected,
    /// The separator between a member name and its value was required
    #[error("Missing ':' after object member name")]
    MemberSeparatorExpected,
    /// An object ran off the end without a comma or closing brace
    #[error("Missing ',' or '}}' in object declaration")]
    UnterminatedObject,
    /// An array ran off the end without a comma or closing bracket
    #[error("Missing ',' or ']' in array declaration")]
    UnterminatedArray,
    /// Strict mode requires a container at the document root
    #[error("A valid JSON document must be either an array or an object value.")]
    InvalidRoot,
    /// A string escape was malformed
    #[error("Bad escape sequence in string")]
    BadEscapeSequence,
    /// A UTF-16 surrogate appeared without its partner
    #[error("Misplaced UTF-16 surrogate")]
    MisplacedSurrogate,
    /// A numeric token failed the double conversion
    #[error("'{0}' is not a number.")]
    InvalidNumber(String),
    /// A caller-supplied message pushed against an already-parsed value
    #[error("{0}")]
    Custom(String),
}

/// A single recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ErrorInfo {
    /// The token the diagnostic was raised against
    pub token: Token,
    /// What went wrong
    pub details: Details,
    /// Optional secondary byte offset, pointing at the offending detail
    /// inside the token (used by the string decoder)
    pub extra: Option<usize>,
}

/// Offset-addressed rendition of a diagnostic, suitable for reporting against
/// an already-parsed tree without access to the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredError {
    /// Byte offset of the first offending byte
    pub offset_start: usize,
    /// Byte offset one past the last offending byte
    pub offset_limit: usize,
    /// The rendered diagnostic message
    pub message: String,
}

/// The formatted diagnostic block produced when a string conversion fails
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SyntaxError(pub String);

#[cfg(test)]
mod tests {
    use crate::errors::Details;

    #[test]
    fn should_render_the_contracted_message_text() {
        assert_eq!(
            Details::ValueExpected.to_string(),
            "Syntax error: value, object or array expected."
        );
        assert_eq!(
            Details::MemberNameExpected.to_string(),
            "Missing '}' or object member name"
        );
        assert_eq!(
            Details::MemberSeparatorExpected.to_string(),
            "Missing ':' after object member name"
        );
        assert_eq!(
            Details::UnterminatedObject.to_string(),
            "Missing ',' or '}' in object declaration"
        );
        assert_eq!(
            Details::UnterminatedArray.to_string(),
            "Missing ',' or ']' in array declaration"
        );
        assert_eq!(
            Details::InvalidRoot.to_string(),
            "A valid JSON document must be either an array or an object value."
        );
        assert_eq!(
            Details::InvalidNumber("1e+".to_string()).to_string(),
            "'1e+' is not a number."
        );
    }
}
