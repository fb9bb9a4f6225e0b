//! Dialect switches for the reader
//!
//! The reader understands a permissive superset of RFC 8259; each extension
//! can be toggled independently. [Features::all] is the lenient preset and
//! the default; [Features::strict_mode] turns every extension off and
//! additionally requires a container at the document root.

/// The four independent dialect switches
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Features {
    /// Lex `//` and `/* */` comments; when off, a comment is a syntax error
    pub allow_comments: bool,
    /// Require the root value to be an array or an object
    pub strict_root: bool,
    /// Treat dropped values between separators (`[1,,2]`) and trailing
    /// separators as implicit nulls
    pub allow_dropped_null: bool,
    /// Accept numbers as object member names, stringified on decode
    pub allow_numeric_keys: bool,
}

impl Features {
    /// The lenient preset: every extension enabled, any root value accepted
    pub fn all() -> Self {
        Features {
            allow_comments: true,
            strict_root: false,
            allow_dropped_null: true,
            allow_numeric_keys: true,
        }
    }

    /// The strict preset: extensions disabled, container root required
    pub fn strict_mode() -> Self {
        Features {
            allow_comments: false,
            strict_root: true,
            allow_dropped_null: false,
            allow_numeric_keys: false,
        }
    }
}

impl Default for Features {
    fn default() -> Self {
        Features::all()
    }
}
