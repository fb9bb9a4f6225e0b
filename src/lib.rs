//! A forgiving JSON reader and a small family of writers.
//!
//! The [Reader] consumes an in-memory byte range in a single pass and builds
//! an annotated [Value] tree: every node carries the byte range it was
//! parsed from, and (optionally) the `//` and `/* */` comments found around
//! it. Diagnostics accumulate in the reader instead of aborting the walk, so
//! several problems can be reported against one document.
//!
//! The dialect is a configurable superset of RFC 8259; see [Features] for
//! the switches: comments, dropped-null placeholders, numeric object keys,
//! and a strict-root mode.
//!
//! Three writers turn a tree back into text: [CompactWriter] for minimal
//! single-line output, [PrettyWriter] for indented output with comments
//! re-emitted in place, and [PrettyStreamWriter] for the same layout pushed
//! into any `io::Write` sink.
//!
//! ```
//! use graver_json::{Reader, Value, PrettyWriter};
//!
//! let mut reader = Reader::new();
//! let mut root = Value::default();
//! assert!(reader.parse_str("[1, 2, 3] // counted", &mut root, true));
//! assert_eq!(root.len(), 3);
//! assert_eq!(PrettyWriter::new().write(&root), "[ 1, 2, 3 ] // counted\n");
//! ```

pub mod coords;
pub mod errors;
pub mod features;
mod lexer;
pub mod reader;
pub mod value;
pub mod writer;

pub use features::Features;
pub use reader::Reader;
pub use value::{CommentPlacement, Members, Value, ValueData};
pub use writer::{CompactWriter, PrettyStreamWriter, PrettyWriter};
