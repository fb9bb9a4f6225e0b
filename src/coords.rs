//! Coordinate structure used to reference specific locations within reader input
use std::fmt::{Display, Formatter};

/// A [Coords] represents a single location within the reader input
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Coords {
    /// The absolute byte offset
    pub absolute: usize,
    /// The row position, 1-based
    pub line: usize,
    /// The column position, 1-based
    pub column: usize,
}

impl Default for Coords {
    /// The default set of coordinates are positioned at the start of the first row
    fn default() -> Self {
        Coords {
            absolute: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Display for Coords {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(line: {}, column: {}, absolute: {})",
            self.line, self.column, self.absolute
        )
    }
}

/// Resolve a byte offset within `doc` into 1-based line and column [Coords].
///
/// A CRLF pair counts as a single line terminator, a lone CR or LF each count
/// as one. The column is the byte distance from the last line start plus one.
pub fn locate(doc: &[u8], offset: usize) -> Coords {
    let mut current = 0;
    let mut last_line_start = 0;
    let mut line = 0;
    while current < offset && current < doc.len() {
        let c = doc[current];
        current += 1;
        if c == b'\r' {
            if doc.get(current) == Some(&b'\n') {
                current += 1;
            }
            last_line_start = current;
            line += 1;
        } else if c == b'\n' {
            last_line_start = current;
            line += 1;
        }
    }
    Coords {
        absolute: offset,
        line: line + 1,
        column: offset.saturating_sub(last_line_start) + 1,
    }
}
