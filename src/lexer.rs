//! Single-token lexer over an in-memory byte range
//!
//! The lexer holds a read head over the document and produces one [Token] at
//! a time on demand. Tokens carry half-open byte ranges back into the
//! document; nothing is copied out at this stage. Escape sequences inside
//! strings and the digits of numbers are validated later, by the decoders.

/// Enumeration of the token forms recognised by the reader
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    /// A quoted string, delimiters included in the range
    Str,
    /// Anything shaped like a number; semantic validity is the decoder's problem
    Num,
    True,
    False,
    Null,
    /// A `//` or `/* */` comment, delimiters included in the range
    Comment,
    Comma,
    Colon,
    EndOfStream,
    Error,
}

/// A token paired with its half-open `[start, limit)` byte range within the
/// document
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub limit: usize,
}

impl Token {
    /// The bytes this token covers
    pub(crate) fn text<'a>(&self, doc: &'a [u8]) -> &'a [u8] {
        &doc[self.start..self.limit]
    }
}

/// The read head over the document, plus the most recently produced token
pub(crate) struct Lexer<'a> {
    doc: &'a [u8],
    current: usize,
    pub token: Token,
}

impl<'a> Lexer<'a> {
    pub fn new(doc: &'a [u8]) -> Self {
        Lexer {
            doc,
            current: 0,
            token: Token {
                kind: TokenKind::Error,
                start: 0,
                limit: 0,
            },
        }
    }

    pub fn doc(&self) -> &'a [u8] {
        self.doc
    }

    /// Move the read head back so that the bytes from `to` onwards are lexed
    /// again. Used to un-read a separator consumed as a dropped-null
    /// placeholder.
    pub fn rewind(&mut self, to: usize) {
        self.current = to;
    }

    /// The byte under the read head, or 0 at the end of the document
    fn peek(&self) -> u8 {
        self.doc.get(self.current).copied().unwrap_or(0)
    }

    /// Return the byte under the read head and move past it. At the end of
    /// the document this returns 0 and the head stays put.
    fn advance(&mut self) -> u8 {
        let c = self.peek();
        if self.current != self.doc.len() {
            self.current += 1;
        }
        c
    }

    /// Produce the next token, skipping any leading whitespace. Returns
    /// whether a line break was skipped on the way to the token; the comment
    /// gatherer uses that to decide same-line comment attribution.
    pub fn read_token(&mut self) -> bool {
        let mut saw_line_break = false;
        while self.current < self.doc.len() {
            match self.doc[self.current] {
                b' ' | b'\t' => self.current += 1,
                b'\r' | b'\n' => {
                    saw_line_break = true;
                    self.current += 1;
                }
                _ => break,
            }
        }
        self.token.start = self.current;
        let c = self.advance();
        self.token.kind = match c {
            b'{' => TokenKind::StartObject,
            b'}' => TokenKind::EndObject,
            b'[' => TokenKind::StartArray,
            b']' => TokenKind::EndArray,
            b'"' => self.read_string(),
            b'/' => self.read_comment(),
            b'0'..=b'9' | b'-' => self.read_number(),
            b't' => self.match_keyword(b"true", TokenKind::True),
            b'f' => self.match_keyword(b"false", TokenKind::False),
            b'n' => self.match_keyword(b"null", TokenKind::Null),
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            0 => TokenKind::EndOfStream,
            _ => TokenKind::Error,
        };
        self.token.limit = self.current;
        saw_line_break
    }

    /// Scan to the closing quote. A backslash consumes the following byte
    /// unconditionally; a NUL byte is ordinary string data here.
    fn read_string(&mut self) -> TokenKind {
        while self.current < self.doc.len() {
            let c = self.advance();
            if c == b'"' {
                return TokenKind::Str;
            }
            if c == b'\\' {
                self.advance();
            }
        }
        TokenKind::Error
    }

    /// Dispatch on the byte after a `/`
    fn read_comment(&mut self) -> TokenKind {
        match self.advance() {
            b'*' => self.read_c_style_comment(),
            b'/' => self.read_line_comment(),
            _ => TokenKind::Error,
        }
    }

    /// Scan until `*/`, both delimiters included in the token
    fn read_c_style_comment(&mut self) -> TokenKind {
        let mut previous = 0u8;
        while self.current < self.doc.len() {
            let c = self.advance();
            if previous == b'*' && c == b'/' {
                return TokenKind::Comment;
            }
            previous = c;
        }
        TokenKind::Error
    }

    /// Scan up to, but not including, the terminating CR or LF
    fn read_line_comment(&mut self) -> TokenKind {
        while self.current < self.doc.len() {
            let c = self.doc[self.current];
            if c == b'\r' || c == b'\n' {
                break;
            }
            self.current += 1;
        }
        TokenKind::Comment
    }

    /// Consume anything number-shaped: digits plus the `.eE+-` repertoire
    fn read_number(&mut self) -> TokenKind {
        while self.current < self.doc.len() {
            let c = self.doc[self.current];
            if !c.is_ascii_digit() && !matches!(c, b'.' | b'e' | b'E' | b'+' | b'-') {
                break;
            }
            self.current += 1;
        }
        TokenKind::Num
    }

    /// Verify the remainder of a keyword whose first byte has already been
    /// consumed. The read head only advances on a full match.
    fn match_keyword(&mut self, pattern: &[u8], kind: TokenKind) -> TokenKind {
        let rest = &pattern[1..];
        if self.current + rest.len() > self.doc.len() {
            return TokenKind::Error;
        }
        if &self.doc[self.current..self.current + rest.len()] != rest {
            return TokenKind::Error;
        }
        self.current += rest.len();
        kind
    }
}
