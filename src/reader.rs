//! The reader: a single-pass, diagnostic-accumulating JSON parser
//!
//! [Reader] owns a copy of the document, the dialect [Features] and the list
//! of recorded diagnostics; each call to one of the `parse` entry points
//! spins up an internal parse run that walks the document once with one
//! token of lookahead, populating the caller's root [Value] in place. Failures are
//! recorded in the error list and propagated as [ParseFailed] markers so the
//! descent unwinds without resynchronising; everything recorded so far stays
//! available for reporting afterwards.
use std::io::{self, Read};

use crate::coords::locate;
use crate::errors::{Details, ErrorInfo, ParseFailed, ParserResult, StructuredError};
use crate::features::Features;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::value::{CommentPlacement, Members, Value, ValueData};

/// Permissive JSON parser with source-offset and comment tracking
pub struct Reader {
    document: Vec<u8>,
    features: Features,
    errors: Vec<ErrorInfo>,
}

impl Reader {
    /// A reader using the lenient [Features::all] preset
    pub fn new() -> Self {
        Reader::with_features(Features::all())
    }

    /// A reader using the given dialect switches
    pub fn with_features(features: Features) -> Self {
        Reader {
            document: Vec::new(),
            features,
            errors: Vec::new(),
        }
    }

    /// Parse an in-memory document into `root`, returning whether the parse
    /// succeeded with no diagnostics. The previous document and diagnostics
    /// are discarded first.
    pub fn parse(&mut self, doc: &[u8], root: &mut Value, collect_comments: bool) -> bool {
        self.document.clear();
        self.document.extend_from_slice(doc);
        self.errors.clear();
        let mut run = ParseRun {
            lexer: Lexer::new(&self.document),
            features: self.features,
            collect_comments: collect_comments && self.features.allow_comments,
            errors: &mut self.errors,
        };
        run.parse_document(root)
    }

    /// Parse a string document; see [Reader::parse]
    pub fn parse_str(&mut self, doc: &str, root: &mut Value, collect_comments: bool) -> bool {
        self.parse(doc.as_bytes(), root, collect_comments)
    }

    /// Drain a stream into memory and parse the result; see [Reader::parse]
    pub fn parse_reader<R: Read>(
        &mut self,
        mut reader: R,
        root: &mut Value,
        collect_comments: bool,
    ) -> io::Result<bool> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Ok(self.parse(&buffer, root, collect_comments))
    }

    /// Whether the reader currently holds no diagnostics
    pub fn good(&self) -> bool {
        self.errors.is_empty()
    }

    /// Render every diagnostic as a human-readable block:
    /// `* Line L, Column C` followed by the indented message, plus a
    /// `See Line L', Column C' for detail.` trailer when a secondary
    /// location was recorded.
    pub fn formatted_error_messages(&self) -> String {
        let mut formatted = String::new();
        for error in &self.errors {
            let coords = locate(&self.document, error.token.start);
            formatted.push_str(&format!("* Line {}, Column {}\n", coords.line, coords.column));
            formatted.push_str(&format!("  {}\n", error.details));
            if let Some(extra) = error.extra {
                let coords = locate(&self.document, extra);
                formatted.push_str(&format!(
                    "See Line {}, Column {} for detail.\n",
                    coords.line, coords.column
                ));
            }
        }
        formatted
    }

    /// The recorded diagnostics as offset-addressed records
    pub fn structured_errors(&self) -> Vec<StructuredError> {
        self.errors
            .iter()
            .map(|error| StructuredError {
                offset_start: error.token.start,
                offset_limit: error.token.limit,
                message: error.details.to_string(),
            })
            .collect()
    }

    /// Record a caller-supplied diagnostic against an already-parsed value.
    /// Returns false, recording nothing, if the value's offsets fall outside
    /// the current document.
    pub fn push_error(&mut self, value: &Value, message: impl Into<String>) -> bool {
        self.push_error_at(value, message.into(), None)
    }

    /// Like [Reader::push_error], with a secondary value pointing at the
    /// offending detail
    pub fn push_error_with_extra(
        &mut self,
        value: &Value,
        message: impl Into<String>,
        extra: &Value,
    ) -> bool {
        if extra.offset_limit() > self.document.len() {
            return false;
        }
        self.push_error_at(value, message.into(), Some(extra.offset_start()))
    }

    fn push_error_at(&mut self, value: &Value, message: String, extra: Option<usize>) -> bool {
        let length = self.document.len();
        if value.offset_start() > length || value.offset_limit() > length {
            return false;
        }
        self.errors.push(ErrorInfo {
            token: Token {
                kind: TokenKind::Error,
                start: value.offset_start(),
                limit: value.offset_limit(),
            },
            details: Details::Custom(message),
            extra,
        });
        true
    }
}

impl Default for Reader {
    fn default() -> Self {
        Reader::new()
    }
}

/// One in-flight parse: the lexer over the document, the dialect switches,
/// and a borrow of the reader's error list
struct ParseRun<'a> {
    lexer: Lexer<'a>,
    features: Features,
    collect_comments: bool,
    errors: &'a mut Vec<ErrorInfo>,
}

impl<'a> ParseRun<'a> {
    fn add_error(&mut self, details: Details) {
        self.add_error_extra(details, None);
    }

    fn add_error_extra(&mut self, details: Details, extra: Option<usize>) {
        self.errors.push(ErrorInfo {
            token: self.lexer.token,
            details,
            extra,
        });
    }

    fn parse_document(&mut self, root: &mut Value) -> bool {
        let mut queued = String::new();
        self.skip_comment_tokens(&mut queued, None);
        if !queued.is_empty() {
            root.set_comment(std::mem::take(&mut queued), CommentPlacement::Before);
        }
        if self.features.strict_root
            && !matches!(
                self.lexer.token.kind,
                TokenKind::StartObject | TokenKind::StartArray
            )
        {
            self.lexer.token = Token {
                kind: TokenKind::Error,
                start: 0,
                limit: self.lexer.doc().len(),
            };
            self.add_error(Details::InvalidRoot);
            return false;
        }
        let successful = self.read_value(root).is_ok();
        self.skip_comment_tokens(&mut queued, Some(root));
        if !queued.is_empty() {
            root.set_comment(std::mem::take(&mut queued), CommentPlacement::After);
        }
        successful && self.errors.is_empty()
    }

    /// Advance to the next significant token, classifying any comment tokens
    /// on the way. A single-line comment following `last_value` on the same
    /// line becomes that value's `AfterOnSameLine` comment, but only once the
    /// next token shows the line really ends there; a value continuing on the
    /// same line claims the comment for its own `Before` slot instead, via
    /// `queued`. A pending buffer on entry means the comments belong to what
    /// came before the separator, so it is flushed into `last_value`'s
    /// `After` slot up front. Returns whether at least one comment token was
    /// consumed.
    fn skip_comment_tokens(
        &mut self,
        queued: &mut String,
        mut last_value: Option<&mut Value>,
    ) -> bool {
        if !queued.is_empty() {
            if let Some(last) = last_value.take() {
                last.set_comment(std::mem::take(queued), CommentPlacement::After);
            }
        }
        let mut pending: Option<String> = None;
        let mut seen = false;
        loop {
            let broke_line = self.lexer.read_token();
            let kind = self.lexer.token.kind;
            if pending.is_some() && (broke_line || kind == TokenKind::EndOfStream) {
                // the comment's line ends here, so it stays with the value
                if let (Some(text), Some(last)) = (pending.take(), last_value.as_deref_mut()) {
                    append_inline_comment(last, &text);
                }
            }
            if broke_line {
                last_value = None;
            }
            if kind != TokenKind::Comment {
                if let Some(text) = pending.take() {
                    append_queued(queued, &text);
                }
                break;
            }
            seen = true;
            if self.collect_comments {
                let text = normalize_eol(self.lexer.token.text(self.lexer.doc()));
                if last_value.is_some() && !text.contains('\n') {
                    pending = Some(match pending.take() {
                        Some(mut chained) => {
                            chained.push(' ');
                            chained.push_str(&text);
                            chained
                        }
                        None => text,
                    });
                } else {
                    if let Some(held) = pending.take() {
                        append_queued(queued, &held);
                    }
                    append_queued(queued, &text);
                }
            }
            if !self.features.allow_comments {
                break;
            }
        }
        seen
    }

    /// Parse the value begun by the current token into `v`, leaving
    /// `[offset_start, offset_limit)` covering everything consumed for it
    fn read_value(&mut self, v: &mut Value) -> ParserResult<()> {
        v.set_offset_start(self.lexer.token.start);
        match self.lexer.token.kind {
            TokenKind::StartObject => self.read_object(v)?,
            TokenKind::StartArray => self.read_array(v)?,
            TokenKind::Num => self.decode_number(v)?,
            TokenKind::Str => {
                let decoded = self.decode_string()?;
                v.data = ValueData::String(decoded);
            }
            TokenKind::True => v.data = ValueData::Boolean(true),
            TokenKind::False => v.data = ValueData::Boolean(false),
            TokenKind::Null => v.data = ValueData::Null,
            TokenKind::Comma if self.features.allow_dropped_null => {
                // a dropped placeholder: take the separator's range as ours
                // and un-read it so the enclosing loop still sees it
                v.data = ValueData::Null;
                self.lexer.rewind(self.lexer.token.start);
            }
            _ => {
                v.set_offset_limit(self.lexer.token.limit);
                self.add_error(Details::ValueExpected);
                return Err(ParseFailed);
            }
        }
        v.set_offset_limit(self.lexer.token.limit);
        Ok(())
    }

    fn read_array(&mut self, v: &mut Value) -> ParserResult<()> {
        v.data = ValueData::Array(Vec::new());
        let mut queued = String::new();
        let mut index = 0usize;
        let mut saw_comment;
        loop {
            saw_comment = self.skip_comment_tokens(&mut queued, last_element(v, index));
            if self.lexer.token.kind == TokenKind::EndArray
                && (index == 0 || self.features.allow_dropped_null)
            {
                break;
            }
            let child = v.index_mut(index);
            index += 1;
            if !queued.is_empty() {
                child.set_comment(std::mem::take(&mut queued), CommentPlacement::Before);
            }
            self.read_value(child)?;
            saw_comment = self.skip_comment_tokens(&mut queued, last_element(v, index))
                && self.lexer.token.kind != TokenKind::Comma;
            if self.lexer.token.kind != TokenKind::Comma {
                break;
            }
        }
        if self.lexer.token.kind != TokenKind::EndArray {
            self.add_error(Details::UnterminatedArray);
            return Err(ParseFailed);
        }
        if saw_comment && !queued.is_empty() {
            match last_element(v, index) {
                Some(last) => {
                    last.set_comment(std::mem::take(&mut queued), CommentPlacement::After)
                }
                None => merge_before_comment(v, &mut queued),
            }
        }
        Ok(())
    }

    fn read_object(&mut self, v: &mut Value) -> ParserResult<()> {
        v.data = ValueData::Object(Members::new());
        let mut queued = String::new();
        let mut last: Option<usize> = None;
        let mut saw_comment;
        loop {
            saw_comment = self.skip_comment_tokens(&mut queued, member_at(v, last));
            if self.lexer.token.kind == TokenKind::EndObject
                && (last.is_none() || self.features.allow_dropped_null)
            {
                break;
            }
            let name = match self.lexer.token.kind {
                TokenKind::Str => self.decode_string()?,
                TokenKind::Num if self.features.allow_numeric_keys => {
                    let mut number = Value::default();
                    self.decode_number(&mut number)?;
                    number.as_string()
                }
                _ => {
                    self.add_error(Details::MemberNameExpected);
                    return Err(ParseFailed);
                }
            };
            self.skip_comment_tokens(&mut queued, None);
            if self.lexer.token.kind != TokenKind::Colon {
                self.add_error(Details::MemberSeparatorExpected);
                return Err(ParseFailed);
            }
            self.skip_comment_tokens(&mut queued, None);
            let child = v.member_mut(&name);
            if !queued.is_empty() {
                child.set_comment(std::mem::take(&mut queued), CommentPlacement::Before);
            }
            self.read_value(child)?;
            last = member_index(v, &name);
            saw_comment = self.skip_comment_tokens(&mut queued, member_at(v, last))
                && self.lexer.token.kind != TokenKind::Comma;
            if self.lexer.token.kind != TokenKind::Comma {
                break;
            }
        }
        if self.lexer.token.kind != TokenKind::EndObject {
            self.add_error(Details::UnterminatedObject);
            return Err(ParseFailed);
        }
        if saw_comment && !queued.is_empty() {
            match member_at(v, last) {
                Some(value) => {
                    value.set_comment(std::mem::take(&mut queued), CommentPlacement::After)
                }
                None => merge_before_comment(v, &mut queued),
            }
        }
        Ok(())
    }

    /// Triage the current number token into the narrowest numeric domain.
    ///
    /// The integral digits accumulate into an unsigned 64-bit value in ten
    /// single-addition steps per digit, which lets overflow of the signed
    /// and unsigned ranges be witnessed independently along the way. Any
    /// non-digit routes the token to the double conversion instead.
    fn decode_number(&mut self, v: &mut Value) -> ParserResult<()> {
        let text = self.lexer.token.text(self.lexer.doc());
        let is_negative = text.first() == Some(&b'-');
        let digits = if is_negative { &text[1..] } else { text };
        let mut value: u64 = 0;
        let mut is_signed = true;
        let mut is_unsigned = true;
        for &c in digits {
            if !c.is_ascii_digit() {
                is_signed = false;
                is_unsigned = false;
                break;
            }
            let previous = value;
            let mut delta = u64::from(c - b'0');
            for _ in 0..10 {
                value = value.wrapping_add(delta);
                if (value as i64).wrapping_neg() > (delta as i64).wrapping_neg() {
                    is_signed = false;
                }
                if value < delta {
                    is_unsigned = false;
                }
                delta = previous;
            }
        }
        if is_signed && (is_negative || (value as i64) >= 0) {
            v.data = ValueData::Integer(if is_negative {
                (value as i64).wrapping_neg()
            } else {
                value as i64
            });
        } else if is_unsigned && !is_negative {
            v.data = ValueData::Unsigned(value);
        } else {
            let text = String::from_utf8_lossy(text).into_owned();
            match fast_float::parse::<f64, _>(text.as_bytes()) {
                Ok(parsed) => v.data = ValueData::Float(parsed),
                Err(_) => {
                    self.add_error(Details::InvalidNumber(text));
                    return Err(ParseFailed);
                }
            }
        }
        Ok(())
    }

    /// Decode the current string token, resolving escapes and UTF-16
    /// surrogate pairs into UTF-8
    fn decode_string(&mut self) -> ParserResult<String> {
        let doc = self.lexer.doc();
        let token = self.lexer.token;
        let mut decoded = Vec::with_capacity(token.limit.saturating_sub(token.start + 2));
        let mut current = token.start + 1;
        let end = token.limit - 1;
        let mut surrogate: u32 = 0;
        while current < end {
            let c = doc[current];
            current += 1;
            let byte = if c == b'\\' {
                // the lexer guarantees at least one byte follows an escape
                let escape = doc[current];
                current += 1;
                match escape {
                    b'b' => 0x08,
                    b'f' => 0x0C,
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'"' | b'/' | b'\\' => escape,
                    b'u' => {
                        let code = match decode_unicode_escape(doc, &mut current, end) {
                            Some(code) => code,
                            None => {
                                self.add_error_extra(Details::BadEscapeSequence, Some(current));
                                return Err(ParseFailed);
                            }
                        };
                        if (0xD800..=0xDBFF).contains(&code) {
                            if surrogate != 0 {
                                self.add_error_extra(Details::MisplacedSurrogate, Some(current));
                                return Err(ParseFailed);
                            }
                            surrogate = code;
                        } else if (0xDC00..=0xDFFF).contains(&code) {
                            if surrogate == 0 {
                                self.add_error_extra(Details::MisplacedSurrogate, Some(current));
                                return Err(ParseFailed);
                            }
                            let combined = 0x10000 + (((surrogate & 0x3FF) << 10) | (code & 0x3FF));
                            surrogate = 0;
                            append_utf8(&mut decoded, combined);
                        } else {
                            if surrogate != 0 {
                                self.add_error_extra(Details::MisplacedSurrogate, Some(current));
                                return Err(ParseFailed);
                            }
                            append_utf8(&mut decoded, code);
                        }
                        continue;
                    }
                    _ => {
                        self.add_error_extra(Details::BadEscapeSequence, Some(current));
                        return Err(ParseFailed);
                    }
                }
            } else {
                c
            };
            if surrogate != 0 {
                self.add_error_extra(Details::MisplacedSurrogate, Some(current));
                return Err(ParseFailed);
            }
            decoded.push(byte);
        }
        if surrogate != 0 {
            self.add_error_extra(Details::MisplacedSurrogate, Some(end));
            return Err(ParseFailed);
        }
        Ok(String::from_utf8_lossy(&decoded).into_owned())
    }
}

/// Read exactly four hex digits, advancing `current` past every byte
/// examined so a diagnostic can point just beyond the offending one
fn decode_unicode_escape(doc: &[u8], current: &mut usize, end: usize) -> Option<u32> {
    if end - *current < 4 {
        return None;
    }
    let mut unicode = 0u32;
    for _ in 0..4 {
        let c = doc[*current];
        *current += 1;
        let digit = match c {
            b'0'..=b'9' => u32::from(c - b'0'),
            b'a'..=b'f' => u32::from(c - b'a' + 10),
            b'A'..=b'F' => u32::from(c - b'A' + 10),
            _ => return None,
        };
        unicode = unicode * 16 + digit;
    }
    Some(unicode)
}

/// Encode a code point using the UTF-8 byte layout
fn append_utf8(buffer: &mut Vec<u8>, code: u32) {
    if code <= 0x7F {
        buffer.push(code as u8);
    } else if code <= 0x7FF {
        buffer.push(0xC0 | (code >> 6) as u8);
        buffer.push(0x80 | (code & 0x3F) as u8);
    } else if code <= 0xFFFF {
        buffer.push(0xE0 | (code >> 12) as u8);
        buffer.push(0x80 | ((code >> 6) & 0x3F) as u8);
        buffer.push(0x80 | (code & 0x3F) as u8);
    } else {
        buffer.push(0xF0 | (code >> 18) as u8);
        buffer.push(0x80 | ((code >> 12) & 0x3F) as u8);
        buffer.push(0x80 | ((code >> 6) & 0x3F) as u8);
        buffer.push(0x80 | (code & 0x3F) as u8);
    }
}

/// Normalise CRLF and lone CR line endings to LF
fn normalize_eol(text: &[u8]) -> String {
    let mut normalized = Vec::with_capacity(text.len());
    let mut index = 0;
    while index < text.len() {
        if text[index] == b'\r' {
            if text.get(index + 1) == Some(&b'\n') {
                index += 1;
            }
            normalized.push(b'\n');
        } else {
            normalized.push(text[index]);
        }
        index += 1;
    }
    String::from_utf8_lossy(&normalized).into_owned()
}

/// The most recently appended element of an array under construction
fn last_element(v: &mut Value, index: usize) -> Option<&mut Value> {
    match (&mut v.data, index) {
        (ValueData::Array(elements), 1..) => elements.get_mut(index - 1),
        _ => None,
    }
}

/// The member at a known insertion position of an object under construction
fn member_at(v: &mut Value, index: Option<usize>) -> Option<&mut Value> {
    match (&mut v.data, index) {
        (ValueData::Object(members), Some(index)) => {
            members.get_index_mut(index).map(|(_, value)| value)
        }
        _ => None,
    }
}

/// The insertion position of a named member
fn member_index(v: &Value, name: &str) -> Option<usize> {
    match &v.data {
        ValueData::Object(members) => members.get_index_of(name),
        _ => None,
    }
}

/// Space-join a comment onto a value's `AfterOnSameLine` slot
fn append_inline_comment(value: &mut Value, text: &str) {
    let mut inline = value
        .comment(CommentPlacement::AfterOnSameLine)
        .unwrap_or("")
        .to_owned();
    if !inline.is_empty() {
        inline.push(' ');
    }
    inline.push_str(text);
    value.set_comment(inline, CommentPlacement::AfterOnSameLine);
}

/// Newline-join a comment onto the pending buffer
fn append_queued(queued: &mut String, text: &str) {
    if !queued.is_empty() {
        queued.push('\n');
    }
    queued.push_str(text);
}

/// Fold a gathered comment block into a container's own `Before` slot; used
/// when a container closes without ever holding a value to own the block
fn merge_before_comment(v: &mut Value, queued: &mut String) {
    let mut before = v.comment(CommentPlacement::Before).unwrap_or("").to_owned();
    if !before.is_empty() {
        before.push('\n');
    }
    before.push_str(queued);
    queued.clear();
    v.set_comment(before, CommentPlacement::Before);
}
