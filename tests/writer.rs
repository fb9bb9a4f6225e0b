use std::io;

use graver_json::{CompactWriter, PrettyStreamWriter, PrettyWriter, Reader, Value};

fn parse(doc: &str) -> Value {
    let mut reader = Reader::new();
    let mut root = Value::default();
    assert!(
        reader.parse_str(doc, &mut root, true),
        "parse failed: {}",
        reader.formatted_error_messages()
    );
    root
}

#[test]
fn should_round_trip_compact_output() {
    let root = parse(r#"{"a":1,"b":[true,null,2.5],"c":"text"}"#);
    let mut writer = CompactWriter::new();
    writer.omit_ending_line_feed();
    let document = writer.write(&root);
    assert_eq!(document, r#"{"a":1,"b":[true,null,2.5],"c":"text"}"#);
    assert_eq!(parse(&document), root);
}

#[test]
fn should_round_trip_pretty_output() {
    let root = parse(r#"{"a":1,"b":[true,null,2.5],"c":{"nested":[]}}"#);
    let document = PrettyWriter::new().write(&root);
    assert_eq!(parse(&document), root);
}

#[test]
fn should_round_trip_pretty_output_with_comments() {
    let doc = "\
// configuration
{
   // how many workers
   \"workers\" : 4,
   \"labels\" : [ \"a\", \"b\" ] // inline note
}";
    let root = parse(doc);
    let document = PrettyWriter::new().write(&root);
    let reparsed = parse(&document);
    assert_eq!(reparsed, root);
    // a second print is stable
    assert_eq!(PrettyWriter::new().write(&reparsed), document);
}

#[test]
fn should_emit_comments_on_their_own_indented_lines() {
    let root = parse("{\n// leading\n\"n\" : 1\n}");
    assert_eq!(
        PrettyWriter::new().write(&root),
        "{\n   // leading\n   \"n\" : 1\n}\n"
    );
}

#[test]
fn should_match_pretty_and_stream_layouts() {
    let root = parse(r#"{"a":1,"b":[true,null,2.5]}"#);
    let pretty = PrettyWriter::new().write(&root);
    let mut sink = Vec::new();
    PrettyStreamWriter::with_indentation("   ")
        .write(&mut sink, &root)
        .unwrap();
    assert_eq!(String::from_utf8(sink).unwrap(), pretty);
}

/// A sink that fails after a fixed number of bytes
struct Brittle {
    remaining: usize,
}

impl io::Write for Brittle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.remaining {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "sink full"));
        }
        self.remaining -= buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn should_surface_sink_failures() {
    let root = parse(r#"{"a":1,"b":[true,null,2.5]}"#);
    let error = PrettyStreamWriter::new()
        .write(&mut Brittle { remaining: 4 }, &root)
        .unwrap_err();
    assert_eq!(error.kind(), io::ErrorKind::WriteZero);
}
