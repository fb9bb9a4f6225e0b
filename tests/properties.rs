use quickcheck::{quickcheck, Arbitrary, Gen};

use graver_json::writer::{escape_string, float_to_string};
use graver_json::{CompactWriter, PrettyWriter, Reader, Value, ValueData};

/// A comment-free tree of bounded depth for round-trip properties
#[derive(Clone, Debug)]
struct Tree(Value);

impl Arbitrary for Tree {
    fn arbitrary(g: &mut Gen) -> Self {
        Tree(arbitrary_value(g, 3))
    }
}

fn arbitrary_value(g: &mut Gen, depth: usize) -> Value {
    const SCALARS: &[u8] = &[0, 1, 2, 3, 4, 5];
    const ALL: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7];
    let kind = *g
        .choose(if depth == 0 { SCALARS } else { ALL })
        .unwrap_or(&0);
    match kind {
        0 => Value::default(),
        1 => Value::from(bool::arbitrary(g)),
        2 => Value::from(i64::arbitrary(g)),
        3 => Value::from(u64::arbitrary(g)),
        4 => Value::from(fractional(f64::arbitrary(g))),
        5 => Value::from(String::arbitrary(g)),
        6 => {
            let mut array = Value::new_array();
            for index in 0..usize::arbitrary(g) % 4 {
                *array.index_mut(index) = arbitrary_value(g, depth - 1);
            }
            array
        }
        _ => {
            let mut object = Value::new_object();
            for _ in 0..usize::arbitrary(g) % 4 {
                *object.member_mut(&String::arbitrary(g)) = arbitrary_value(g, depth - 1);
            }
            object
        }
    }
}

/// Clamp to a float whose text form stays in the double domain on re-parse
fn fractional(f: f64) -> f64 {
    if !f.is_finite() {
        return 0.5;
    }
    let text = float_to_string(f);
    if text.contains('.') || text.contains('e') {
        f
    } else {
        0.5
    }
}

fn reparse(document: &str) -> Option<Value> {
    let mut reader = Reader::new();
    let mut root = Value::default();
    if reader.parse_str(document, &mut root, false) {
        Some(root)
    } else {
        None
    }
}

fn offsets_in_range(value: &Value, length: usize) -> bool {
    if value.offset_start() > value.offset_limit() || value.offset_limit() > length {
        return false;
    }
    match &value.data {
        ValueData::Array(elements) => elements.iter().all(|child| offsets_in_range(child, length)),
        ValueData::Object(members) => members
            .values()
            .all(|child| offsets_in_range(child, length)),
        _ => true,
    }
}

quickcheck! {
    fn parse_reports_success_and_errors_consistently(doc: Vec<u8>) -> bool {
        let mut reader = Reader::new();
        let mut root = Value::default();
        let ok = reader.parse(&doc, &mut root, true);
        ok == reader.good()
    }

    fn parsed_offsets_stay_within_the_document(doc: Vec<u8>) -> bool {
        let mut reader = Reader::new();
        let mut root = Value::default();
        if reader.parse(&doc, &mut root, true) {
            offsets_in_range(&root, doc.len())
        } else {
            true
        }
    }

    fn compact_output_reparses_to_the_same_tree(tree: Tree) -> bool {
        let document = CompactWriter::new().write(&tree.0);
        reparse(&document) == Some(tree.0)
    }

    fn pretty_output_reparses_to_the_same_tree(tree: Tree) -> bool {
        let document = PrettyWriter::new().write(&tree.0);
        reparse(&document) == Some(tree.0)
    }

    fn compact_output_carries_valid_offsets(tree: Tree) -> bool {
        let document = CompactWriter::new().write(&tree.0);
        match reparse(&document) {
            Some(root) => offsets_in_range(&root, document.len()),
            None => false,
        }
    }

    fn escaped_strings_decode_to_the_original(s: String) -> bool {
        let document = escape_string(&s);
        let mut reader = Reader::new();
        let mut root = Value::default();
        reader.parse_str(&document, &mut root, false) && root.as_str() == Some(s.as_str())
    }

    fn integral_literals_select_the_narrowest_domain(u: u64, i: i64) -> bool {
        let unsigned_ok = match reparse(&u.to_string()) {
            Some(root) if u <= i64::MAX as u64 => root.data == ValueData::Integer(u as i64),
            Some(root) => root.data == ValueData::Unsigned(u),
            None => false,
        };
        let signed_ok = matches!(
            reparse(&i.to_string()),
            Some(root) if root.as_i64() == Some(i)
        );
        unsigned_ok && signed_ok
    }
}
