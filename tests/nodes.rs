//! End-to-end pull parsing over every source kind

use std::io::Write;
use tagstream::{Arena, NodeKind, Parser, Slice, Source, SourceRange};

const BASIC: &[u8] = b"<tag>text<!--test-comment--></tag>\n<sct/><gat>\n<inner>\n</inner></gat>";

const BROKEN: &[u8] = b"<tag>text<!--test-comment--></t@ag>\n<sct/><gat>\n<inner>\n</inner></gat>";

const FIXTURE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<catalog>
  <!-- two books -->
  <book id="bk101" lang='en'>
    <title>Rust in Practice</title>
    <price currency="EUR">39</price>
    <stock/>
  </book>
  <book id="bk102">
    <title>Streams</title>
    <xlink:ref xlink:href="#bk101"/>
  </book>
</catalog>
"##;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// (kind, text, line, column, depth, self_closing)
type Expected = (NodeKind, &'static str, usize, usize, usize, bool);

fn check(parser: &mut Parser<'_>, expected: &[Expected]) {
    for (i, &(kind, text, line, column, depth, self_closing)) in expected.iter().enumerate() {
        let node = parser.next_node();
        assert_eq!(node.kind, kind, "node {i}");
        assert_eq!(node.text, text, "node {i}");
        assert_eq!((node.line, node.column_start), (line, column), "node {i}");
        assert_eq!(node.depth, depth, "node {i}");
        assert_eq!(node.self_closing, self_closing, "node {i}");
    }
}

#[test]
fn test_basic_document() {
    init_tracing();
    let source = Source::from_bytes("test", BASIC, SourceRange::full()).unwrap();
    let mut parser = source.parser();

    use NodeKind::*;
    check(
        &mut parser,
        &[
            (ElementBegin, "tag", 1, 1, 0, false),
            (Text, "text", 1, 6, 1, false),
            (Comment, "test-comment", 1, 10, 1, false),
            (ElementEnd, "tag", 1, 29, 0, false),
            (Text, "\n", 1, 35, 0, false),
            (ElementBegin, "sct", 2, 1, 0, true),
            (ElementBegin, "gat", 2, 7, 0, false),
            (Text, "\n", 2, 12, 1, false),
            (ElementBegin, "inner", 3, 1, 1, false),
            (Text, "\n", 3, 8, 2, false),
            (ElementEnd, "inner", 4, 1, 1, false),
            (ElementEnd, "gat", 4, 9, 0, false),
        ],
    );

    assert_eq!(parser.next_node().kind, Invalid);
    assert!(parser.is_done());
    assert!(!parser.is_errored());
}

#[test]
fn test_basic_document_window() {
    let source = Source::from_bytes("test", BASIC, SourceRange::new(35, 11)).unwrap();
    let mut parser = source.parser();

    use NodeKind::*;
    check(
        &mut parser,
        &[
            (ElementBegin, "sct", 1, 1, 0, true),
            (ElementBegin, "gat", 1, 7, 0, false),
        ],
    );

    assert_eq!(parser.next_node().kind, Invalid);
    assert!(parser.is_done());
}

#[test]
fn test_broken_document() {
    init_tracing();
    let source = Source::from_bytes("test", BROKEN, SourceRange::full()).unwrap();
    let mut parser = source.parser();

    let kinds: Vec<_> = parser.by_ref().map(|n| n.kind).collect();
    assert_eq!(kinds, [NodeKind::ElementBegin, NodeKind::Text, NodeKind::Comment]);
    assert!(parser.is_errored());
    assert!(parser.is_done());
    assert_eq!(parser.errors().len(), 1);
    assert_eq!(parser.error().unwrap().to_string(), "test:1:32 - Invalid character '@'");
}

#[test]
fn test_scenarios() {
    let nodes = tagstream::parse_nodes(b"<tag>text</tag>").unwrap();
    let summary: Vec<_> = nodes.iter().map(|n| (n.kind, n.text.to_string(), n.depth)).collect();
    assert_eq!(
        summary,
        [
            (NodeKind::ElementBegin, "tag".to_string(), 0),
            (NodeKind::Text, "text".to_string(), 1),
            (NodeKind::ElementEnd, "tag".to_string(), 0),
        ]
    );

    let nodes = tagstream::parse_nodes(b"<sct/>").unwrap();
    assert_eq!(nodes.len(), 1);
    assert!(nodes[0].self_closing);

    let nodes = tagstream::parse_nodes(b"<!--hello-->").unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].kind, NodeKind::Comment);
    assert_eq!(nodes[0].text, "hello");
}

fn count_kinds(parser: &mut Parser<'_>) -> [usize; 5] {
    let mut counts = [0; 5];
    for node in parser.by_ref() {
        let slot = match node.kind {
            NodeKind::ElementBegin => 0,
            NodeKind::ElementEnd => 1,
            NodeKind::Text => 2,
            NodeKind::Comment => 3,
            NodeKind::XmlHeader => 4,
            NodeKind::Invalid => unreachable!("iterator stops before invalid nodes"),
        };
        counts[slot] += 1;
    }
    counts
}

#[test]
fn test_fixture_file() {
    init_tracing();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FIXTURE.as_bytes()).unwrap();
    file.flush().unwrap();

    let source = Source::open_file(file.path(), SourceRange::full()).unwrap();
    assert!(source.is_mapped());
    let mut parser = source.parser();

    // begin, end, text, comment, header
    assert_eq!(count_kinds(&mut parser), [8, 6, 16, 1, 1]);
    assert!(parser.is_done());
    assert!(!parser.is_errored());
    assert_eq!(parser.depth(), 0);
}

#[test]
fn test_fixture_attributes() {
    let mut parser = Parser::new(FIXTURE.as_bytes());
    let mut seen = Vec::new();
    while parser.next_node().is_valid() {
        for attr in parser.attributes() {
            seen.push((parser.node_text().to_string(), attr.name.to_string(), attr.value.to_string()));
        }
    }
    let seen: Vec<_> = seen.iter().map(|(n, k, v)| (n.as_str(), k.as_str(), v.as_str())).collect();
    assert_eq!(
        seen,
        [
            ("xml", "version", "1.0"),
            ("xml", "encoding", "UTF-8"),
            ("book", "id", "bk101"),
            ("book", "lang", "en"),
            ("price", "currency", "EUR"),
            ("book", "id", "bk102"),
            ("xlink:ref", "xlink:href", "#bk101"),
        ]
    );
}

#[test]
fn test_file_window() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(BASIC).unwrap();
    file.flush().unwrap();

    let source = Source::open_file(file.path(), SourceRange::new(35, 11)).unwrap();
    let names: Vec<_> = source.parser().map(|n| n.text.to_string()).collect();
    assert_eq!(names, ["sct", "gat"]);
}

#[test]
fn test_streamed_source() {
    let source = Source::from_reader("stream", std::io::Cursor::new(BASIC.to_vec())).unwrap();
    assert_eq!(source.parser().count(), 12);
}

#[test]
fn test_copy_names_into_arena() {
    let arena = Arena::with_min_block_size("names", 4096);
    let names = {
        let source = Source::copy_from_bytes("test", BASIC, SourceRange::full()).unwrap();
        let copies: Vec<_> = source
            .parser()
            .filter(|n| n.kind == NodeKind::ElementBegin)
            .map(|n| n.text.dup_in(&arena))
            .collect();
        copies
    };
    let names: Vec<_> = names.iter().map(|n| Slice::new(n)).collect();
    assert_eq!(names, ["tag", "sct", "gat", "inner"]);
}
