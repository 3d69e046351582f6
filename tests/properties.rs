//! Property tests: position tracking and depth bracketing

use proptest::prelude::*;
use tagstream::{NodeKind, Parser, Position, Tokenizer};

#[derive(Debug, Clone)]
enum Item {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<Item>,
    },
    Empty(String),
    Text(String),
    Comment(String),
}

fn render(items: &[Item], out: &mut String) {
    for item in items {
        match item {
            Item::Element { name, attrs, children } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attrs {
                    out.push_str(&format!(" {key}=\"{value}\""));
                }
                out.push('>');
                render(children, out);
                out.push_str(&format!("</{name}>"));
            }
            Item::Empty(name) => out.push_str(&format!("<{name}/>")),
            Item::Text(text) => out.push_str(text),
            Item::Comment(body) => out.push_str(&format!("<!--{body}-->")),
        }
    }
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9._-]{0,6}"
}

fn arb_item() -> impl Strategy<Value = Item> {
    let leaf = prop_oneof![
        arb_name().prop_map(Item::Empty),
        "[^<]{1,12}".prop_map(Item::Text),
        "[a-z \n]{0,10}".prop_map(Item::Comment),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        (
            arb_name(),
            prop::collection::vec((arb_name(), "[^\"]{0,8}"), 0..3),
            prop::collection::vec(inner, 0..6),
        )
            .prop_map(|(name, attrs, children)| Item::Element { name, attrs, children })
    })
}

fn arb_document() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_item(), 0..4).prop_map(|items| {
        let mut out = String::new();
        render(&items, &mut out);
        out
    })
}

fn check_positions(input: &[u8]) -> Result<(), TestCaseError> {
    let mut previous = 0;
    for token in Tokenizer::new(input) {
        let Ok(token) = token else { break };
        prop_assert!(token.offset >= previous, "offset went backwards at {}", token.offset);
        prop_assert_eq!(Position::locate(input, token.offset), token.position());
        previous = token.offset;
    }
    Ok(())
}

proptest! {
    #[test]
    fn depth_brackets_match(doc in arb_document()) {
        let mut parser = Parser::new(doc.as_bytes());
        let mut open: Vec<String> = Vec::new();

        for node in parser.by_ref() {
            match node.kind {
                NodeKind::ElementBegin => {
                    prop_assert_eq!(node.depth, open.len());
                    if !node.self_closing {
                        open.push(node.text.to_string());
                    }
                }
                NodeKind::ElementEnd => {
                    let name = open.pop();
                    let text = node.text.to_string();
                    prop_assert_eq!(name.as_deref(), Some(text.as_str()));
                    prop_assert_eq!(node.depth, open.len());
                }
                _ => {
                    prop_assert_eq!(node.depth, open.len());
                }
            }
        }

        prop_assert!(parser.is_done());
        prop_assert!(!parser.is_errored(), "errors: {:?}", parser.errors());
        prop_assert!(open.is_empty());
        prop_assert_eq!(parser.depth(), 0);
    }

    #[test]
    fn token_positions_on_documents(doc in arb_document()) {
        check_positions(doc.as_bytes())?;
    }

    #[test]
    fn token_positions_on_markup_noise(input in "[<>/?!=:a-z0-9\"' \t\n-]{0,80}") {
        check_positions(input.as_bytes())?;
    }

    #[test]
    fn token_positions_on_bytes(input in prop::collection::vec(any::<u8>(), 0..200)) {
        check_positions(&input)?;
    }

    #[test]
    fn parser_never_panics(input in prop::collection::vec(any::<u8>(), 0..200)) {
        let mut parser = Parser::with_name("fuzz", &input);
        let mut pulls = 0;
        while parser.next_node().is_valid() {
            pulls += 1;
            prop_assert!(pulls <= input.len());
        }
        prop_assert!(parser.is_done() || parser.is_errored());
        prop_assert!(!parser.next_node().is_valid());
    }
}
