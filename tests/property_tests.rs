//! Property-based tests over generated trees.
//!
//! Generated trees mix every node kind, empty containers and `null` leaves. Strings and
//! names draw on YAML indicators, quotes, comment and mapping markers, control characters
//! and non-ASCII letters, so quoting decisions are exercised on both keys and values.

use kvtree::convert::{BranchesToString, SnakeCaseKeys, TreeConverter};
use kvtree::key::to_snake_case;
use kvtree::{branch_from_slice, from_slice, to_vec, Format, Leaf, Node, Options, Scalar, Tree};
use proptest::prelude::*;

/// Characters that change how a YAML scalar reads, besides plain letters and digits.
const AWKWARD: &str = r#" \\_.:#'",\-\[\]{}&*!|>%@`?~+\t\n\r\x01\x7fé€"#;

fn key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z][a-zA-Z0-9]{0,5}".boxed(),
        proptest::string::string_regex(&format!("[a-zA-Z0-9{}]{{1,6}}", AWKWARD))
            .unwrap()
            .boxed(),
    ]
}

fn text() -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("[a-zA-Z0-9{}]{{0,12}}", AWKWARD)).unwrap()
}

fn leaf() -> impl Strategy<Value = Node> {
    prop_oneof![
        Just(Node::Leaf(Leaf::empty())),
        any::<bool>().prop_map(|b| Node::Leaf(Leaf::new(b))),
        any::<i64>().prop_map(|i| Node::Leaf(Leaf::new(i))),
        (-1.0e6..1.0e6f64).prop_map(|f| Node::Leaf(Leaf::new(f))),
        text().prop_map(|s| Node::Leaf(Leaf::new(s))),
    ]
}

fn node() -> impl Strategy<Value = Node> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6)
                .prop_map(|nodes| Node::Branch(nodes.into_iter().collect())),
            prop::collection::vec((key(), inner), 0..6)
                .prop_map(|entries| Node::Tree(entries.into_iter().collect())),
        ]
    })
}

fn tree() -> impl Strategy<Value = Tree> {
    prop::collection::vec((key(), node()), 0..6)
        .prop_map(|entries| entries.into_iter().collect())
}

fn full_keys(tree: &Tree) -> Vec<String> {
    fn visit(node: &Node, keys: &mut Vec<String>) {
        keys.push(node.full_key().to_string());
        match node {
            Node::Tree(t) => t.iter().for_each(|(_, child)| visit(child, keys)),
            Node::Branch(b) => b.iter().for_each(|child| visit(child, keys)),
            Node::Leaf(_) => {}
        }
    }

    let mut keys = Vec::new();
    for (_, child) in tree.iter() {
        visit(child, &mut keys);
    }
    keys
}

fn round_trip(tree: &Tree, options: &Options) -> Tree {
    let encoded = to_vec(tree, options).unwrap();
    match from_slice(options.format, &encoded) {
        Ok(decoded) => decoded,
        Err(e) => panic!(
            "decode failed: {}\nencoded was:\n{}",
            e,
            String::from_utf8_lossy(&encoded)
        ),
    }
}

proptest! {
    #[test]
    fn prop_json_round_trip(t in tree(), indent in 0usize..5) {
        let options = Options::json().with_indent(indent);
        prop_assert_eq!(round_trip(&t, &options), t);
    }

    #[test]
    fn prop_yaml_round_trip(t in tree(), indent in 2usize..5) {
        let options = Options::yaml().with_indent(indent);
        prop_assert_eq!(round_trip(&t, &options), t);
    }

    #[test]
    fn prop_decode_encode_decode_is_stable(t in tree()) {
        for options in [Options::json(), Options::yaml()] {
            let once = round_trip(&t, &options);
            let twice = round_trip(&once, &options);
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn prop_every_node_answers_to_its_full_key(t in tree()) {
        for key in full_keys(&t) {
            let found = t.get_by_full_key(&key).unwrap();
            prop_assert_eq!(found.full_key(), key.as_str());
            prop_assert_eq!(found.nesting_level(), key.split('/').count());
        }
    }

    #[test]
    fn prop_deleted_key_is_not_found(mut t in tree(), pick in any::<prop::sample::Index>()) {
        let keys: Vec<String> = full_keys(&t)
            .into_iter()
            .filter(|key| key.split('/').all(|s| s.starts_with(|c: char| c.is_ascii_alphabetic())))
            .collect();
        prop_assume!(!keys.is_empty());
        let key = &keys[pick.index(keys.len())];

        t.delete(key).unwrap();
        prop_assert!(t.get_by_full_key(key).unwrap_err().is_not_found());
        prop_assert!(t.delete("").is_err());
    }

    #[test]
    fn prop_snake_case_is_idempotent(s in "[a-zA-Z0-9_. -]{0,16}") {
        let once = to_snake_case(&s);
        prop_assert_eq!(to_snake_case(&once), once);
    }

    #[test]
    fn prop_snake_case_keys_is_idempotent(t in tree()) {
        let once = SnakeCaseKeys.convert(&t);
        prop_assume!(once.is_ok());
        let once = once.unwrap();
        prop_assert_eq!(SnakeCaseKeys.convert(&once).unwrap(), once);
    }

    #[test]
    fn prop_branches_to_string_reparses(
        elements in prop::collection::vec(node(), 0..6),
        yaml in any::<bool>(),
    ) {
        let format = if yaml { Format::Yaml } else { Format::Json };
        let mut t = Tree::new();
        t.insert("list", Node::Branch(elements.into_iter().collect()));

        let converted = BranchesToString::new(format, 2).convert(&t).unwrap();
        let text = converted
            .get_by_full_key("list")
            .unwrap()
            .as_leaf()
            .and_then(Leaf::value)
            .and_then(Scalar::as_str)
            .unwrap()
            .to_string();

        let reparsed = branch_from_slice(format, text.as_bytes()).unwrap();
        let compact = Options::json().with_indent(0);
        let original = t.get_child("list").and_then(Node::as_branch).unwrap();
        prop_assert_eq!(to_vec(&reparsed, &compact).unwrap(), to_vec(original, &compact).unwrap());
    }
}
