/// Builds a [`Tree`](crate::Tree) from a JSON-like literal.
///
/// Objects become trees, arrays become branches, `null` becomes an empty leaf and any other
/// value becomes a leaf holding it. Negative numbers and other multi-token expressions go in
/// parentheses.
///
/// # Examples
///
/// ```rust
/// use kvtree::tree;
///
/// let t = tree!({
///     "server": {"host": "localhost", "port": 8080},
///     "replicas": [{"zone": "a"}, {"zone": "b"}],
///     "offset": (-1),
///     "proxy": null
/// });
/// assert_eq!(t.get_by_full_key("replicas/1/zone").unwrap().nesting_level(), 3);
/// ```
#[macro_export]
macro_rules! tree {
    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        #[allow(unused_mut)]
        let mut tree = $crate::Tree::new();
        $(
            tree.insert($key, $crate::tree!(@node $value));
        )*
        tree
    }};

    (@node null) => {
        $crate::Node::Leaf($crate::Leaf::empty())
    };

    (@node [ $($element:tt),* $(,)? ]) => {{
        #[allow(unused_mut)]
        let mut branch = $crate::Branch::new();
        $(
            branch.push($crate::tree!(@node $element));
        )*
        $crate::Node::Branch(branch)
    }};

    (@node { $($key:literal : $value:tt),* $(,)? }) => {
        $crate::Node::Tree($crate::tree!({ $($key : $value),* }))
    };

    (@node $value:expr) => {
        $crate::Node::Leaf($crate::Leaf::new($value))
    };
}

#[cfg(test)]
mod tests {
    use crate::{Node, Scalar, Tree};

    #[test]
    fn test_tree_macro_scalars() {
        let t = tree!({"s": "x", "i": 42, "f": 3.5, "b": true, "n": null, "neg": (-7)});
        let value = |name: &str| t.get_child(name).and_then(Node::as_leaf).and_then(|l| l.value());
        assert_eq!(value("s"), Some(&Scalar::from("x")));
        assert_eq!(value("i"), Some(&Scalar::from(42)));
        assert_eq!(value("f"), Some(&Scalar::from(3.5)));
        assert_eq!(value("b"), Some(&Scalar::Bool(true)));
        assert_eq!(value("n"), None);
        assert_eq!(value("neg"), Some(&Scalar::from(-7)));
    }

    #[test]
    fn test_tree_macro_containers() {
        assert_eq!(tree!({}), Tree::new());

        let t = tree!({"a": [], "b": {}, "c": [[1], {"d": 2}],});
        assert!(t.get_child("a").unwrap().is_empty());
        assert!(t.get_child("b").unwrap().is_empty());
        assert_eq!(t.get_by_full_key("c/0/0").unwrap().kind(), "leaf");
        assert_eq!(t.get_by_full_key("c/1/d").unwrap().full_key(), "c/1/d");
    }
}
