//! Small lookup helpers over roxmltree element trees.

use roxmltree::Node;

/// First direct child element named `name`
pub fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

/// Direct child elements named `name`, in document order
pub fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == name)
}

/// Direct children reached through `path` (`"a/b"` walks `a` then every `b`)
pub fn children_at<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    path: &'a str,
) -> Vec<Node<'a, 'input>> {
    let mut current = vec![node];
    for step in path.split('/') {
        current = current
            .into_iter()
            .flat_map(|n| children(n, step))
            .collect();
    }
    current
}

/// Text of the first child named `name`; empty when missing
pub fn child_text<'a>(node: Node<'a, '_>, name: &str) -> &'a str {
    child(node, name).and_then(|c| c.text()).unwrap_or("")
}

/// All descendant elements (including `node`) named `name`
pub fn descendants<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.descendants()
        .filter(move |c| c.is_element() && c.tag_name().name() == name)
}
