use archgraph_core::syntax::Position;
use tree_sitter::Node;

/// Extract the source text for a tree-sitter node.
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// Find the first child with a specific kind.
pub fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|child| child.kind() == kind)
}

/// Find a child by field name.
pub fn child_by_field<'a>(node: Node<'a>, field: &str) -> Option<Node<'a>> {
    node.child_by_field_name(field)
}

/// Named children, skipping comments.
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Texts of every child stored under `field`.
pub fn field_texts<'a>(node: Node<'_>, field: &str, source: &'a str) -> Vec<&'a str> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor)
        .map(|child| node_text(child, source))
        .collect()
}

/// 1-based line and column plus byte offset of a node's start.
pub fn position(node: Node<'_>) -> Position {
    let start = node.start_position();
    Position::new(start.row + 1, start.column + 1, node.start_byte())
}

/// Strip the quotes of an interpreted or raw string literal.
pub fn unquote(literal: &str) -> &str {
    literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| literal.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .unwrap_or(literal)
}

/// 1-based line of the first error or missing node, if any.
pub fn first_error_line(root: Node<'_>) -> Option<usize> {
    if !root.has_error() {
        return None;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    Some(root.start_position().row + 1)
}
