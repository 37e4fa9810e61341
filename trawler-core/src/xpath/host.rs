//! Host-side helpers for checks XPath 1.0 can't express
//!
//! XPath 1.0 has no way to compare a sibling's name with the name of the
//! context node from inside a predicate. The engine instead fetches the
//! sibling axis as a node-set and these helpers count the names in Rust.

use std::collections::HashMap;

use xot::{Node, Xot};

/// How many of `siblings` are elements with the same name as `context`
pub fn same_name_count(xot: &Xot, context: Node, siblings: &[Node]) -> usize {
    let Some(name) = xot.element(context).map(|element| element.name()) else {
        return 0;
    };
    siblings
        .iter()
        .filter(|sibling| **sibling != context)
        .filter(|sibling| xot.element(**sibling).is_some_and(|element| element.name() == name))
        .count()
}

/// Sort `nodes` into document order and drop duplicates
pub fn document_order(xot: &Xot, mut nodes: Vec<Node>) -> Vec<Node> {
    if nodes.len() < 2 {
        return nodes;
    }

    let mut root = nodes[0];
    while let Some(parent) = xot.parent(root) {
        root = parent;
    }
    let order: HashMap<Node, usize> = xot
        .descendants(root)
        .enumerate()
        .map(|(index, node)| (node, index))
        .collect();

    // Stable: nodes outside the tree walk (e.g. attributes) keep their order
    nodes.sort_by_key(|node| order.get(node).copied().unwrap_or(usize::MAX));
    nodes.dedup();
    nodes
}

/// Absolute location path of `node`, e.g. `/html[1]/body[1]/text()[2]`
pub fn location_path(xot: &Xot, node: Node) -> String {
    let mut steps = Vec::new();
    let mut current = node;

    while let Some(parent) = xot.parent(current) {
        let before: Vec<Node> =
            xot.children(parent).take_while(|sibling| *sibling != current).collect();
        let step = if let Some(element) = xot.element(current) {
            let name = element.name();
            let position = before
                .iter()
                .filter(|sibling| xot.element(**sibling).is_some_and(|e| e.name() == name))
                .count();
            format!("{}[{}]", xot.local_name_str(name), position + 1)
        } else if xot.is_text(current) {
            let position = before.iter().filter(|sibling| xot.is_text(**sibling)).count();
            format!("text()[{}]", position + 1)
        } else {
            "node()".to_string()
        };
        steps.push(step);
        current = parent;
    }

    steps.reverse();
    format!("/{}", steps.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_path() {
        let mut xot = Xot::new();
        let doc = xot.parse("<r><a/><b/><a>x<c/>y</a></r>").unwrap();
        let root = xot.document_element(doc).unwrap();
        let second_a = children(&xot, root)[2];
        let text_nodes: Vec<Node> = xot.children(second_a).filter(|n| xot.is_text(*n)).collect();

        assert_eq!(location_path(&xot, doc), "/");
        assert_eq!(location_path(&xot, second_a), "/r[1]/a[2]");
        assert_eq!(location_path(&xot, text_nodes[1]), "/r[1]/a[2]/text()[2]");
    }

    fn children(xot: &Xot, node: Node) -> Vec<Node> {
        xot.children(node).filter(|n| xot.is_element(*n)).collect()
    }

    #[test]
    fn test_same_name_count() {
        let mut xot = Xot::new();
        let doc = xot.parse("<r><a/><b/><a/><a/></r>").unwrap();
        let root = xot.document_element(doc).unwrap();
        let kids = children(&xot, root);

        // Third child is the second <a>; siblings before it are <a/><b/>
        assert_eq!(same_name_count(&xot, kids[2], &kids[..2]), 1);
        assert_eq!(same_name_count(&xot, kids[1], &kids), 0);
        assert_eq!(same_name_count(&xot, kids[0], &kids[1..]), 2);
    }

    #[test]
    fn test_document_order_sorts_and_dedups() {
        let mut xot = Xot::new();
        let doc = xot.parse("<r><a/><b/><c/></r>").unwrap();
        let root = xot.document_element(doc).unwrap();
        let kids = children(&xot, root);

        let shuffled = vec![kids[2], kids[0], kids[2], kids[1], kids[0]];
        assert_eq!(document_order(&xot, shuffled), kids);
    }
}
