//! Post-order tree transformation

use super::Node;
use std::sync::Arc;

/// Ancestors of the node being visited, outermost first
#[derive(Debug, Default)]
pub struct Cursor {
    ancestors: Vec<Arc<Node>>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ancestors, outermost first (as they were before any rewrite)
    pub fn ancestors(&self) -> &[Arc<Node>] {
        &self.ancestors
    }

    /// Direct parent of the visited node
    pub fn parent(&self) -> Option<&Arc<Node>> {
        self.ancestors.last()
    }

    /// Number of ancestors
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    fn push(&mut self, node: &Arc<Node>) {
        self.ancestors.push(Arc::clone(node));
    }

    fn pop(&mut self) {
        self.ancestors.pop();
    }
}

/// Rebuild a tree bottom-up.
///
/// `visit` sees every node after its children have been transformed and may
/// return a replacement. Nodes for which nothing changed (neither the node
/// nor any descendant) are returned as the very same `Arc`.
pub fn transform<F>(root: &Arc<Node>, visit: &mut F) -> Arc<Node>
where
    F: FnMut(&Arc<Node>, &Cursor) -> Option<Node>,
{
    let mut cursor = Cursor::new();
    transform_node(root, &mut cursor, visit)
}

fn transform_node<F>(node: &Arc<Node>, cursor: &mut Cursor, visit: &mut F) -> Arc<Node>
where
    F: FnMut(&Arc<Node>, &Cursor) -> Option<Node>,
{
    let rebuilt = if node.children().is_empty() {
        Arc::clone(node)
    } else {
        cursor.push(node);
        let mut changed = false;
        let mapped = node.map_children(&mut |child| {
            let result = transform_node(child, cursor, visit);
            if !Arc::ptr_eq(&result, child) {
                changed = true;
            }
            result
        });
        cursor.pop();
        if changed {
            Arc::new(mapped)
        } else {
            Arc::clone(node)
        }
    };

    match visit(&rebuilt, cursor) {
        Some(replacement) => Arc::new(replacement),
        None => rebuilt,
    }
}
