/*
Rendering of process trees for the terminal.

The label helpers only read a node's fields; they are what a presentation layer
needs to caption a step (its generation name and how much hangs below it).
 */
use itertools::Itertools;
use termtree::Tree;
use tracing::instrument;

use crate::domain::Node;

/// Generation name of a depth: `root`, `child`, `grandchild`, `grandgrandchild`, ...
pub fn depth_name(depth: usize) -> String {
    match depth {
        0 => "root".to_string(),
        d => format!("{}child", "grand".repeat(d - 1)),
    }
}

/// `branches: n max depth: h`, each part omitted when zero.
pub fn descendant_summary(node: &Node) -> String {
    let branches = node.children().len();
    let height = node.height();
    let mut parts = Vec::new();
    if branches > 0 {
        parts.push(format!("branches: {branches}"));
    }
    if height > 0 {
        parts.push(format!("max depth: {height}"));
    }
    parts.join(" ")
}

fn format_fields<'a>(fields: impl IntoIterator<Item = (&'a String, &'a String)>) -> String {
    format!(
        "{{{}}}",
        fields
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .join(", ")
    )
}

/// One-line caption: generation, short id, summary, properties, evaluations.
pub fn node_label(node: &Node, short_id_len: usize) -> String {
    let mut label = format!("{} #{}", depth_name(node.depth()), node.id().short(short_id_len));
    let summary = descendant_summary(node);
    if !summary.is_empty() {
        label.push_str(&format!(" ({summary})"));
    }
    label.push(' ');
    label.push_str(&format_fields(node.properties()));
    if !node.evaluations().is_empty() {
        let evaluations = node
            .evaluations()
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{i}:{}", format_fields(e)))
            .join(" ");
        label.push_str(&format!(" evaluations: {evaluations}"));
    }
    label
}

pub trait TreeNodeConvert {
    fn to_tree_string(&self, short_id_len: usize) -> Tree<String>;
}

impl TreeNodeConvert for Node {
    #[instrument(level = "trace", skip(self))]
    fn to_tree_string(&self, short_id_len: usize) -> Tree<String> {
        // Recursively construct the children
        let leaves: Vec<_> = self
            .children()
            .iter()
            .map(|c| c.to_tree_string(short_id_len))
            .collect();

        Tree::new(node_label(self, short_id_len)).with_leaves(leaves)
    }
}
