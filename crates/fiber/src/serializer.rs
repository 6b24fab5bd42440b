//! Output tree serializer
//!
//! Renders the in-memory output tree as an indented, HTML-like string.
//! Deterministic: properties print in application order. Used by tests and
//! examples to assert on tree shape without walking handles by hand.

use crate::error::Result;
use crate::materialize::TreeMaterializer;
use crate::types::{HandleId, NodeKind, DOCUMENT_TAG, VALUE_PROP};

/// Serializer configuration
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// Text values longer than this are capped with an ellipsis
    pub max_text_length: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            max_text_length: 200,
        }
    }
}

/// Output tree serializer
pub struct OutputSerializer {
    config: SerializerConfig,
}

impl OutputSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Serialize the subtree below a handle
    pub fn serialize(&self, tree: &TreeMaterializer, root: HandleId) -> Result<String> {
        let mut output = String::with_capacity(1024);
        self.serialize_node(tree, root, 0, &mut output)?;
        Ok(output)
    }

    fn serialize_node(
        &self,
        tree: &TreeMaterializer,
        handle: HandleId,
        depth: usize,
        output: &mut String,
    ) -> Result<()> {
        let node = tree.get(handle)?;
        let indent = "  ".repeat(depth);

        match &node.kind {
            // Containers print children only
            NodeKind::Element(tag) if tag == DOCUMENT_TAG => {
                for &child in &node.children {
                    self.serialize_node(tree, child, depth, output)?;
                }
            }
            NodeKind::Element(tag) => {
                output.push_str(&indent);
                output.push('<');
                output.push_str(tag);
                for (name, value) in node.props.iter() {
                    output.push_str(&format!(" {}=\"{}\"", name, value));
                }
                output.push_str(">\n");

                for &child in &node.children {
                    self.serialize_node(tree, child, depth + 1, output)?;
                }

                output.push_str(&indent);
                output.push_str("</");
                output.push_str(tag);
                output.push_str(">\n");
            }
            NodeKind::Text => {
                let value = node
                    .props
                    .get(VALUE_PROP)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                let value = value.trim();
                if !value.is_empty() {
                    output.push_str(&indent);
                    output.push_str(&cap_text(value, self.config.max_text_length));
                    output.push('\n');
                }
            }
        }

        Ok(())
    }
}

impl Default for OutputSerializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Cap text length, appending an ellipsis when truncated
fn cap_text(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        text.to_string()
    } else {
        let mut end = max_len;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::FiberArena;
    use crate::description::Description;
    use crate::types::{Fiber, Props};
    use crate::work;

    fn render_all(description: Description) -> (TreeMaterializer, HandleId) {
        let mut mat = TreeMaterializer::new();
        let container = mat.container();
        let mut arena = FiberArena::new();
        let root = arena.add(Fiber::pass_root(container, description, None));
        arena.set_root(root);

        let mut next = Some(root);
        while let Some(id) = next {
            next = work::advance(&mut arena, id, &mut mat).unwrap();
        }
        work::commit_tree(&arena, root, &mut mat).unwrap();
        (mat, container)
    }

    #[test]
    fn test_serialize_nested_tree() {
        let description = Description::element(
            "div",
            Props::new().with("id", "a"),
            vec![Description::element("span", Props::new(), vec!["hi".into()])],
        );
        let (mat, container) = render_all(description);

        let output = OutputSerializer::new().serialize(&mat, container).unwrap();
        assert_eq!(
            output,
            "<div id=\"a\">\n  <span>\n    hi\n  </span>\n</div>\n"
        );
    }

    #[test]
    fn test_serialize_caps_long_text() {
        let long = "x".repeat(50);
        let description = Description::element("p", Props::new(), vec![long.into()]);
        let (mat, container) = render_all(description);

        let serializer = OutputSerializer::with_config(SerializerConfig { max_text_length: 10 });
        let output = serializer.serialize(&mat, container).unwrap();
        assert!(output.contains("xxxxxxxxxx..."));
    }

    #[test]
    fn test_cap_text_respects_char_boundaries() {
        assert_eq!(cap_text("héllo", 2), "h...");
        assert_eq!(cap_text("short", 10), "short");
    }

    #[test]
    fn test_empty_text_is_skipped() {
        let description = Description::element("p", Props::new(), vec!["   ".into()]);
        let (mat, container) = render_all(description);

        let output = OutputSerializer::new().serialize(&mat, container).unwrap();
        assert_eq!(output, "<p>\n</p>\n");
    }
}
