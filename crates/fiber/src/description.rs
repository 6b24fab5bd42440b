//! Immutable node descriptions and their builder
//!
//! A description is the declarative input to a render pass: a kind, an
//! insertion-ordered property list, and an ordered child sequence. The typed
//! constructors cannot produce a malformed description; the JSON entry point
//! validates and fails fast instead of coercing.

use serde_json::Value;

use crate::error::{FiberError, Result};
use crate::types::{NodeKind, PropValue, Props, CHILDREN_PROP, TEXT_TAG, VALUE_PROP};

/// Immutable, declarative specification of one node and its children
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub kind: NodeKind,
    pub props: Props,
    /// Ordered child descriptions; order is the attach order
    pub children: Vec<Description>,
}

impl Description {
    /// Describe a structural node.
    ///
    /// Children may mix descriptions and raw primitives thanks to the `From`
    /// conversions below:
    ///
    /// ```
    /// use fiber::{Description, Props};
    ///
    /// let d = Description::element(
    ///     "div",
    ///     Props::new().with("id", "a"),
    ///     vec![Description::element("span", Props::new(), vec!["hi".into()])],
    /// );
    /// assert_eq!(d.children.len(), 1);
    /// ```
    pub fn element(
        tag: impl Into<String>,
        props: Props,
        children: Vec<Description>,
    ) -> Self {
        Self {
            kind: NodeKind::from_tag(&tag.into()),
            props,
            children,
        }
    }

    /// Describe a primitive text leaf carrying `value`
    pub fn text(value: impl Into<PropValue>) -> Self {
        Self {
            kind: NodeKind::Text,
            props: Props::new().with(VALUE_PROP, value),
            children: Vec::new(),
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind.is_text()
    }

    /// Parse a description from its JSON form, failing fast on anything
    /// malformed.
    ///
    /// Input shape:
    /// ```json
    /// {
    ///   "kind": "div",
    ///   "props": { "id": "a" },
    ///   "children": [ "hi", { "kind": "span" } ]
    /// }
    /// ```
    ///
    /// Raw strings and numbers inside `children` normalize to text
    /// descriptions, matching the typed builder.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            FiberError::InvalidDescription("description must be a JSON object".to_string())
        })?;

        let tag = obj
            .get("kind")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                FiberError::InvalidDescription("missing or non-string 'kind'".to_string())
            })?;

        let mut props = Props::new();
        if let Some(raw_props) = obj.get("props") {
            let map = raw_props.as_object().ok_or_else(|| {
                FiberError::InvalidDescription("'props' must be a JSON object".to_string())
            })?;
            for (name, raw) in map {
                if name == CHILDREN_PROP {
                    return Err(FiberError::InvalidDescription(format!(
                        "'{}' is a reserved property name",
                        CHILDREN_PROP
                    )));
                }
                props.set(name.as_str(), parse_prop_value(name, raw)?);
            }
        }

        let mut children = Vec::new();
        if let Some(raw_children) = obj.get(CHILDREN_PROP) {
            let list = raw_children.as_array().ok_or_else(|| {
                FiberError::InvalidDescription("'children' must be a JSON array".to_string())
            })?;
            for child in list {
                children.push(parse_child(child)?);
            }
        }

        if tag == TEXT_TAG && !children.is_empty() {
            return Err(FiberError::InvalidDescription(
                "text nodes cannot carry children".to_string(),
            ));
        }

        Ok(Self {
            kind: NodeKind::from_tag(tag),
            props,
            children,
        })
    }

    /// Parse a description from a JSON string
    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json(&value)
    }
}

fn parse_child(value: &Value) -> Result<Description> {
    match value {
        // Raw primitives become text descriptions, preserving the value
        Value::String(s) => Ok(Description::text(s.as_str())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Description::text(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Description::text(f))
            } else {
                Err(FiberError::InvalidDescription(format!(
                    "unrepresentable numeric child: {}",
                    n
                )))
            }
        }
        Value::Object(_) => Description::from_json(value),
        other => Err(FiberError::InvalidDescription(format!(
            "child must be a description, string, or number, got {}",
            other
        ))),
    }
}

fn parse_prop_value(name: &str, value: &Value) -> Result<PropValue> {
    match value {
        Value::String(s) => Ok(PropValue::Text(s.clone())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(PropValue::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(PropValue::Float(f))
            } else {
                Err(FiberError::InvalidDescription(format!(
                    "unrepresentable numeric value for property '{}'",
                    name
                )))
            }
        }
        Value::Bool(b) => Ok(PropValue::Bool(*b)),
        Value::Null => Ok(PropValue::Null),
        other => Err(FiberError::InvalidDescription(format!(
            "unsupported value for property '{}': {}",
            name, other
        ))),
    }
}

// Primitive children normalize to text descriptions, so callers can mix
// descriptions and raw values in a child list via `.into()`.

impl From<&str> for Description {
    fn from(value: &str) -> Self {
        Description::text(value)
    }
}

impl From<String> for Description {
    fn from(value: String) -> Self {
        Description::text(value)
    }
}

impl From<i64> for Description {
    fn from(value: i64) -> Self {
        Description::text(value)
    }
}

impl From<i32> for Description {
    fn from(value: i32) -> Self {
        Description::text(value)
    }
}

impl From<f64> for Description {
    fn from(value: f64) -> Self {
        Description::text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_preserves_child_order() {
        let d = Description::element(
            "list",
            Props::new(),
            vec![
                Description::element("row", Props::new().with("n", 0), vec![]),
                "middle".into(),
                Description::element("row", Props::new().with("n", 2), vec![]),
            ],
        );

        assert_eq!(d.children.len(), 3);
        assert_eq!(d.children[0].props.get("n"), Some(&PropValue::Int(0)));
        assert!(d.children[1].is_text());
        assert_eq!(d.children[2].props.get("n"), Some(&PropValue::Int(2)));
    }

    #[test]
    fn test_primitive_children_become_text() {
        let hi: Description = "hi".into();
        assert_eq!(hi.kind, NodeKind::Text);
        assert_eq!(hi.props.get(VALUE_PROP), Some(&PropValue::Text("hi".to_string())));
        assert!(hi.children.is_empty());

        let n: Description = 42.into();
        assert_eq!(n.props.get(VALUE_PROP), Some(&PropValue::Int(42)));
    }

    #[test]
    fn test_from_json_simple() {
        let raw = serde_json::json!({
            "kind": "div",
            "props": { "id": "a" },
            "children": [
                { "kind": "span", "children": ["hi"] }
            ]
        });

        let d = Description::from_json(&raw).unwrap();
        assert_eq!(d.kind, NodeKind::Element("div".to_string()));
        assert_eq!(d.props.get("id"), Some(&PropValue::Text("a".to_string())));
        assert_eq!(d.children.len(), 1);

        let span = &d.children[0];
        assert_eq!(span.children.len(), 1);
        assert!(span.children[0].is_text());
    }

    #[test]
    fn test_from_json_missing_kind() {
        let raw = serde_json::json!({ "props": {} });
        let err = Description::from_json(&raw).unwrap_err();
        assert!(matches!(err, FiberError::InvalidDescription(_)));
    }

    #[test]
    fn test_from_json_children_must_be_array() {
        let raw = serde_json::json!({ "kind": "div", "children": "hi" });
        let err = Description::from_json(&raw).unwrap_err();
        assert!(matches!(err, FiberError::InvalidDescription(_)));
    }

    #[test]
    fn test_from_json_reserved_prop_name() {
        let raw = serde_json::json!({ "kind": "div", "props": { "children": [] } });
        let err = Description::from_json(&raw).unwrap_err();
        assert!(matches!(err, FiberError::InvalidDescription(_)));
    }

    #[test]
    fn test_from_json_text_with_children_rejected() {
        let raw = serde_json::json!({ "kind": "#text", "children": ["nested"] });
        let err = Description::from_json(&raw).unwrap_err();
        assert!(matches!(err, FiberError::InvalidDescription(_)));
    }

    #[test]
    fn test_from_json_str_bad_syntax_is_parse_error() {
        let err = Description::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, FiberError::Parse(_)));
    }
}
