//! Chapter records

use super::hierarchy::HierarchyPath;
use serde_json::{Map, Value};

/// Payload key that stores the encoded hierarchy path
pub const HIERARCHY_KEY: &str = "chapterHierarchy";

/// JSON pointer to the chapter label inside the payload
const TITLE_POINTER: &str = "/content/metadata/title";

/// One node of the outline
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    /// Position in the outline tree
    pub path: HierarchyPath,
    /// Host-owned content; only the label is interpreted here
    pub payload: Value,
}

impl Chapter {
    /// Create a chapter with an empty payload
    pub fn new(path: HierarchyPath) -> Self {
        Self {
            path,
            payload: Value::Object(Map::new()),
        }
    }

    /// Read a chapter from a stored payload
    ///
    /// Returns `None` when the payload carries no valid hierarchy path.
    pub fn from_value(value: Value) -> Option<Self> {
        let path = value
            .get(HIERARCHY_KEY)
            .and_then(Value::as_str)
            .and_then(HierarchyPath::parse)?;

        Some(Self {
            path,
            payload: value,
        })
    }

    /// Payload with the current hierarchy path written into it
    pub fn to_value(&self) -> Value {
        let mut value = self.payload.clone();
        if let Some(object) = value.as_object_mut() {
            object.insert(
                HIERARCHY_KEY.to_string(),
                Value::String(self.path.to_string()),
            );
        }
        value
    }

    /// Nesting depth (1 = top level)
    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    /// Label stored in the payload, if any
    pub fn label(&self) -> Option<&str> {
        self.payload
            .pointer(TITLE_POINTER)
            .and_then(Value::as_str)
            .filter(|title| !title.trim().is_empty())
    }

    /// Store a new label in the payload, creating intermediate objects
    pub fn set_label(&mut self, label: &str) {
        let mut node = &mut self.payload;
        for key in ["content", "metadata"] {
            node = ensure_object(node)
                .entry(key)
                .or_insert_with(|| Value::Object(Map::new()));
        }
        ensure_object(node).insert("title".to_string(), Value::String(label.to_string()));
    }
}

/// Coerce a JSON node into an object, replacing scalars
fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced by an object"),
    }
}
