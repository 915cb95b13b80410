//! Portfolio-wide edits inside chapter payloads

use serde_json::Value;

/// Flag marking a content item the author hid
pub const HIDDEN_KEY: &str = "isHidden";

/// Page decoration that can be switched on or off for every chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFooter {
    Header,
    Footer,
}

impl HeaderFooter {
    /// Per-chapter payload field holding the switch
    pub fn field_name(self) -> &'static str {
        match self {
            HeaderFooter::Header => "displayHeader",
            HeaderFooter::Footer => "displayFooter",
        }
    }
}

/// Drop every array item that is an object flagged as hidden
///
/// Returns the number of removed items. Nested arrays of kept items are
/// searched as well; the payload root itself is never removed.
pub fn remove_hidden(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => map.values_mut().map(remove_hidden).sum(),
        Value::Array(items) => {
            let before = items.len();
            items.retain(|item| !is_hidden(item));
            let removed = before - items.len();
            removed + items.iter_mut().map(remove_hidden).sum::<usize>()
        }
        _ => 0,
    }
}

fn is_hidden(item: &Value) -> bool {
    item.get(HIDDEN_KEY).and_then(Value::as_bool).unwrap_or(false)
}

/// Set the header or footer switch of one chapter payload
///
/// Returns `true` when the stored value changed.
pub fn set_display(value: &mut Value, part: HeaderFooter, state: bool) -> bool {
    let Some(map) = value.as_object_mut() else {
        return false;
    };

    let field = part.field_name();
    if map.get(field).and_then(Value::as_bool) == Some(state) {
        return false;
    }
    map.insert(field.to_string(), Value::Bool(state));
    true
}
