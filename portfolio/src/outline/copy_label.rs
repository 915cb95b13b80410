//! Labels and payloads for cloned chapters

use regex::Regex;
use serde_json::Value;

/// Payload key identifying an embedded content instance
const SUB_CONTENT_ID_KEY: &str = "subContentId";

/// Strip a trailing copy marker from a label
///
/// "Intro" -> "Intro", "Intro (Copy)" -> "Intro", "Intro (Copy) (3)" -> "Intro"
pub fn base_name(label: &str, copy_marker: &str) -> String {
    let pattern = format!(r"^(.+) {}( \(\d+\))?$", regex::escape(copy_marker));
    let Ok(regex) = Regex::new(&pattern) else {
        return label.to_string();
    };

    regex
        .captures(label)
        .and_then(|captures| captures.get(1))
        .map_or_else(|| label.to_string(), |base| base.as_str().to_string())
}

/// Next free copy number for `base` among `labels`
///
/// A plain copy counts as 1 and "(Copy) (n)" as n; the result is one more
/// than the largest count found, and at least 1.
pub fn next_copy_number<'a, I>(base: &str, labels: I, copy_marker: &str) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    let pattern = format!(
        r"^{} ({})( \((\d+)\))?$",
        regex::escape(base),
        regex::escape(copy_marker)
    );
    let Ok(regex) = Regex::new(&pattern) else {
        return 1;
    };

    labels
        .into_iter()
        .map(|label| match regex.captures(label) {
            Some(captures) => captures
                .get(3)
                .and_then(|number| number.as_str().parse::<u32>().ok())
                .unwrap_or(1),
            None => 0,
        })
        .fold(1, |next, count| next.max(count.saturating_add(1)))
}

/// Label for a copy: the counter is omitted for the first copy
pub fn copy_label(base: &str, number: u32, copy_marker: &str) -> String {
    if number < 2 {
        format!("{} {}", base, copy_marker)
    } else {
        format!("{} {} ({})", base, copy_marker, number)
    }
}

/// Give every embedded content instance a fresh identifier
///
/// An embedded instance is any object holding both a `library` string and a
/// `subContentId`; the walk continues into its children.
pub fn replace_sub_content_ids(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let is_instance = map.get("library").is_some_and(Value::is_string)
                && map.contains_key(SUB_CONTENT_ID_KEY);
            if is_instance {
                map.insert(
                    SUB_CONTENT_ID_KEY.to_string(),
                    Value::String(uuid::Uuid::new_v4().to_string()),
                );
            }
            map.values_mut().for_each(replace_sub_content_ids);
        }
        Value::Array(items) => items.iter_mut().for_each(replace_sub_content_ids),
        _ => {}
    }
}
