//! JSON merge helper for layered configuration.

use serde_json::Value;
use serde_json::map::Entry;

/// Apply `overlay` on top of `base`.
///
/// Objects merge key by key; any other overlay value replaces the base value
/// outright, including arrays and `null`.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    let (Value::Object(target), Value::Object(incoming)) = (&mut *base, overlay) else {
        *base = overlay.clone();
        return;
    };
    for (key, value) in incoming {
        match target.entry(key.as_str()) {
            Entry::Occupied(mut slot) => merge_json_values(slot.get_mut(), value),
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::merge_json_values;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn null_overlay_clears_a_value() {
        let mut base = json!({ "session": { "welcome_message": "hi", "user_id": "u1" } });
        merge_json_values(&mut base, &json!({ "session": { "welcome_message": null } }));
        assert_eq!(
            base,
            json!({ "session": { "welcome_message": null, "user_id": "u1" } })
        );
    }

    #[test]
    fn nested_objects_merge_and_scalars_override() {
        let mut base = json!({ "client": { "model": "a", "max_tokens": 10 }, "keep": true });
        merge_json_values(&mut base, &json!({ "client": { "model": "b" }, "new": [1] }));
        assert_eq!(
            base,
            json!({ "client": { "model": "b", "max_tokens": 10 }, "keep": true, "new": [1] })
        );
    }
}
