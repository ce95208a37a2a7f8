// GraphSON 2 values carry `{"@type": ..., "@value": ...}` wrappers. Records
// are printed as plain JSON, so the wrappers are removed before a result
// reaches the reporter.

use serde_json::{Map, Value};

/// Strip GraphSON type wrappers recursively.
///
/// `g:Map` values (a flat list of alternating keys and values) become JSON
/// objects; non-string keys are rendered with their JSON text. Plain JSON
/// passes through unchanged.
pub fn untype(value: Value) -> Value {
    match value {
        Value::Object(mut map) if is_typed(&map) => {
            let type_name = map.remove("@type");
            let inner = map.remove("@value").unwrap_or(Value::Null);
            match type_name.as_ref().and_then(Value::as_str) {
                Some("g:Map") => map_from_pairs(inner),
                _ => untype(inner),
            }
        }
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, untype(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(untype).collect()),
        other => other,
    }
}

fn is_typed(map: &Map<String, Value>) -> bool {
    map.len() == 2
        && map.get("@type").is_some_and(Value::is_string)
        && map.contains_key("@value")
}

fn map_from_pairs(inner: Value) -> Value {
    let Value::Array(items) = inner else {
        return untype(inner);
    };

    let mut out = Map::new();
    let mut iter = items.into_iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        let key = match untype(key) {
            Value::String(s) => s,
            other => other.to_string(),
        };
        out.insert(key, untype(value));
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_is_untouched() {
        let value = json!({"id": "thanksgiving", "label": "Holiday", "properties": {"name": [{"value": "Thanksgiving"}]}});
        assert_eq!(untype(value.clone()), value);
    }

    #[test]
    fn scalar_and_list_wrappers_are_removed() {
        let value = json!({"@type": "g:List", "@value": [
            {"@type": "g:Int64", "@value": 42},
            "Holiday"
        ]});
        assert_eq!(untype(value), json!([42, "Holiday"]));
    }

    #[test]
    fn graphson_maps_become_objects() {
        let value = json!({"@type": "g:Map", "@value": [
            "2021-12-25", {"@type": "g:Int64", "@value": 3},
            {"@type": "g:Int32", "@value": 7}, "seven"
        ]});
        assert_eq!(untype(value), json!({"2021-12-25": 3, "7": "seven"}));
    }

    #[test]
    fn nested_vertex_properties_are_unwrapped() {
        let value = json!({"@type": "g:Vertex", "@value": {
            "id": {"@type": "g:Int32", "@value": 1},
            "label": "Country",
            "properties": {"name": [{"@type": "g:VertexProperty", "@value": {"value": "Mexico"}}]}
        }});
        assert_eq!(
            untype(value),
            json!({"id": 1, "label": "Country", "properties": {"name": [{"value": "Mexico"}]}})
        );
    }

    #[test]
    fn objects_that_only_look_typed_are_kept() {
        let value = json!({"@type": "note", "@value": 1, "extra": true});
        assert_eq!(untype(value.clone()), value);
    }
}
