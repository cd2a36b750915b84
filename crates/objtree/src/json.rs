//! Browsing parsed JSON documents

use serde_json::Value as Json;

use crate::error::InspectError;
use crate::inspect::{Inspect, SortKey};

impl Inspect for Json {
    fn type_name(&self) -> String {
        match self {
            Json::Null => "null",
            Json::Bool(_) => "boolean",
            Json::Number(n) if n.is_f64() => "float",
            Json::Number(_) => "integer",
            Json::String(_) => "string",
            Json::Array(_) => "array",
            Json::Object(_) => "object",
        }
        .to_string()
    }

    fn is_sequence(&self) -> bool {
        self.is_array()
    }

    fn sequence_items(&self) -> Result<Vec<Json>, InspectError> {
        match self {
            Json::Array(items) => Ok(items.clone()),
            _ => Err(self.unsupported("sequence iteration")),
        }
    }

    fn is_mapping(&self) -> bool {
        self.is_object()
    }

    fn mapping_entries(&self) -> Result<Vec<(Json, Json)>, InspectError> {
        match self {
            Json::Object(map) => Ok(map
                .iter()
                .map(|(k, v)| (Json::String(k.clone()), v.clone()))
                .collect()),
            _ => Err(self.unsupported("mapping iteration")),
        }
    }

    fn to_text(&self) -> Result<String, InspectError> {
        match self {
            Json::String(s) => Ok(s.clone()),
            _ => self.repr(),
        }
    }

    fn repr(&self) -> Result<String, InspectError> {
        serde_json::to_string(self).map_err(|e| InspectError::raised(e.to_string()))
    }

    fn pretty(&self) -> Result<String, InspectError> {
        serde_json::to_string_pretty(self).map_err(|e| InspectError::raised(e.to_string()))
    }

    fn length(&self) -> Option<usize> {
        match self {
            Json::String(s) => Some(s.chars().count()),
            Json::Array(items) => Some(items.len()),
            Json::Object(map) => Some(map.len()),
            _ => None,
        }
    }

    fn sort_key(&self) -> Option<SortKey> {
        match self {
            Json::Bool(b) => Some(SortKey::Bool(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Some(SortKey::Int(i)),
                None => n.as_f64().map(SortKey::Float),
            },
            Json::String(s) => Some(SortKey::Text(s.clone())),
            _ => None,
        }
    }

    fn is_leaf_hint(&self) -> bool {
        match self {
            Json::Array(items) => items.is_empty(),
            Json::Object(map) => map.is_empty(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerate::{enumerate, EnumerateOptions};
    use serde_json::json;

    #[test]
    fn test_json_children() {
        let doc = json!({"b": [true, null], "a": 1.5});
        let e = enumerate(&doc, "doc", &EnumerateOptions::default()).unwrap();
        let paths: Vec<_> = e.children.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["doc[\"a\"]", "doc[\"b\"]"]);
        assert_eq!(e.children[0].name, "a");
        assert!(e.skipped.is_empty());

        let b = &e.children[1].value;
        let inner = enumerate(b, "doc[\"b\"]", &EnumerateOptions::default()).unwrap();
        assert_eq!(inner.children[1].path, "doc[\"b\"][1]");
        assert_eq!(inner.children[1].value.repr().unwrap(), "null");
    }

    #[test]
    fn test_json_descriptions() {
        assert_eq!(json!("hi").to_text().unwrap(), "hi");
        assert_eq!(json!("hi").repr().unwrap(), "\"hi\"");
        assert_eq!(json!(3).type_name(), "integer");
        assert_eq!(json!(3.5).type_name(), "float");
        assert_eq!(json!([1, 2]).length(), Some(2));
        assert!(json!([1, 2]).pretty().unwrap().contains('\n'));
        assert!(json!({}).is_leaf_hint());
        assert!(!json!({"k": 0}).is_leaf_hint());
    }
}
