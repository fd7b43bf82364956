use serde::{Deserialize, Serialize};

/// A single field assignment on a synthesized object.
///
/// Every value produced for a row shares that row's `legacy_id`; values with
/// the same `object_id` describe the same object. When `is_reference` is set,
/// `value` designates another object (an `object_id` of the same row or a
/// reference literal) rather than holding a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ETLValue {
    pub object_id: String,
    pub archetype: String,
    pub legacy_id: String,
    pub name: String,
    /// Collection slot, `-1` when the field is not a collection.
    pub index: i32,
    pub value: String,
    pub is_reference: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let value = ETLValue {
            object_id: "ID1.1".into(),
            archetype: "party.customerperson".into(),
            legacy_id: "ID1".into(),
            name: "contacts".into(),
            index: 0,
            value: "ID1.2".into(),
            is_reference: true,
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["objectId"], "ID1.1");
        assert_eq!(json["legacyId"], "ID1");
        assert_eq!(json["isReference"], true);
        assert_eq!(json["index"], 0);
    }
}
