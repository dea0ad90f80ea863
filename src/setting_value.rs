use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A value stored under a workspace file's open-ended `settings` object.
///
/// The set of shapes is closed. Decoding tries bool, then integer, then
/// float, then string, then array, then object; anything else (notably JSON
/// `null`) is rejected. Objects keep their keys in a `BTreeMap` so they always
/// serialize sorted.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<SettingValue>),
    Object(BTreeMap<String, SettingValue>),
}

impl SettingValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl Serialize for SettingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Float(value) => {
                if !value.is_finite() {
                    return Err(S::Error::custom(format!(
                        "non-finite float {value} is not a supported setting value"
                    )));
                }
                serializer.serialize_f64(*value)
            }
            Self::String(value) => serializer.serialize_str(value),
            Self::Array(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Self::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

struct SettingValueVisitor;

impl<'de> Visitor<'de> for SettingValueVisitor {
    type Value = SettingValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a bool, number, string, array or object")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(SettingValue::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(SettingValue::Integer(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        match i64::try_from(value) {
            Ok(value) => Ok(SettingValue::Integer(value)),
            Err(_) => Ok(SettingValue::Float(value as f64)),
        }
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(SettingValue::Float(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(SettingValue::String(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(SettingValue::String(value))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(value) = seq.next_element::<SettingValue>()? {
            values.push(value);
        }
        Ok(SettingValue::Array(values))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<String, SettingValue>()? {
            entries.insert(key, value);
        }
        Ok(SettingValue::Object(entries))
    }
}

impl<'de> Deserialize<'de> for SettingValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SettingValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> serde_json::Result<SettingValue> {
        serde_json::from_str(raw)
    }

    #[test]
    fn booleans_are_not_read_as_integers() {
        assert_eq!(decode("true").unwrap(), SettingValue::Bool(true));
        assert_eq!(decode("false").unwrap(), SettingValue::Bool(false));
    }

    #[test]
    fn integral_numbers_prefer_integer_over_float() {
        assert_eq!(decode("42").unwrap(), SettingValue::Integer(42));
        assert_eq!(decode("-7").unwrap(), SettingValue::Integer(-7));
        assert_eq!(decode("1.5").unwrap(), SettingValue::Float(1.5));
    }

    #[test]
    fn integers_beyond_i64_fall_back_to_float() {
        let value = decode("18446744073709551615").unwrap();
        assert_eq!(value.kind(), "float");
    }

    #[test]
    fn null_is_rejected() {
        assert!(decode("null").is_err());
        assert!(decode(r#"{"a": [1, null]}"#).is_err());
    }

    #[test]
    fn nested_objects_serialize_with_sorted_keys() {
        let value = decode(r#"{"zeta": 1, "alpha": {"b": true, "a": "x"}}"#).unwrap();
        let encoded = serde_json::to_string(&value).unwrap();
        assert_eq!(encoded, r#"{"alpha":{"a":"x","b":true},"zeta":1}"#);
    }

    #[test]
    fn non_finite_floats_fail_to_encode() {
        let value = SettingValue::Array(vec![SettingValue::Float(f64::NAN)]);
        assert!(serde_json::to_string(&value).is_err());
    }
}
