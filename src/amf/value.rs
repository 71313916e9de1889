use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Generic value decoded from an AMF0/AMF3 payload.
///
/// Mixed AMF3 arrays (dense + associative part) and AMF0 ECMA arrays decode to
/// `Object` with no class name; dense entries get their index as key.
#[derive(Debug, Clone, PartialEq)]
pub enum AmfValue {
    Undefined,
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Date(DateTime<Utc>),
    Xml(String),
    ByteArray(Vec<u8>),
    Array(Vec<AmfValue>),
    Object {
        class_name: Option<String>,
        fields: BTreeMap<String, AmfValue>,
    },
    Dictionary(Vec<(AmfValue, AmfValue)>),
}

impl AmfValue {
    /// Anonymous object from `(key, value)` pairs.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, AmfValue)>,
        K: Into<String>,
    {
        AmfValue::Object {
            class_name: None,
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Field lookup on objects; `None` for every other kind.
    pub fn get(&self, key: &str) -> Option<&AmfValue> {
        match self {
            AmfValue::Object { fields, .. } => fields.get(key),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, AmfValue>> {
        match self {
            AmfValue::Object { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            AmfValue::Object { class_name, .. } => class_name.as_deref(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AmfValue::Null | AmfValue::Undefined)
    }

    /// Integers, and doubles that hold an integral value (AMF0 only has doubles).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AmfValue::Integer(n) => Some(*n),
            AmfValue::Double(d) if d.fract() == 0.0 && d.is_finite() => Some(*d as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AmfValue::Integer(n) => Some(*n as f64),
            AmfValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AmfValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AmfValue::String(s) | AmfValue::Xml(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AmfValue]> {
        match self {
            AmfValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            AmfValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// JSON-friendly rendering: dates as RFC 3339, byte arrays as hex, class
/// names dropped, dictionaries as `[key, value]` pairs.
impl Serialize for AmfValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AmfValue::Undefined | AmfValue::Null => serializer.serialize_none(),
            AmfValue::Bool(b) => serializer.serialize_bool(*b),
            AmfValue::Integer(n) => serializer.serialize_i64(*n),
            AmfValue::Double(d) => serializer.serialize_f64(*d),
            AmfValue::String(s) | AmfValue::Xml(s) => serializer.serialize_str(s),
            AmfValue::Date(d) => {
                serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            AmfValue::ByteArray(bytes) => serializer.serialize_str(&hex::encode(bytes)),
            AmfValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            AmfValue::Object { fields, .. } => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            AmfValue::Dictionary(pairs) => {
                let mut seq = serializer.serialize_seq(Some(pairs.len()))?;
                for (key, value) in pairs {
                    seq.serialize_element(&(key, value))?;
                }
                seq.end()
            }
        }
    }
}
