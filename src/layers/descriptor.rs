//! Layer descriptors and their parameter maps
//!
//! A descriptor is one instance of a [`LayerKind`] with concrete parameter
//! values and an identity that never changes after creation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::kind::LayerKind;

/// Stable identifier of a layer descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(Uuid);

impl LayerId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single parameter value: number, string or boolean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Interpret as a non-negative integer
    ///
    /// Floats with no fractional part and numeric strings are accepted, since
    /// form inputs often arrive that way.
    pub fn as_uint(&self) -> Option<usize> {
        match self {
            ParamValue::Int(v) => usize::try_from(*v).ok(),
            ParamValue::Float(v) if v.fract() == 0.0 && *v >= 0.0 && *v <= u32::MAX as f64 => {
                Some(*v as usize)
            }
            ParamValue::Text(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        i64::try_from(v)
            .map(ParamValue::Int)
            .unwrap_or(ParamValue::Float(v as f64))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Parameter map of a layer, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerParams(BTreeMap<String, ParamValue>);

impl LayerParams {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    /// Set a single parameter, returning the previous value
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.0.insert(name.to_string(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Read a required non-negative integer parameter
    ///
    /// The error is a human-readable reason fragment, e.g. "is missing".
    pub fn require_uint(&self, name: &str) -> std::result::Result<usize, String> {
        match self.0.get(name) {
            None => Err("is missing".to_string()),
            Some(value) => value
                .as_uint()
                .ok_or_else(|| format!("must be a non-negative integer (got '{}')", value)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}

impl fmt::Display for LayerParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// One layer of an architecture
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    /// Assigned at creation, never reassigned
    pub id: LayerId,
    pub kind: LayerKind,
    pub params: LayerParams,
}

impl LayerDescriptor {
    /// Create a descriptor with a fresh id
    pub fn new(kind: LayerKind, params: LayerParams) -> Self {
        Self {
            id: LayerId::new(),
            kind,
            params,
        }
    }

    pub fn to_serialized(&self) -> SerializedLayer {
        SerializedLayer {
            kind: self.kind,
            params: self.params.clone(),
        }
    }
}

/// Wire form of a layer: `{ "type": <label>, "params": {...} }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedLayer {
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(default)]
    pub params: LayerParams,
}

impl SerializedLayer {
    pub fn new(kind: LayerKind, params: LayerParams) -> Self {
        Self { kind, params }
    }

    /// Instantiate as a descriptor with a freshly generated id
    pub fn into_descriptor(self) -> LayerDescriptor {
        LayerDescriptor::new(self.kind, self.params)
    }
}

/// Wire form of an architecture: ordered list of serialized layers
pub type SerializedArchitecture = Vec<SerializedLayer>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = LayerDescriptor::new(LayerKind::Dense, LayerParams::new());
        let b = LayerDescriptor::new(LayerKind::Dense, LayerParams::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_param_value_as_uint() {
        assert_eq!(ParamValue::Int(32).as_uint(), Some(32));
        assert_eq!(ParamValue::Float(3.0).as_uint(), Some(3));
        assert_eq!(ParamValue::Text(" 64 ".into()).as_uint(), Some(64));
        assert_eq!(ParamValue::Int(-1).as_uint(), None);
        assert_eq!(ParamValue::Float(2.5).as_uint(), None);
        assert_eq!(ParamValue::Bool(true).as_uint(), None);
    }

    #[test]
    fn test_require_uint_reasons() {
        let params = LayerParams::new()
            .with("filters", 32)
            .with("activation", "relu");

        assert_eq!(params.require_uint("filters"), Ok(32));
        assert_eq!(params.require_uint("stride"), Err("is missing".to_string()));
        assert!(params
            .require_uint("activation")
            .unwrap_err()
            .contains("non-negative integer"));
    }

    #[test]
    fn test_serialized_layer_wire_format() {
        let layer = SerializedLayer::new(
            LayerKind::MaxPool,
            LayerParams::new().with("poolSize", 2).with("stride", 2),
        );
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "Max Pooling", "params": {"poolSize": 2, "stride": 2}})
        );
    }

    #[test]
    fn test_untagged_values_keep_their_type() {
        let params: LayerParams =
            serde_json::from_str(r#"{"rate": 0.5, "units": 10, "activation": "softmax", "bias": true}"#)
                .unwrap();

        assert_eq!(params.get("rate"), Some(&ParamValue::Float(0.5)));
        assert_eq!(params.get("units"), Some(&ParamValue::Int(10)));
        assert_eq!(params.get("activation"), Some(&ParamValue::Text("softmax".into())));
        assert_eq!(params.get("bias"), Some(&ParamValue::Bool(true)));
    }

    #[test]
    fn test_missing_params_default_to_empty() {
        let layer: SerializedLayer = serde_json::from_str(r#"{"type": "Flatten"}"#).unwrap();
        assert_eq!(layer.kind, LayerKind::Flatten);
        assert!(layer.params.is_empty());
    }
}
