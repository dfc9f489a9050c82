//! Attribute view over one resource instance.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ProviderError;

/// The attributes of one resource instance, plus the prior attributes an
/// update starts from.
///
/// Handlers read configuration through the typed getters, write remote
/// values back with [`set`](Self::set), and signal that the remote object is
/// gone with [`clear_id`](Self::clear_id).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    attributes: Map<String, Value>,
    prior: Option<Map<String, Value>>,
}

impl ResourceData {
    /// Build from a state or configuration object. `null` gives empty data.
    pub fn from_value(value: Value) -> Result<Self, ProviderError> {
        Ok(Self {
            attributes: into_object(value)?,
            prior: None,
        })
    }

    /// Build the data for an update from prior and planned state.
    ///
    /// The ID is taken from the prior state when the planned state lacks it.
    pub fn for_update(prior: Value, planned: Value) -> Result<Self, ProviderError> {
        let prior = into_object(prior)?;
        let mut attributes = into_object(planned)?;
        if attributes.get("id").map_or(true, Value::is_null) {
            if let Some(id) = prior.get("id") {
                attributes.insert("id".to_string(), id.clone());
            }
        }
        Ok(Self {
            attributes,
            prior: Some(prior),
        })
    }

    /// The remote object ID, if set.
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    /// The ID, or an error naming the operation that needed it.
    pub fn require_id(&self, operation: &str) -> Result<&str, ProviderError> {
        self.id().ok_or_else(|| {
            ProviderError::InvalidRequest(format!("{} requires a resource ID in state", operation))
        })
    }

    /// Record the remote object ID.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.attributes.insert("id".to_string(), Value::String(id.into()));
    }

    /// Forget the remote object; the instance converts to no state.
    pub fn clear_id(&mut self) {
        self.attributes.remove("id");
    }

    /// The raw value of an attribute. `null` reads as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).filter(|v| !v.is_null())
    }

    /// A string attribute. Empty strings read as absent.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// A bool attribute.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// An int64 attribute.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Deserialize an attribute into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ProviderError> {
        self.get(name)
            .map(|v| {
                serde_json::from_value(v.clone()).map_err(|e| {
                    ProviderError::Validation(format!("attribute '{}': {}", name, e))
                })
            })
            .transpose()
    }

    /// Set an attribute from any serializable value. `None` stores `null`.
    pub fn set<T: Serialize>(&mut self, name: &str, value: T) -> Result<(), ProviderError> {
        let value = serde_json::to_value(value)?;
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    /// Whether the attribute differs from the prior state.
    ///
    /// `null` and absent are equal; `null` and an empty list are not. Without
    /// prior state every set attribute counts as changed.
    pub fn has_change(&self, name: &str) -> bool {
        let prior = self
            .prior
            .as_ref()
            .and_then(|p| p.get(name))
            .filter(|v| !v.is_null());
        prior != self.get(name)
    }

    /// Like [`has_change`](Self::has_change), but empty lists and maps count
    /// as unset.
    pub fn has_value_change(&self, name: &str) -> bool {
        let prior = self
            .prior
            .as_ref()
            .and_then(|p| p.get(name))
            .filter(|v| is_set(v));
        prior != self.attributes.get(name).filter(|v| is_set(v))
    }

    /// The version recorded in the prior state, falling back to the current one.
    pub fn prior_version(&self) -> Option<i64> {
        self.prior
            .as_ref()
            .and_then(|p| p.get("version"))
            .and_then(Value::as_i64)
            .or_else(|| self.get_i64("version"))
    }

    /// Convert back to a state value. A cleared ID yields `null` (no state).
    pub fn into_state(self) -> Value {
        if self.id().is_none() {
            return Value::Null;
        }
        Value::Object(self.attributes)
    }
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>, ProviderError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ProviderError::Validation(format!(
            "expected an object, got {}",
            other
        ))),
    }
}
