//! Planning: the state a resource will have after apply, and what changes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{Attribute, AttributeType, Schema};

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<Value>,
    /// The value after the change (None if deleting).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            before: None,
            after: Some(value),
        }
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            before: Some(value),
            after: None,
        }
    }

    /// Create a change for a modified attribute.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self {
            path: path.into(),
            before: Some(before),
            after: Some(after),
        }
    }
}

impl From<crate::generated::AttributeChange> for AttributeChange {
    fn from(proto: crate::generated::AttributeChange) -> Self {
        let decode = |bytes: &[u8]| -> Option<Value> {
            if bytes.is_empty() {
                None
            } else {
                serde_json::from_slice(bytes).ok()
            }
        };
        Self {
            path: proto.path,
            before: decode(&proto.before),
            after: decode(&proto.after),
        }
    }
}

impl From<AttributeChange> for crate::generated::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        let encode = |value: Option<Value>| {
            value
                .map(|v| serde_json::to_vec(&v).unwrap_or_default())
                .unwrap_or_default()
        };
        Self {
            path: change.path,
            before: encode(change.before),
            after: encode(change.after),
        }
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation; `null` when deleting.
    pub planned_state: Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Whether applying the plan does anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Plan a create, update or delete of one resource.
///
/// `prior` is `null` for a create; `proposed` is `null` for a delete.
pub fn plan_resource(schema: &Schema, prior: &Value, proposed: &Value) -> PlanResult {
    if proposed.is_null() {
        return plan_delete(prior);
    }

    let mut planned = proposed.as_object().cloned().unwrap_or_default();
    fill_defaults(schema, &mut planned);

    match prior.as_object() {
        None => plan_create(planned),
        Some(prior) => plan_update(schema, prior, planned),
    }
}

fn plan_create(planned: Map<String, Value>) -> PlanResult {
    let changes = planned
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(name, v)| AttributeChange::added(name.clone(), v.clone()))
        .collect();

    PlanResult {
        planned_state: Value::Object(planned),
        changes,
        requires_replace: false,
    }
}

fn plan_update(
    schema: &Schema,
    prior: &Map<String, Value>,
    mut planned: Map<String, Value>,
) -> PlanResult {
    for (name, attr) in &schema.attributes {
        if attr.flags.computed && non_null(planned.get(name)).is_none() {
            if let Some(value) = non_null(prior.get(name)) {
                planned.insert(name.clone(), value.clone());
            }
        }
    }

    let mut changes = Vec::new();
    let mut requires_replace = false;

    for (name, attr) in &schema.attributes {
        if attr.flags.is_computed_only() {
            continue;
        }

        let before = present(attr, prior.get(name));
        let after = present(attr, planned.get(name));
        let change = match (before, after) {
            (None, None) => continue,
            (Some(before), Some(after)) if same_value(&attr.attr_type, before, after) => continue,
            (Some(before), Some(after)) => {
                AttributeChange::modified(name.clone(), before.clone(), after.clone())
            }
            (None, Some(after)) => AttributeChange::added(name.clone(), after.clone()),
            (Some(before), None) => AttributeChange::removed(name.clone(), before.clone()),
        };

        requires_replace |= attr.force_new;
        changes.push(change);
    }

    PlanResult {
        planned_state: Value::Object(planned),
        changes,
        requires_replace,
    }
}

fn plan_delete(prior: &Value) -> PlanResult {
    let changes = prior
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(name, v)| AttributeChange::removed(name.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default();

    PlanResult {
        planned_state: Value::Null,
        changes,
        requires_replace: false,
    }
}

fn fill_defaults(schema: &Schema, planned: &mut Map<String, Value>) {
    for (name, attr) in &schema.attributes {
        if let Some(default) = &attr.default {
            if non_null(planned.get(name)).is_none() {
                planned.insert(name.clone(), default.clone());
            }
        }
    }
}

/// Equality with sets compared regardless of element order.
fn same_value(attr_type: &AttributeType, a: &Value, b: &Value) -> bool {
    match (attr_type, a.as_array(), b.as_array()) {
        (AttributeType::Set(_), Some(a), Some(b)) => {
            let mut a: Vec<String> = a.iter().map(Value::to_string).collect();
            let mut b: Vec<String> = b.iter().map(Value::to_string).collect();
            a.sort();
            b.sort();
            a == b
        }
        _ => a == b,
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// The value if it counts as set for `attr`.
fn present<'a>(attr: &Attribute, value: Option<&'a Value>) -> Option<&'a Value> {
    non_null(value).filter(|v| !(attr.empty_as_null && is_empty_collection(v)))
}

fn is_empty_collection(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("version", Attribute::computed_int64())
            .with_attribute("key", Attribute::required_string())
            .with_attribute("name", Attribute::localized_string(AttributeFlags::optional()))
            .with_attribute("initial", Attribute::optional_bool().with_default(json!(true)))
            .with_attribute("transitions", Attribute::optional_string_set())
            .with_attribute("roles", Attribute::optional_string_set().with_empty_as_null())
            .with_attribute("product_type", Attribute::optional_string().with_force_new())
    }

    #[test]
    fn test_plan_create_fills_defaults() {
        let plan = plan_resource(&schema(), &Value::Null, &json!({"key": "a", "name": null}));

        assert_eq!(plan.planned_state, json!({"key": "a", "name": null, "initial": true}));
        assert!(!plan.requires_replace);
        let paths: Vec<_> = plan.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["initial", "key"]);
        assert!(plan.changes.iter().all(|c| c.before.is_none()));
    }

    #[test]
    fn test_plan_update_carries_computed() {
        let prior = json!({"id": "abc", "version": 4, "key": "a", "initial": true});
        let plan = plan_resource(&schema(), &prior, &json!({"key": "b"}));

        assert_eq!(plan.planned_state["id"], "abc");
        assert_eq!(plan.planned_state["version"], 4);
        assert_eq!(
            plan.changes,
            vec![AttributeChange::modified("key", json!("a"), json!("b"))]
        );
        assert!(!plan.requires_replace);
    }

    #[test]
    fn test_plan_update_without_changes() {
        let prior = json!({
            "id": "abc",
            "version": 4,
            "key": "a",
            "initial": true,
            "transitions": null
        });
        let plan = plan_resource(&schema(), &prior, &json!({"key": "a"}));
        assert!(!plan.has_changes());
    }

    #[test]
    fn test_plan_update_null_vs_empty_transitions() {
        let prior = json!({"id": "abc", "key": "a", "initial": true, "transitions": null});
        let plan = plan_resource(&schema(), &prior, &json!({"key": "a", "transitions": []}));
        assert_eq!(
            plan.changes,
            vec![AttributeChange::added("transitions", json!([]))]
        );

        let prior = json!({"id": "abc", "key": "a", "initial": true, "transitions": []});
        let plan = plan_resource(&schema(), &prior, &json!({"key": "a", "transitions": null}));
        assert_eq!(
            plan.changes,
            vec![AttributeChange::removed("transitions", json!([]))]
        );
    }

    #[test]
    fn test_plan_empty_matches_unset_when_flagged() {
        let prior = json!({"id": "abc", "key": "a", "initial": true, "name": null, "roles": null});
        let plan = plan_resource(&schema(), &prior, &json!({"key": "a", "name": {}, "roles": []}));
        assert!(!plan.has_changes());

        let prior = json!({"id": "abc", "key": "a", "initial": true, "roles": ["Return"]});
        let plan = plan_resource(&schema(), &prior, &json!({"key": "a", "roles": []}));
        assert_eq!(
            plan.changes,
            vec![AttributeChange::removed("roles", json!(["Return"]))]
        );
    }

    #[test]
    fn test_plan_set_order_ignored() {
        let prior = json!({"id": "abc", "key": "a", "initial": true, "transitions": ["x", "y"]});
        let proposed = json!({"key": "a", "transitions": ["y", "x"]});
        let plan = plan_resource(&schema(), &prior, &proposed);
        assert!(!plan.has_changes());
    }

    #[test]
    fn test_plan_force_new_requires_replace() {
        let prior = json!({"id": "abc", "key": "a", "initial": true, "product_type": "pt-1"});
        let plan = plan_resource(&schema(), &prior, &json!({"key": "a", "product_type": "pt-2"}));
        assert!(plan.requires_replace);
    }

    #[test]
    fn test_plan_delete() {
        let prior = json!({"id": "abc", "key": "a", "transitions": null});
        let plan = plan_resource(&schema(), &prior, &Value::Null);

        assert_eq!(plan.planned_state, Value::Null);
        let paths: Vec<_> = plan.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["id", "key"]);
        assert!(plan.changes.iter().all(|c| c.after.is_none()));
    }

    #[test]
    fn test_attribute_change_conversion() {
        let change = AttributeChange::modified("key", json!("old"), json!("new"));

        let proto: crate::generated::AttributeChange = change.clone().into();
        assert_eq!(proto.path, "key");

        let back: AttributeChange = proto.into();
        assert_eq!(back, change);

        let proto: crate::generated::AttributeChange =
            AttributeChange::added("key", json!("a")).into();
        assert!(proto.before.is_empty());
    }
}
