//! Request and response bodies of the commercetools endpoints this provider uses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Language tag to text.
pub type LocalizedString = BTreeMap<String, String>;

/// A reference returned by the API, e.g. `{"typeId": "state", "id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Type of the referenced resource.
    pub type_id: String,
    /// ID of the referenced resource.
    pub id: String,
}

/// A reference sent to the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentifier {
    /// Type of the referenced resource.
    pub type_id: String,
    /// ID of the referenced resource.
    pub id: String,
}

impl ResourceIdentifier {
    /// Identify a resource of the given type by ID.
    pub fn by_id(type_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            id: id.into(),
        }
    }
}

// ============================================================================
// Products
// ============================================================================

/// Payload to create a product.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    /// The product type the product is based on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<ResourceIdentifier>,
    /// Product name.
    pub name: LocalizedString,
    /// URL slug, unique per language within the project.
    pub slug: LocalizedString,
    /// User-defined key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Product description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
}

/// Product data of one projection (current or staged).
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    /// Product name.
    #[serde(default)]
    pub name: LocalizedString,
    /// URL slug.
    #[serde(default)]
    pub slug: LocalizedString,
    /// Product description.
    #[serde(default)]
    pub description: Option<LocalizedString>,
}

/// Current and staged product data.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductCatalogData {
    /// Whether the current projection is published.
    #[serde(default)]
    pub published: bool,
    /// Published data.
    #[serde(default)]
    pub current: ProductData,
    /// Data including unpublished changes.
    #[serde(default)]
    pub staged: ProductData,
    /// Whether staged differs from current.
    #[serde(default)]
    pub has_staged_changes: bool,
}

/// A product as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Platform-generated ID.
    pub id: String,
    /// Current version.
    pub version: i64,
    /// User-defined key.
    #[serde(default)]
    pub key: Option<String>,
    /// The product type.
    pub product_type: Reference,
    /// Current and staged product data.
    #[serde(default)]
    pub master_data: ProductCatalogData,
}

/// Product update actions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ProductUpdateAction {
    /// Change the name.
    #[serde(rename_all = "camelCase")]
    ChangeName {
        /// New name.
        name: LocalizedString,
        /// Apply to staged only.
        staged: bool,
    },
    /// Change the slug.
    #[serde(rename_all = "camelCase")]
    ChangeSlug {
        /// New slug.
        slug: LocalizedString,
        /// Apply to staged only.
        staged: bool,
    },
    /// Set or unset the key.
    SetKey {
        /// New key; unset when absent.
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    /// Set or unset the description.
    SetDescription {
        /// New description; unset when absent.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<LocalizedString>,
        /// Apply to staged only.
        staged: bool,
    },
}

// ============================================================================
// States
// ============================================================================

/// Payload to create a state.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StateDraft {
    /// User-defined key.
    pub key: String,
    /// What the state applies to, e.g. `ReviewState`.
    #[serde(rename = "type")]
    pub state_type: String,
    /// State name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedString>,
    /// State description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    /// Whether this is an initial state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<bool>,
    /// Roles of the state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    /// Allowed next states. Absent: any; empty: none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitions: Option<Vec<ResourceIdentifier>>,
}

/// A state as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// Platform-generated ID.
    pub id: String,
    /// Current version.
    pub version: i64,
    /// User-defined key.
    #[serde(default)]
    pub key: Option<String>,
    /// What the state applies to.
    #[serde(rename = "type")]
    pub state_type: String,
    /// State name.
    #[serde(default)]
    pub name: Option<LocalizedString>,
    /// State description.
    #[serde(default)]
    pub description: Option<LocalizedString>,
    /// Whether this is an initial state.
    #[serde(default)]
    pub initial: bool,
    /// Whether the state is managed by the platform.
    #[serde(default)]
    pub built_in: bool,
    /// Roles of the state.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Allowed next states. Absent: any; empty: none.
    #[serde(default)]
    pub transitions: Option<Vec<Reference>>,
}

/// State update actions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum StateUpdateAction {
    /// Change the key.
    ChangeKey {
        /// New key.
        key: String,
    },
    /// Change the state type.
    ChangeType {
        /// New type.
        #[serde(rename = "type")]
        state_type: String,
    },
    /// Set or unset the name.
    SetName {
        /// New name; unset when absent.
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<LocalizedString>,
    },
    /// Set or unset the description.
    SetDescription {
        /// New description; unset when absent.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<LocalizedString>,
    },
    /// Change whether the state is initial.
    ChangeInitial {
        /// New value.
        initial: bool,
    },
    /// Replace the roles.
    SetRoles {
        /// New roles.
        roles: Vec<String>,
    },
    /// Replace the allowed transitions.
    SetTransitions {
        /// New transitions; absent allows any transition.
        #[serde(skip_serializing_if = "Option::is_none")]
        transitions: Option<Vec<ResourceIdentifier>>,
    },
}

/// Body of an update request.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateRequest<'a, A> {
    pub version: i64,
    pub actions: &'a [A],
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ls(pairs: &[(&str, &str)]) -> LocalizedString {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_product_draft_omits_missing_product_type() {
        let draft = ProductDraft {
            name: ls(&[("en", "Shoe")]),
            slug: ls(&[("en", "shoe")]),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            json!({"name": {"en": "Shoe"}, "slug": {"en": "shoe"}})
        );
    }

    #[test]
    fn test_state_draft_transitions_null_vs_empty() {
        let mut draft = StateDraft {
            key: "state-c".to_string(),
            state_type: "ReviewState".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert!(value.get("transitions").is_none());
        assert_eq!(value["type"], "ReviewState");

        draft.transitions = Some(vec![]);
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["transitions"], json!([]));
    }

    #[test]
    fn test_update_action_tags() {
        let action = ProductUpdateAction::ChangeName {
            name: ls(&[("en", "Boot")]),
            staged: false,
        };
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({"action": "changeName", "name": {"en": "Boot"}, "staged": false})
        );

        let action = StateUpdateAction::ChangeType {
            state_type: "OrderState".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({"action": "changeType", "type": "OrderState"})
        );

        let action = StateUpdateAction::SetTransitions { transitions: None };
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({"action": "setTransitions"})
        );
    }

    #[test]
    fn test_state_deserialize_without_transitions() {
        let state: State = serde_json::from_value(json!({
            "id": "abc",
            "version": 2,
            "key": "state-c",
            "type": "ReviewState",
            "initial": true,
            "builtIn": false,
            "roles": []
        }))
        .unwrap();

        assert_eq!(state.state_type, "ReviewState");
        assert!(state.transitions.is_none());
        assert!(state.name.is_none());
    }
}
