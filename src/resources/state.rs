//! `commercetools_state`
//!
//! States model finite state machines for orders, line items, products,
//! reviews, payments and quotes. `transitions` distinguishes `null` (any
//! transition is allowed) from `[]` (no transition is allowed); both are
//! sent to and read back from the API as-is.

use tracing::{debug, info, warn};

use super::{localized_string, require_version, string_set, Resource, LOCALIZED_STRING_DOC};
use crate::client::models::{ResourceIdentifier, State, StateDraft, StateUpdateAction};
use crate::client::Client;
use crate::error::ProviderError;
use crate::resource_data::ResourceData;
use crate::retry::{retry_context, CREATE_TIMEOUT};
use crate::schema::{Attribute, AttributeFlags, Schema, Validator};

const TYPE_NAME: &str = "commercetools_state";

/// Values accepted by the `type` attribute.
pub const STATE_TYPES: &[&str] = &[
    "OrderState",
    "LineItemState",
    "ProductState",
    "ReviewState",
    "PaymentState",
    "QuoteRequestState",
    "StagedQuoteState",
    "QuoteState",
];

/// Values accepted in the `roles` attribute.
pub const STATE_ROLES: &[&str] = &["ReviewIncludedInStatistics", "Return"];

/// A state of a custom state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateResource;

impl StateResource {
    fn draft(data: &ResourceData) -> Result<StateDraft, ProviderError> {
        let required = |name: &str| {
            data.get_str(name).map(str::to_string).ok_or_else(|| {
                ProviderError::Validation(format!("attribute '{}' is required", name))
            })
        };

        Ok(StateDraft {
            key: required("key")?,
            state_type: required("type")?,
            name: localized_string(data, "name")?,
            description: localized_string(data, "description")?,
            initial: data.get_bool("initial"),
            roles: string_set(data, "roles")?,
            transitions: Self::transitions(data)?,
        })
    }

    fn transitions(data: &ResourceData) -> Result<Option<Vec<ResourceIdentifier>>, ProviderError> {
        Ok(string_set(data, "transitions")?.map(|ids| {
            ids.into_iter()
                .map(|id| ResourceIdentifier::by_id("state", id))
                .collect()
        }))
    }

    fn update_actions(data: &ResourceData) -> Result<Vec<StateUpdateAction>, ProviderError> {
        let mut actions = Vec::new();

        if data.has_change("key") {
            if let Some(key) = data.get_str("key") {
                actions.push(StateUpdateAction::ChangeKey {
                    key: key.to_string(),
                });
            }
        }
        if data.has_change("type") {
            if let Some(state_type) = data.get_str("type") {
                actions.push(StateUpdateAction::ChangeType {
                    state_type: state_type.to_string(),
                });
            }
        }
        if data.has_value_change("name") {
            actions.push(StateUpdateAction::SetName {
                name: localized_string(data, "name")?,
            });
        }
        if data.has_value_change("description") {
            actions.push(StateUpdateAction::SetDescription {
                description: localized_string(data, "description")?,
            });
        }
        if data.has_change("initial") {
            actions.push(StateUpdateAction::ChangeInitial {
                initial: data.get_bool("initial").unwrap_or(true),
            });
        }
        if data.has_value_change("roles") {
            actions.push(StateUpdateAction::SetRoles {
                roles: string_set(data, "roles")?.unwrap_or_default(),
            });
        }
        if data.has_change("transitions") {
            actions.push(StateUpdateAction::SetTransitions {
                transitions: Self::transitions(data)?,
            });
        }

        Ok(actions)
    }

    fn apply(data: &mut ResourceData, state: &State) -> Result<(), ProviderError> {
        data.set("version", state.version)?;
        data.set("key", &state.key)?;
        data.set("type", &state.state_type)?;
        data.set("name", &state.name)?;
        data.set("description", &state.description)?;
        data.set("initial", state.initial)?;
        // An empty role list is the API's way of saying "no roles".
        data.set("roles", (!state.roles.is_empty()).then_some(&state.roles))?;

        let transitions: Option<Vec<&str>> = state
            .transitions
            .as_ref()
            .map(|refs| refs.iter().map(|r| r.id.as_str()).collect());
        data.set("transitions", transitions)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Resource for StateResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("States model finite state machines, e.g. for orders or reviews")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "version",
                Attribute::computed_int64().with_description("Current version of the state"),
            )
            .with_attribute(
                "key",
                Attribute::required_string().with_description("User-defined unique identifier"),
            )
            .with_attribute(
                "type",
                Attribute::required_string()
                    .with_validator(Validator::OneOf(STATE_TYPES.to_vec()))
                    .with_description("What the state machine applies to"),
            )
            .with_attribute(
                "name",
                Attribute::localized_string(AttributeFlags::optional())
                    .with_description(LOCALIZED_STRING_DOC),
            )
            .with_attribute(
                "description",
                Attribute::localized_string(AttributeFlags::optional())
                    .with_description(LOCALIZED_STRING_DOC),
            )
            .with_attribute(
                "initial",
                Attribute::optional_bool()
                    .with_default(serde_json::Value::Bool(true))
                    .with_description("A state machine may start in this state"),
            )
            .with_attribute(
                "roles",
                Attribute::optional_string_set()
                    .with_empty_as_null()
                    .with_validator(Validator::OneOf(STATE_ROLES.to_vec()))
                    .with_description("Roles of the state, e.g. ReviewIncludedInStatistics"),
            )
            .with_attribute(
                "transitions",
                Attribute::optional_string_set().with_description(
                    "IDs of the states this one may transition to. \
                     Unset allows any transition, an empty set allows none",
                ),
            )
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> Result<(), ProviderError> {
        let draft = Self::draft(data)?;
        let draft = &draft;

        let state = retry_context(CREATE_TIMEOUT, move || client.states().create(draft)).await?;
        info!(id = %state.id, key = ?state.key, "Created state");

        data.set_id(&state.id);
        data.set("version", state.version)?;
        self.read(client, data).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id("read")?.to_string();

        match client.states().get(&id).await {
            Ok(state) => Self::apply(data, &state),
            Err(e) if e.is_not_found() => {
                warn!(%id, "State no longer exists, removing from state");
                data.clear_id();
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id("update")?.to_string();
        let actions = Self::update_actions(data)?;

        if actions.is_empty() {
            debug!(%id, "No state changes to apply");
        } else {
            let version = require_version(data, "update")?;
            let state = client.states().update(&id, version, &actions).await?;
            info!(%id, version = state.version, actions = actions.len(), "Updated state");
            data.set("version", state.version)?;
        }

        self.read(client, data).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id("delete")?.to_string();
        let version = require_version(data, "delete")?;

        match client.states().delete(&id, version).await {
            Ok(_) => info!(%id, "Deleted state"),
            Err(e) if e.is_not_found() => debug!(%id, "State already deleted"),
            Err(e) => return Err(e.into()),
        }

        data.clear_id();
        Ok(())
    }
}
