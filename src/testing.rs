//! Test harness for provider implementations.
//!
//! [`ProviderTester`] drives a [`ProviderService`] directly, without a gRPC
//! server. The `check_*` functions inspect a state through its flattened
//! attribute view, where nested values are addressed by dotted paths:
//!
//! | state                          | flattened                           |
//! |--------------------------------|-------------------------------------|
//! | `{"name": {"en": "Shoe"}}`     | `name.% = 1`, `name.en = Shoe`      |
//! | `{"transitions": ["a"]}`       | `transitions.# = 1`, `transitions.0 = a` |
//! | `{"transitions": []}`          | `transitions.# = 0`                 |
//! | `{"transitions": null}`        | nothing                             |
//!
//! # Example
//!
//! ```ignore
//! use hemmer_provider_commercetools::testing::{check_resource_attr, ProviderTester};
//! use serde_json::json;
//!
//! let tester = ProviderTester::new(provider);
//! let state = tester
//!     .lifecycle_create("commercetools_state", json!({"key": "state-c", "type": "ReviewState"}))
//!     .await?;
//! check_resource_attr(&state, "key", "state-c")?;
//! ```

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::error::{Diagnostic, ProviderError};
use crate::plan::PlanResult;
use crate::schema::ProviderSchema;
use crate::server::{ImportedResource, ProviderService};

/// Failure of a tester operation or check.
#[derive(Debug, Error)]
pub enum TestError {
    /// The operation reported error diagnostics.
    #[error("operation failed with {}", format_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),

    /// The operation failed with a provider error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A state check did not hold.
    #[error("check failed: {0}")]
    Check(String),
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match &d.attribute {
            Some(attribute) => format!("[{}] {}", attribute, d.summary),
            None => d.summary.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Drives a provider the way the host would.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The provider under test.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Names of all resource types.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Validate the provider configuration; error diagnostics fail.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.validate_provider_config(config).await?)
    }

    /// Configure the provider; error diagnostics fail.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.configure(config).await?)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    /// Validate a resource configuration; error diagnostics fail.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        check_diagnostics(
            self.provider
                .validate_resource_config(resource_type, config)
                .await?,
        )
    }

    /// Plan a create.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    /// Plan an update from `prior_state` to `proposed_state`.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    /// Plan a delete.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Create a resource from a planned state.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Refresh a resource; `null` when it is gone.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update a resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import a resource by ID.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Validate, plan, create, then read back. Returns the read state.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, TestError> {
        self.validate_resource_config(resource_type, config.clone())
            .await?;
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        Ok(self.read(resource_type, created).await?)
    }

    /// Validate, plan, update, then read back. Returns the read state.
    ///
    /// A plan without changes skips the update and only reads.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, TestError> {
        self.validate_resource_config(resource_type, config.clone())
            .await?;
        let plan = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        if !plan.has_changes() {
            return Ok(self.read(resource_type, prior_state).await?);
        }
        if plan.requires_replace {
            return Err(TestError::Check(format!(
                "update of {} requires replacement",
                resource_type
            )));
        }
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        Ok(self.read(resource_type, updated).await?)
    }

    /// Plan and run a delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), TestError> {
        let plan = self
            .plan_delete(resource_type, current_state.clone())
            .await?;
        if !plan.planned_state.is_null() {
            return Err(TestError::Check(format!(
                "delete plan of {} keeps a state",
                resource_type
            )));
        }
        Ok(self.delete(resource_type, current_state).await?)
    }
}

/// Flatten a state into dotted attribute paths.
///
/// Lists add a `<path>.#` count entry, objects a `<path>.%` entry. `null`
/// values produce no entry at all.
pub fn flatten_state(state: &Value) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();
    if let Value::Object(map) = state {
        for (name, value) in map {
            flatten_into(&mut flat, name.clone(), value);
        }
    }
    flat
}

fn flatten_into(flat: &mut BTreeMap<String, String>, path: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            flat.insert(path, s.clone());
        }
        Value::Bool(_) | Value::Number(_) => {
            flat.insert(path, value.to_string());
        }
        Value::Array(items) => {
            flat.insert(format!("{}.#", path), items.len().to_string());
            for (i, item) in items.iter().enumerate() {
                flatten_into(flat, format!("{}.{}", path, i), item);
            }
        }
        Value::Object(map) => {
            flat.insert(format!("{}.%", path), map.len().to_string());
            for (key, item) in map {
                flatten_into(flat, format!("{}.{}", path, key), item);
            }
        }
    }
}

/// Check that `path` is set to `expected` in the flattened state.
pub fn check_resource_attr(state: &Value, path: &str, expected: &str) -> Result<(), TestError> {
    let flat = flatten_state(state);
    match flat.get(path) {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(TestError::Check(format!(
            "{}: expected {:?}, got {:?}",
            path, expected, actual
        ))),
        None => Err(TestError::Check(format!(
            "{}: expected {:?}, attribute not set",
            path, expected
        ))),
    }
}

/// Check that `path` is set to any value.
pub fn check_resource_attr_set(state: &Value, path: &str) -> Result<(), TestError> {
    if flatten_state(state).contains_key(path) {
        Ok(())
    } else {
        Err(TestError::Check(format!("{}: attribute not set", path)))
    }
}

/// Check that `path` is absent from the flattened state.
pub fn check_no_resource_attr(state: &Value, path: &str) -> Result<(), TestError> {
    match flatten_state(state).get(path) {
        None => Ok(()),
        Some(actual) => Err(TestError::Check(format!(
            "{}: expected no value, got {:?}",
            path, actual
        ))),
    }
}

/// Assert that a plan changes the given attribute.
///
/// # Panics
///
/// Panics if no change has that path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "Expected plan to change attribute '{}'. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan has no changes.
///
/// # Panics
///
/// Panics if the plan has any change.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan requires replacement.
///
/// # Panics
///
/// Panics if the plan updates in place.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that diagnostics contain an error whose summary contains `substring`.
///
/// # Panics
///
/// Panics if no such error exists.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.is_error() && d.summary.contains(substring)),
        "Expected an error containing '{}'. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}
