//! Resource handlers.
//!
//! Each commercetools resource type implements [`Resource`]: it declares its
//! schema and translates [`ResourceData`] to and from the REST API.

mod product;
mod state;

pub use product::ProductResource;
pub use state::StateResource;

use std::collections::BTreeMap;

use crate::client::models::LocalizedString;
use crate::client::Client;
use crate::error::ProviderError;
use crate::resource_data::ResourceData;
use crate::schema::Schema;

pub(crate) const LOCALIZED_STRING_DOC: &str =
    "[LocalizedString](https://docs.commercetools.com/api/types#localizedstring)";

/// CRUD handler for one resource type.
#[async_trait::async_trait]
pub trait Resource: Send + Sync {
    /// Resource type name, e.g. `commercetools_state`.
    fn type_name(&self) -> &'static str;

    /// Schema of the resource's attributes.
    fn schema(&self) -> Schema;

    /// Create the remote object and fill `data` with its state.
    async fn create(&self, client: &Client, data: &mut ResourceData) -> Result<(), ProviderError>;

    /// Refresh `data` from the remote object; clear its ID when it is gone.
    async fn read(&self, client: &Client, data: &mut ResourceData) -> Result<(), ProviderError>;

    /// Push changed attributes to the remote object and refresh `data`.
    async fn update(&self, client: &Client, data: &mut ResourceData) -> Result<(), ProviderError>;

    /// Delete the remote object.
    async fn delete(&self, client: &Client, data: &mut ResourceData) -> Result<(), ProviderError>;
}

/// The resource handlers of the provider, keyed by type name.
pub struct Registry {
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
}

impl Registry {
    /// All commercetools resource types this provider manages.
    pub fn new() -> Self {
        let mut registry = Self {
            resources: BTreeMap::new(),
        };
        registry.register(ProductResource);
        registry.register(StateResource);
        registry
    }

    fn register<R: Resource + 'static>(&mut self, resource: R) {
        self.resources.insert(resource.type_name(), Box::new(resource));
    }

    /// Look up a handler, failing with `UnknownResource`.
    pub fn get(&self, type_name: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(type_name)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    /// Iterate over all handlers in type-name order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Resource> {
        self.resources.values().map(|r| r.as_ref())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a LocalizedString attribute; empty maps read as absent.
pub(crate) fn localized_string(
    data: &ResourceData,
    name: &str,
) -> Result<Option<LocalizedString>, ProviderError> {
    Ok(data
        .get_as::<LocalizedString>(name)?
        .filter(|ls| !ls.is_empty()))
}

/// Read a set-of-strings attribute. `null` stays `None`; `[]` is `Some(vec![])`.
pub(crate) fn string_set(
    data: &ResourceData,
    name: &str,
) -> Result<Option<Vec<String>>, ProviderError> {
    data.get_as::<Vec<String>>(name)
}

/// The resource's version from the prior state, required for updates and deletes.
pub(crate) fn require_version(data: &ResourceData, operation: &str) -> Result<i64, ProviderError> {
    data.prior_version().ok_or_else(|| {
        ProviderError::InvalidRequest(format!("{} requires a resource version in state", operation))
    })
}
