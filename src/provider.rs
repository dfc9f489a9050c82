//! The commercetools provider.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::client::{Client, ClientConfig};
use crate::config::{provider_schema, ProviderConfig};
use crate::error::{Diagnostic, ProviderError};
use crate::plan::{plan_resource, PlanResult};
use crate::resource_data::ResourceData;
use crate::resources::Registry;
use crate::schema::ProviderSchema;
use crate::server::{ImportedResource, ProviderService};
use crate::validation;

/// Manages commercetools resources of one project.
///
/// Resource operations fail with a configuration error until
/// [`configure`](ProviderService::configure) succeeded.
pub struct CommercetoolsProvider {
    resources: Registry,
    client: RwLock<Option<Arc<Client>>>,
}

impl CommercetoolsProvider {
    /// An unconfigured provider.
    pub fn new() -> Self {
        Self {
            resources: Registry::new(),
            client: RwLock::new(None),
        }
    }

    /// A provider already configured with the given client settings.
    pub fn with_client_config(config: ClientConfig) -> Result<Self, ProviderError> {
        let client = Client::new(config)?;
        Ok(Self {
            resources: Registry::new(),
            client: RwLock::new(Some(Arc::new(client))),
        })
    }

    async fn client(&self) -> Result<Arc<Client>, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }
}

impl Default for CommercetoolsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProviderService for CommercetoolsProvider {
    fn schema(&self) -> ProviderSchema {
        self.resources.iter().fold(
            ProviderSchema::new().with_provider_config(provider_schema()),
            |schema, resource| schema.with_resource(resource.type_name(), resource.schema()),
        )
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validation::validate(&provider_schema(), &config))
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = validation::validate(&provider_schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Ok(diagnostics);
        }

        let client_config = ProviderConfig::from_value(&config)?.resolve()?;
        info!(
            project_key = %client_config.project_key,
            api_url = %client_config.api_url,
            "Configuring commercetools client"
        );

        let client = Client::new(client_config)?;
        *self.client.write().await = Some(Arc::new(client));
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        debug!("Releasing commercetools client");
        self.client.write().await.take();
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resources.get(resource_type)?;
        Ok(validation::validate(&resource.schema(), &config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resources.get(resource_type)?;
        let prior = prior_state.unwrap_or(Value::Null);
        Ok(plan_resource(&resource.schema(), &prior, &proposed_state))
    }

    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resources.get(resource_type)?;
        let client = self.client().await?;

        let mut data = ResourceData::from_value(planned_state)?;
        resource.create(&client, &mut data).await?;
        Ok(data.into_state())
    }

    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resources.get(resource_type)?;
        let client = self.client().await?;

        let mut data = ResourceData::from_value(current_state)?;
        if data.id().is_none() {
            return Ok(Value::Null);
        }
        resource.read(&client, &mut data).await?;
        Ok(data.into_state())
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resources.get(resource_type)?;
        let client = self.client().await?;

        let mut data = ResourceData::for_update(prior_state, planned_state)?;
        resource.update(&client, &mut data).await?;
        Ok(data.into_state())
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resources.get(resource_type)?;
        let client = self.client().await?;

        let mut data = ResourceData::from_value(current_state)?;
        if data.id().is_none() {
            return Ok(());
        }
        resource.delete(&client, &mut data).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resources.get(resource_type)?;
        let client = self.client().await?;

        let mut data = ResourceData::default();
        data.set_id(id);
        resource.read(&client, &mut data).await?;

        match data.into_state() {
            Value::Null => Err(ProviderError::NotFound(format!("{} {}", resource_type, id))),
            state => Ok(vec![ImportedResource::new(resource_type, state)]),
        }
    }
}
