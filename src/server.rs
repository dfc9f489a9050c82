//! gRPC server for the provider protocol.
//!
//! This module provides the [`ProviderService`] trait the provider implements
//! and the `serve` functions that expose it over gRPC with the handshake
//! protocol.
//!
//! # Signal Handling
//!
//! The server handles SIGTERM and SIGINT (CTRL+C on Windows) for graceful
//! shutdown. When a signal is received, the server:
//! 1. Stops accepting new connections
//! 2. Waits for in-flight requests to complete, at most `shutdown_timeout`
//! 3. Calls the provider's `stop()` method

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tonic::transport::Server;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{Diagnostic, DiagnosticSeverity, ProviderError};
use crate::generated;
use crate::plan::PlanResult;
use crate::schema::{ProviderSchema, Schema};

/// The protocol version for the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// The handshake prefix printed by providers.
pub const HANDSHAKE_PREFIX: &str = "HEMMER_PROVIDER";

/// A resource found by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata returned by GetMetadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
}

/// Server capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Whether the provider plans destroy operations.
    pub plan_destroy: bool,
}

/// Operations a provider exposes to the host.
///
/// States and configurations are JSON objects. A `null` state means the
/// resource does not exist.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Return the provider's schema including all resources.
    fn schema(&self) -> ProviderSchema;

    /// Return provider metadata. By default derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.schema().resources.keys().cloned().collect(),
            capabilities: ServerCapabilities::default(),
        }
    }

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Upgrade resource state from an older schema version.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let _ = (resource_type, version);
        Ok(state)
    }

    /// Plan changes for a resource.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource.
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Read the current state of a resource; `null` when it no longer exists.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import an existing remote object by ID.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::InvalidRequest(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }
}

impl From<Diagnostic> for generated::Diagnostic {
    fn from(d: Diagnostic) -> Self {
        let severity = match d.severity {
            DiagnosticSeverity::Error => generated::diagnostic::Severity::Error,
            DiagnosticSeverity::Warning => generated::diagnostic::Severity::Warning,
        };
        Self {
            severity: severity as i32,
            summary: d.summary,
            detail: d.detail.unwrap_or_default(),
            attribute: d.attribute.unwrap_or_default(),
        }
    }
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<generated::Diagnostic> {
    diagnostics.into_iter().map(Into::into).collect()
}

fn error_to_diagnostics(err: &ProviderError) -> Vec<generated::Diagnostic> {
    vec![Diagnostic::from(err).into()]
}

fn schema_to_proto(schema: &Schema) -> generated::Schema {
    let attributes = schema
        .attributes
        .iter()
        .map(|(name, attr)| generated::Attribute {
            name: name.clone(),
            r#type: serde_json::to_vec(&attr.attr_type).unwrap_or_default(),
            required: attr.flags.required,
            optional: attr.flags.optional,
            computed: attr.flags.computed,
            sensitive: attr.flags.sensitive,
            description: attr.description.clone().unwrap_or_default(),
            force_new: attr.force_new,
            default_value: attr
                .default
                .as_ref()
                .map(|v| serde_json::to_vec(v).unwrap_or_default())
                .unwrap_or_default(),
        })
        .collect();

    generated::Schema {
        version: schema.version as i64,
        block: Some(generated::Block {
            attributes,
            block_types: vec![],
            description: schema.description.clone().unwrap_or_default(),
        }),
    }
}

/// Decode a JSON payload. Empty bytes are `null`.
fn decode_state(bytes: &[u8]) -> Result<Value, ProviderError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// Encode a JSON payload. `null` is empty bytes.
fn encode_state(value: &Value) -> Vec<u8> {
    if value.is_null() {
        return vec![];
    }
    serde_json::to_vec(value).unwrap_or_default()
}

fn log_diagnostics(operation: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.iter().any(Diagnostic::is_error) {
        warn!(diagnostics = diagnostics.len(), "{} completed with errors", operation);
    } else {
        info!("{} completed successfully", operation);
    }
}

/// Wrapper that implements the generated gRPC trait.
struct ProviderGrpcService<P: ProviderService> {
    provider: Arc<P>,
}

#[tonic::async_trait]
impl<P: ProviderService> generated::provider_server::Provider for ProviderGrpcService<P> {
    #[instrument(skip(self, _request), name = "grpc.get_metadata")]
    async fn get_metadata(
        &self,
        _request: tonic::Request<generated::GetMetadataRequest>,
    ) -> Result<tonic::Response<generated::GetMetadataResponse>, tonic::Status> {
        let metadata = self.provider.metadata();
        info!(resources = metadata.resources.len(), "GetMetadata completed");
        Ok(tonic::Response::new(generated::GetMetadataResponse {
            server_capabilities: Some(generated::ServerCapabilities {
                plan_destroy: metadata.capabilities.plan_destroy,
            }),
            resources: metadata.resources,
            data_sources: vec![],
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.get_schema")]
    async fn get_schema(
        &self,
        _request: tonic::Request<generated::GetSchemaRequest>,
    ) -> Result<tonic::Response<generated::GetSchemaResponse>, tonic::Status> {
        let schema = self.provider.schema();
        info!(resources = schema.resources.len(), "GetSchema completed");
        Ok(tonic::Response::new(generated::GetSchemaResponse {
            provider: Some(schema_to_proto(&schema.provider)),
            resources: schema
                .resources
                .iter()
                .map(|(k, v)| (k.clone(), schema_to_proto(v)))
                .collect(),
            data_sources: Default::default(),
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        request: tonic::Request<generated::ValidateProviderConfigRequest>,
    ) -> Result<tonic::Response<generated::ValidateProviderConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_state(&req.config)?;
            self.provider.validate_provider_config(config).await
        }
        .await;

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("ValidateProviderConfig", &diagnostics);
                diagnostics_to_proto(diagnostics)
            }
            Err(e) => {
                error!(error = %e, "ValidateProviderConfig failed");
                error_to_diagnostics(&e)
            }
        };
        Ok(tonic::Response::new(generated::ValidateProviderConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.configure")]
    async fn configure(
        &self,
        request: tonic::Request<generated::ConfigureRequest>,
    ) -> Result<tonic::Response<generated::ConfigureResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_state(&req.config)?;
            self.provider.configure(config).await
        }
        .await;

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("Configure", &diagnostics);
                diagnostics_to_proto(diagnostics)
            }
            Err(e) => {
                error!(error = %e, "Configure failed");
                error_to_diagnostics(&e)
            }
        };
        Ok(tonic::Response::new(generated::ConfigureResponse { diagnostics }))
    }

    #[instrument(skip(self, _request), name = "grpc.stop")]
    async fn stop(
        &self,
        _request: tonic::Request<generated::StopRequest>,
    ) -> Result<tonic::Response<generated::StopResponse>, tonic::Status> {
        info!("Stop called");
        let error = match self.provider.stop().await {
            Ok(()) => String::new(),
            Err(e) => {
                error!(error = %e, "Stop failed");
                e.to_string()
            }
        };
        Ok(tonic::Response::new(generated::StopResponse { error }))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.validate_resource_config"
    )]
    async fn validate_resource_config(
        &self,
        request: tonic::Request<generated::ValidateResourceConfigRequest>,
    ) -> Result<tonic::Response<generated::ValidateResourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_state(&req.config)?;
            self.provider
                .validate_resource_config(&req.resource_type, config)
                .await
        }
        .await;

        let diagnostics = match result {
            Ok(diagnostics) => {
                log_diagnostics("ValidateResourceConfig", &diagnostics);
                diagnostics_to_proto(diagnostics)
            }
            Err(e) => {
                error!(error = %e, "ValidateResourceConfig failed");
                error_to_diagnostics(&e)
            }
        };
        Ok(tonic::Response::new(generated::ValidateResourceConfigResponse { diagnostics }))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.upgrade_resource_state"
    )]
    async fn upgrade_resource_state(
        &self,
        request: tonic::Request<generated::UpgradeResourceStateRequest>,
    ) -> Result<tonic::Response<generated::UpgradeResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let state = decode_state(&req.raw_state)?;
            self.provider
                .upgrade_resource_state(&req.resource_type, req.version, state)
                .await
        }
        .await;

        let response = match result {
            Ok(upgraded) => {
                debug!(from_version = req.version, "UpgradeResourceState completed");
                generated::UpgradeResourceStateResponse {
                    upgraded_state: encode_state(&upgraded),
                    diagnostics: vec![],
                }
            }
            Err(e) => {
                error!(version = req.version, error = %e, "UpgradeResourceState failed");
                generated::UpgradeResourceStateResponse {
                    upgraded_state: vec![],
                    diagnostics: error_to_diagnostics(&e),
                }
            }
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.plan"
    )]
    async fn plan(
        &self,
        request: tonic::Request<generated::PlanRequest>,
    ) -> Result<tonic::Response<generated::PlanResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!(is_create = req.prior_state.is_empty(), "Plan called");
        let result = async {
            let prior = decode_state(&req.prior_state)?;
            let prior = (!prior.is_null()).then_some(prior);
            let proposed = decode_state(&req.proposed_state)?;
            let config = decode_state(&req.config)?;
            self.provider
                .plan(&req.resource_type, prior, proposed, config)
                .await
        }
        .await;

        let response = match result {
            Ok(plan) => {
                info!(
                    changes = plan.changes.len(),
                    requires_replace = plan.requires_replace,
                    "Plan completed"
                );
                generated::PlanResponse {
                    planned_state: encode_state(&plan.planned_state),
                    changes: plan.changes.into_iter().map(Into::into).collect(),
                    requires_replace: plan.requires_replace,
                    diagnostics: vec![],
                }
            }
            Err(e) => {
                error!(error = %e, "Plan failed");
                generated::PlanResponse {
                    diagnostics: error_to_diagnostics(&e),
                    ..Default::default()
                }
            }
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.create"
    )]
    async fn create(
        &self,
        request: tonic::Request<generated::CreateRequest>,
    ) -> Result<tonic::Response<generated::CreateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!("Create called");
        let result = async {
            let planned = decode_state(&req.planned_state)?;
            self.provider.create(&req.resource_type, planned).await
        }
        .await;

        let response = match result {
            Ok(state) => {
                info!("Create completed successfully");
                generated::CreateResponse {
                    state: encode_state(&state),
                    diagnostics: vec![],
                }
            }
            Err(e) => {
                error!(error = %e, "Create failed");
                generated::CreateResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(&e),
                }
            }
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.read"
    )]
    async fn read(
        &self,
        request: tonic::Request<generated::ReadRequest>,
    ) -> Result<tonic::Response<generated::ReadResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!("Read called");
        let result = async {
            let current = decode_state(&req.current_state)?;
            self.provider.read(&req.resource_type, current).await
        }
        .await;

        let response = match result {
            Ok(state) => {
                if state.is_null() {
                    info!("Resource no longer exists");
                }
                generated::ReadResponse {
                    state: encode_state(&state),
                    diagnostics: vec![],
                }
            }
            Err(e) => {
                error!(error = %e, "Read failed");
                generated::ReadResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(&e),
                }
            }
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.update"
    )]
    async fn update(
        &self,
        request: tonic::Request<generated::UpdateRequest>,
    ) -> Result<tonic::Response<generated::UpdateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!("Update called");
        let result = async {
            let prior = decode_state(&req.prior_state)?;
            let planned = decode_state(&req.planned_state)?;
            self.provider.update(&req.resource_type, prior, planned).await
        }
        .await;

        let response = match result {
            Ok(state) => {
                info!("Update completed successfully");
                generated::UpdateResponse {
                    state: encode_state(&state),
                    diagnostics: vec![],
                }
            }
            Err(e) => {
                error!(error = %e, "Update failed");
                generated::UpdateResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(&e),
                }
            }
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.delete"
    )]
    async fn delete(
        &self,
        request: tonic::Request<generated::DeleteRequest>,
    ) -> Result<tonic::Response<generated::DeleteResponse>, tonic::Status> {
        let req = request.into_inner();
        info!("Delete called");
        let result = async {
            let current = decode_state(&req.current_state)?;
            self.provider.delete(&req.resource_type, current).await
        }
        .await;

        let diagnostics = match result {
            Ok(()) => {
                info!("Delete completed successfully");
                vec![]
            }
            Err(e) => {
                error!(error = %e, "Delete failed");
                error_to_diagnostics(&e)
            }
        };
        Ok(tonic::Response::new(generated::DeleteResponse { diagnostics }))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type, id = %request.get_ref().id),
        name = "grpc.import_resource_state"
    )]
    async fn import_resource_state(
        &self,
        request: tonic::Request<generated::ImportResourceStateRequest>,
    ) -> Result<tonic::Response<generated::ImportResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!("ImportResourceState called");

        let response = match self.provider.import_resource(&req.resource_type, &req.id).await {
            Ok(imported) => {
                info!(imported_count = imported.len(), "ImportResourceState completed");
                generated::ImportResourceStateResponse {
                    imported: imported
                        .into_iter()
                        .map(|r| generated::ImportedResource {
                            resource_type: r.resource_type,
                            state: encode_state(&r.state),
                        })
                        .collect(),
                    diagnostics: vec![],
                }
            }
            Err(e) => {
                error!(error = %e, "ImportResourceState failed");
                generated::ImportResourceStateResponse {
                    imported: vec![],
                    diagnostics: error_to_diagnostics(&e),
                }
            }
        };
        Ok(tonic::Response::new(response))
    }

    async fn validate_data_source_config(
        &self,
        request: tonic::Request<generated::ValidateDataSourceConfigRequest>,
    ) -> Result<tonic::Response<generated::ValidateDataSourceConfigResponse>, tonic::Status> {
        let err = ProviderError::UnknownResource(request.into_inner().data_source_type);
        warn!(error = %err, "ValidateDataSourceConfig called");
        Ok(tonic::Response::new(generated::ValidateDataSourceConfigResponse {
            diagnostics: error_to_diagnostics(&err),
        }))
    }

    async fn read_data_source(
        &self,
        request: tonic::Request<generated::ReadDataSourceRequest>,
    ) -> Result<tonic::Response<generated::ReadDataSourceResponse>, tonic::Status> {
        let err = ProviderError::UnknownResource(request.into_inner().data_source_type);
        warn!(error = %err, "ReadDataSource called");
        Ok(tonic::Response::new(generated::ReadDataSourceResponse {
            state: vec![],
            diagnostics: error_to_diagnostics(&err),
        }))
    }
}

/// Options for configuring the provider server.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// After a shutdown signal, how long in-flight requests may take to
    /// complete. Default: 30 seconds.
    pub shutdown_timeout: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServeOptions {
    /// Create new serve options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT; CTRL+C on Windows).
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
            _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
        }
        Ok(())
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received CTRL+C, initiating graceful shutdown");
        Ok(())
    }

    #[cfg(not(any(unix, windows)))]
    {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Serve a provider implementation as a gRPC server.
///
/// Binds an available port on localhost, prints the handshake line
/// `HEMMER_PROVIDER|<version>|<address>` to stdout, and serves until a
/// shutdown signal arrives.
pub async fn serve<P: ProviderService>(provider: P) -> Result<(), Box<dyn std::error::Error>> {
    serve_with_options(provider, ServeOptions::default()).await
}

/// Serve a provider with custom options. See [`serve`].
pub async fn serve_with_options<P: ProviderService>(
    provider: P,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    serve_on_listener(provider, listener, options).await
}

/// Serve a provider on a specific address.
pub async fn serve_on<P: ProviderService>(
    provider: P,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    serve_on_with_options(provider, addr, ServeOptions::default()).await
}

/// Serve a provider on a specific address with custom options.
pub async fn serve_on_with_options<P: ProviderService>(
    provider: P,
    addr: SocketAddr,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    serve_on_listener(provider, listener, options).await
}

async fn serve_on_listener<P: ProviderService>(
    provider: P,
    listener: TcpListener,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = listener.local_addr()?;
    println!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr);
    info!(address = %addr, "Provider server starting");

    let provider = Arc::new(provider);
    let grpc_service = ProviderGrpcService {
        provider: Arc::clone(&provider),
    };

    let (signalled_tx, mut signalled_rx) = tokio::sync::watch::channel(false);
    let server_future = Server::builder()
        .add_service(generated::provider_server::ProviderServer::new(grpc_service))
        .serve_with_incoming_shutdown(
            tokio_stream::wrappers::TcpListenerStream::new(listener),
            async move {
                if let Err(e) = wait_for_shutdown_signal().await {
                    error!(error = %e, "Failed to install signal handlers");
                    std::future::pending::<()>().await;
                }
                let _ = signalled_tx.send(true);
            },
        );

    // Only bounds the drain after a signal, never normal serving.
    let drain_deadline = async move {
        if signalled_rx.wait_for(|signalled| *signalled).await.is_ok() {
            tokio::time::sleep(options.shutdown_timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server_future => {
            if let Err(e) = result {
                error!(error = %e, "Server error");
                return Err(e.into());
            }
            info!("Server shutdown complete");
        }
        _ = drain_deadline => {
            warn!(
                timeout = ?options.shutdown_timeout,
                "Shutdown timeout exceeded, forcing shutdown"
            );
        }
    }

    debug!("Calling provider stop()");
    if let Err(e) = provider.stop().await {
        warn!(error = %e, "Provider stop() returned error");
    }

    info!("Provider shutdown complete");
    Ok(())
}
