//! Hemmer provider for commercetools
//!
//! Manages commercetools projects as Hemmer resources over the Hemmer provider
//! gRPC protocol.
//!
//! # Resources
//!
//! - **`commercetools_product`**: products with localized name, slug and
//!   description, optionally bound to a product type
//! - **`commercetools_state`**: states of custom state machines, including
//!   their roles and allowed transitions
//!
//! # Behavior
//!
//! - Create retries transient failures (network errors, `5xx`, `429`) with
//!   exponential backoff for up to 20 seconds.
//! - Read detects drift: a resource deleted outside of Hemmer reads back as
//!   no state, so the next plan recreates it.
//! - Update sends only the changed fields as update actions against the
//!   version recorded in state.
//! - Delete treats an already deleted resource as success.
//!
//! # Configuration
//!
//! ```hcl
//! provider "commercetools" {
//!   client_id     = "..."
//!   client_secret = "..."
//!   project_key   = "my-project"
//!   scopes        = "manage_project:my-project"
//!   api_url       = "https://api.europe-west1.gcp.commercetools.com"
//!   token_url     = "https://auth.europe-west1.gcp.commercetools.com"
//! }
//! ```
//!
//! Every setting falls back to an environment variable, see [`config`].
//!
//! # Handshake Protocol
//!
//! When started via [`serve`], the provider writes a handshake line to stdout:
//!
//! ```text
//! HEMMER_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `HEMMER_PROVIDER|<protocol_version>|<address>`
//!
//! # Embedding
//!
//! ```no_run
//! use hemmer_provider_commercetools::{init_logging, serve, CommercetoolsProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!     serve(CommercetoolsProvider::new()).await
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resource_data;
pub mod resources;
pub mod retry;
pub mod schema;
pub mod server;
pub mod testing;
pub mod validation;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

pub use error::{Diagnostic, DiagnosticSeverity, ProviderError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use plan::{AttributeChange, PlanResult};
pub use provider::CommercetoolsProvider;
pub use schema::ProviderSchema;
pub use server::{
    serve, serve_on, serve_on_with_options, serve_with_options, ImportedResource,
    ProviderMetadata, ProviderService, ServeOptions, ServerCapabilities, HANDSHAKE_PREFIX,
    PROTOCOL_VERSION,
};
pub use validation::{is_valid, validate, validate_result};

pub use async_trait::async_trait;
