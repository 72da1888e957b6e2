//! Proxy module
//!
//! Handles request forwarding to upstream LLM providers.

pub mod dispatcher;
pub mod headers;
pub mod logging;
pub mod provider;
pub mod registry;
pub mod upstream;

pub use dispatcher::Dispatcher;
pub use provider::{ProviderConfig, ProviderSpec, Secret};
pub use registry::ProviderRegistry;
pub use upstream::{ReqwestTransport, UpstreamTransport};
