// Interface adapters: HTTP transport, endpoint table, wire DTOs, and port implementations.

pub mod pipeline;
pub mod protocol;
pub mod registry;
pub mod session_store;
pub mod sinks;

pub use pipeline::{ConfigError, CredentialPolicy, InvokeError, PipelineBuilder, RequestPipeline};
pub use registry::{EndpointRegistry, admin_endpoints};
pub use session_store::{FileSessionStore, InMemorySessionStore};
pub use sinks::{ChannelSink, TracingSink};
