pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use frameworks::cli::run;
pub use frameworks::config::AppConfig;
pub use interface_adapters::{CredentialPolicy, InvokeError, PipelineBuilder, RequestPipeline};
