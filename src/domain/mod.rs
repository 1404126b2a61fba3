// Domain layer: endpoint contracts, failure taxonomy, and the ports the pipeline depends on.

pub mod endpoint;
pub mod failure;
pub mod notification;
pub mod session;

// Re-export the domain boundary types and ports.
pub use endpoint::{EndpointDescriptor, HttpVerb, RequestShape, ResponseShape};
pub use failure::{ErrorPayload, Failure, FieldErrors, TransportKind};
pub use notification::{Notification, NotificationSink, Severity};
pub use session::{Credentials, SessionKey, SessionStore, SessionToken, StoreError};
