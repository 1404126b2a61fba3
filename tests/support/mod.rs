// Shared helpers: a stub admin API on an ephemeral port and a pipeline wired to it.
#![allow(dead_code)]

use admin_console::domain::{Credentials, Notification, NotificationSink, SessionKey, SessionStore};
use admin_console::interface_adapters::{
    CredentialPolicy, EndpointRegistry, InMemorySessionStore, PipelineBuilder, RequestPipeline,
    admin_endpoints,
};
use axum::Router;
use axum::http::HeaderMap;
use std::sync::{Arc, Mutex};

// Serve the given routes on 127.0.0.1 and return the base URL.
pub async fn spawn_api(app: Router) -> String {
    // Bind to an ephemeral port to avoid collisions with local services.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub api failed");
    });
    format!("http://{addr}")
}

// Base URL of a port nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    drop(listener);
    format!("http://{addr}")
}

#[derive(Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().expect("sink mutex poisoned").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .expect("sink mutex poisoned")
            .push(notification);
    }
}

// Authorization headers seen by the stub, one entry per request.
#[derive(Clone, Default)]
pub struct SeenAuth(Arc<Mutex<Vec<Option<String>>>>);

impl SeenAuth {
    pub fn record(&self, headers: &HeaderMap) {
        let value = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.0.lock().expect("auth mutex poisoned").push(value);
    }

    pub fn all(&self) -> Vec<Option<String>> {
        self.0.lock().expect("auth mutex poisoned").clone()
    }
}

pub struct TestClient {
    pub pipeline: RequestPipeline,
    pub sink: Arc<RecordingSink>,
    pub store: InMemorySessionStore,
}

impl TestClient {
    pub async fn stored(&self, key: SessionKey) -> Option<String> {
        self.store.get(key).await.expect("in-memory store never fails")
    }

    pub async fn store(&self, key: SessionKey, value: &str) {
        self.store
            .set(key, value.to_string())
            .await
            .expect("in-memory store never fails");
    }
}

pub fn client_with(base_url: &str, registry: EndpointRegistry) -> TestClient {
    client_with_policy(base_url, registry, CredentialPolicy::Include)
}

pub fn client_with_policy(
    base_url: &str,
    registry: EndpointRegistry,
    policy: CredentialPolicy,
) -> TestClient {
    let store = InMemorySessionStore::default();
    client_from_parts(base_url, registry, policy, Arc::new(store.clone()), store)
}

// `session` backs the pipeline; `store` is what the test inspects. They may differ
// when `session` wraps `store` to inject failures.
pub fn client_from_parts(
    base_url: &str,
    registry: EndpointRegistry,
    policy: CredentialPolicy,
    session: Arc<dyn SessionStore>,
    store: InMemorySessionStore,
) -> TestClient {
    let sink = Arc::new(RecordingSink::default());

    let mut builder = PipelineBuilder::new();
    builder.configure(base_url, policy).expect("valid base url");
    builder.register_all(registry);
    let pipeline = builder
        .build(Credentials::new(session), sink.clone())
        .expect("pipeline builds");

    TestClient {
        pipeline,
        sink,
        store,
    }
}

pub fn admin_client(base_url: &str) -> TestClient {
    client_with(base_url, admin_endpoints())
}
