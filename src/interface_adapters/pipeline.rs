use crate::domain::endpoint::placeholder_name;
use crate::domain::{
    Credentials, EndpointDescriptor, ErrorPayload, Failure, HttpVerb, Notification,
    NotificationSink, RequestShape, SessionToken, TransportKind,
};
use crate::interface_adapters::registry::EndpointRegistry;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

// Whether cross-origin credentials (cookies) travel with requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialPolicy {
    #[default]
    Include,
    Omit,
}

impl std::str::FromStr for CredentialPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "include" => Ok(CredentialPolicy::Include),
            "omit" => Ok(CredentialPolicy::Omit),
            other => Err(ConfigError::InvalidCredentialPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(&'static str),
    #[error("invalid base url `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("unknown credential policy `{0}` (expected `include` or `omit`)")]
    InvalidCredentialPolicy(String),
    #[error("pipeline is already configured with a different target")]
    Reconfigured,
    #[error("pipeline has no transport target; call configure first")]
    NotConfigured,
    #[error("failed to build http transport: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("no endpoint registered under `{0}`")]
    UnknownEndpoint(String),
    #[error("invalid params for `{endpoint}`: {reason}")]
    InvalidParams { endpoint: String, reason: String },
    #[error(transparent)]
    Failed(#[from] Failure),
}

impl InvokeError {
    // The remote failure, if the request got as far as the transport.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            InvokeError::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

// Base URLs must be absolute http(s) URLs that can carry a path.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw.trim()).map_err(|err| invalid(&err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("url cannot be used as a base"));
    }
    Ok(url)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TransportTarget {
    base_url: Url,
    credentials: CredentialPolicy,
}

// Configuration-time assembly of a `RequestPipeline`.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    target: Option<TransportTarget>,
    registry: EndpointRegistry,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transport target. Repeating the same arguments is a no-op;
    /// different arguments are rejected.
    pub fn configure(
        &mut self,
        base_url: &str,
        credentials: CredentialPolicy,
    ) -> Result<&mut Self, ConfigError> {
        let target = TransportTarget {
            base_url: parse_base_url(base_url)?,
            credentials,
        };
        if self
            .target
            .as_ref()
            .is_some_and(|existing| *existing != target)
        {
            return Err(ConfigError::Reconfigured);
        }
        self.target.get_or_insert(target);
        Ok(self)
    }

    // Last registration under a name wins.
    pub fn register_endpoint(&mut self, descriptor: EndpointDescriptor) -> &mut Self {
        if let Some(previous) = self.registry.register(descriptor) {
            tracing::debug!(endpoint = %previous.name, "endpoint descriptor replaced");
        }
        self
    }

    pub fn register_all(&mut self, registry: EndpointRegistry) -> &mut Self {
        for descriptor in registry {
            self.register_endpoint(descriptor);
        }
        self
    }

    pub fn build(
        &self,
        credentials: Credentials,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<RequestPipeline, ConfigError> {
        let target = self.target.clone().ok_or(ConfigError::NotConfigured)?;
        if self.registry.is_empty() {
            tracing::warn!("building a request pipeline with no endpoints registered.");
        }

        // Only the include policy keeps server-set cookies between requests.
        let http = Client::builder()
            .cookie_store(target.credentials == CredentialPolicy::Include)
            .build()?;

        tracing::debug!(
            base_url = %target.base_url,
            endpoints = self.registry.len(),
            "request pipeline configured."
        );

        Ok(RequestPipeline {
            http,
            base_url: target.base_url,
            registry: Arc::new(self.registry.clone()),
            credentials,
            sink,
        })
    }
}

// One resolved call, discarded once the exchange completes.
#[derive(Debug)]
struct Invocation {
    url: Url,
    body: Option<Value>,
}

/// Single choke point for every call to the admin API.
///
/// Resolves a named endpoint, attaches the current bearer token and performs
/// exactly one HTTP exchange. Failures are turned into notifications on the
/// configured sink before the error is returned, so each invocation ends in
/// either a success value or notifications plus an error, never both.
#[derive(Clone)]
pub struct RequestPipeline {
    http: Client,
    base_url: Url,
    registry: Arc<EndpointRegistry>,
    credentials: Credentials,
    sink: Arc<dyn NotificationSink>,
}

impl RequestPipeline {
    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[tracing::instrument(name = "invoke", skip_all, fields(endpoint = %name))]
    pub async fn invoke(&self, name: &str, params: Value) -> Result<Value, InvokeError> {
        // Unknown names and bad params are caller bugs: fail before any I/O and
        // without notifying.
        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| InvokeError::UnknownEndpoint(name.to_string()))?;
        let invocation = self.resolve(descriptor, params)?;

        tracing::debug!(
            verb = %descriptor.verb,
            path = %invocation.url.path(),
            "dispatching request."
        );

        // Read the token per call so sign-in and sign-out apply to the next request.
        let mut request = self.http.request(method(descriptor.verb), invocation.url);
        if let Some(token) = self.current_token().await {
            request = request.bearer_auth(token.expose());
        }
        if let Some(body) = &invocation.body {
            request = request.json(body);
        }

        // Every failure past this point is reported to the sink exactly once.
        match exchange(request, descriptor).await {
            Ok(value) => Ok(value),
            Err(failure) => Err(self.fail(failure)),
        }
    }

    /// Typed form of [`invoke`](Self::invoke): the request is serialized into params
    /// and the success body decoded into `Res`. A body that does not decode counts
    /// as a malformed response.
    pub async fn call<Req, Res>(&self, name: &str, request: &Req) -> Result<Res, InvokeError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let params = serde_json::to_value(request).map_err(|err| InvokeError::InvalidParams {
            endpoint: name.to_string(),
            reason: err.to_string(),
        })?;
        let value = self.invoke(name, params).await?;

        serde_json::from_value(value).map_err(|err| {
            self.fail(Failure::malformed(format!(
                "response from `{name}` did not decode: {err}"
            )))
        })
    }

    fn fail(&self, failure: Failure) -> InvokeError {
        tracing::warn!(error = %failure, status = ?failure.status(), "invocation failed.");
        for notification in failure.notifications() {
            self.sink.notify(notification);
        }
        InvokeError::Failed(failure)
    }

    pub fn notify(&self, notification: Notification) {
        self.sink.notify(notification);
    }

    async fn current_token(&self) -> Option<SessionToken> {
        match self.credentials.access_token().await {
            Ok(token) => token,
            Err(err) => {
                // Proceed unauthenticated; the server answers with its own failure.
                tracing::warn!(error = %err, "could not read access token.");
                None
            }
        }
    }

    fn resolve(
        &self,
        descriptor: &EndpointDescriptor,
        params: Value,
    ) -> Result<Invocation, InvokeError> {
        let invalid = |reason: String| InvokeError::InvalidParams {
            endpoint: descriptor.name.clone(),
            reason,
        };

        // Null stands for "no params"; anything else must be an object.
        let mut params = match params {
            Value::Null => Map::new(),
            Value::Object(object) => object,
            other => return Err(invalid(format!("params must be an object, got `{other}`"))),
        };

        // Append the template to the base path, filling `{name}` segments from
        // params. Each value is encoded as a single segment.
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| invalid("base url cannot carry a path".to_string()))?;
            segments.pop_if_empty();
            for segment in descriptor.path.trim_start_matches('/').split('/') {
                match placeholder_name(segment) {
                    Some(key) => {
                        let value = params
                            .remove(key)
                            .ok_or_else(|| invalid(format!("missing path param `{key}`")))?;
                        let value = scalar_text(&value).ok_or_else(|| {
                            invalid(format!("path param `{key}` must be a scalar"))
                        })?;
                        segments.push(&value);
                    }
                    None => {
                        segments.push(segment);
                    }
                }
            }
        }

        // Check declared request fields against what is left after path filling.
        if let RequestShape::Json(fields) = descriptor.request {
            if let Some(missing) = fields.iter().find(|field| !params.contains_key(**field)) {
                return Err(invalid(format!("missing request field `{missing}`")));
            }
        }

        // Leftover params travel as a JSON body or as query pairs, by verb.
        let body = if descriptor.verb.carries_body() {
            match descriptor.request {
                RequestShape::None if params.is_empty() => None,
                _ => Some(Value::Object(params)),
            }
        } else {
            if !params.is_empty() {
                let mut query = url.query_pairs_mut();
                for (key, value) in &params {
                    let value = scalar_text(value).unwrap_or_else(|| value.to_string());
                    query.append_pair(key, &value);
                }
            }
            None
        };

        Ok(Invocation { url, body })
    }
}

async fn exchange(
    request: RequestBuilder,
    descriptor: &EndpointDescriptor,
) -> Result<Value, Failure> {
    let response = request.send().await.map_err(transport_failure)?;
    let status = response.status();
    // Read the body as text first; error payloads are not always JSON.
    let body = response.text().await.map_err(transport_failure)?;

    tracing::debug!(status = status.as_u16(), "response received.");

    // Keep upstream status and payload for callers that branch on them.
    if !status.is_success() {
        return Err(Failure::Server {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            payload: ErrorPayload::classify(&body),
        });
    }

    // An empty 2xx body decodes as null and is left to the shape check.
    let value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).map_err(|err| Failure::malformed(err.to_string()))?
    };

    if !descriptor.response.matches(&value) {
        return Err(Failure::malformed(format!(
            "response from `{}` does not match its declared shape",
            descriptor.name
        )));
    }

    Ok(value)
}

fn transport_failure(err: reqwest::Error) -> Failure {
    let kind = if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_connect() {
        TransportKind::Connect
    } else if err.is_decode() || err.is_body() {
        TransportKind::Malformed
    } else {
        TransportKind::Other
    };
    Failure::Transport {
        kind,
        message: err.to_string(),
    }
}

fn method(verb: HttpVerb) -> Method {
    match verb {
        HttpVerb::Get => Method::GET,
        HttpVerb::Post => Method::POST,
        HttpVerb::Put => Method::PUT,
        HttpVerb::Patch => Method::PATCH,
        HttpVerb::Delete => Method::DELETE,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface_adapters::session_store::InMemorySessionStore;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<Notification>>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, notification: Notification) {
            self.seen
                .lock()
                .expect("sink mutex poisoned")
                .push(notification);
        }
    }

    fn pipeline(
        base_url: &str,
        registry: EndpointRegistry,
    ) -> (RequestPipeline, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let mut builder = PipelineBuilder::new();
        builder
            .configure(base_url, CredentialPolicy::Omit)
            .expect("valid base url");
        builder.register_all(registry);
        let pipeline = builder
            .build(
                Credentials::new(Arc::new(InMemorySessionStore::default())),
                sink.clone(),
            )
            .expect("pipeline builds");
        (pipeline, sink)
    }

    fn article_registry() -> EndpointRegistry {
        let mut registry = EndpointRegistry::new();
        registry.register(EndpointDescriptor::get("article", "/news/{id}/"));
        registry.register(
            EndpointDescriptor::post("publish", "/news/{id}/publish/")
                .with_request(RequestShape::Json(&["channel"])),
        );
        registry
    }

    #[test]
    fn when_configure_repeats_identical_arguments_then_it_is_a_no_op() {
        let mut builder = PipelineBuilder::new();
        builder
            .configure("https://api.example.com", CredentialPolicy::Include)
            .expect("first configure");

        assert!(
            builder
                .configure("https://api.example.com", CredentialPolicy::Include)
                .is_ok()
        );
        assert!(matches!(
            builder.configure("https://other.example.com", CredentialPolicy::Include),
            Err(ConfigError::Reconfigured)
        ));
        assert!(matches!(
            builder.configure("https://api.example.com", CredentialPolicy::Omit),
            Err(ConfigError::Reconfigured)
        ));
    }

    #[test]
    fn when_base_url_is_not_http_then_configure_fails() {
        let mut builder = PipelineBuilder::new();

        assert!(matches!(
            builder.configure("ftp://files.example.com", CredentialPolicy::Omit),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            builder.configure("not a url", CredentialPolicy::Omit),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn when_build_runs_before_configure_then_it_fails() {
        let builder = PipelineBuilder::new();
        let result = builder.build(
            Credentials::new(Arc::new(InMemorySessionStore::default())),
            Arc::new(RecordingSink::default()),
        );

        assert!(matches!(result, Err(ConfigError::NotConfigured)));
    }

    #[test]
    fn placeholders_are_filled_and_leftovers_become_query_for_get() {
        let (pipeline, _) = pipeline("https://api.example.com/v1", article_registry());
        let descriptor = pipeline.registry().get("article").cloned().expect("registered");

        let invocation = pipeline
            .resolve(&descriptor, json!({"id": 42, "lang": "sv"}))
            .expect("resolves");

        assert_eq!(
            invocation.url.as_str(),
            "https://api.example.com/v1/news/42/?lang=sv"
        );
        assert!(invocation.body.is_none());
    }

    #[test]
    fn path_params_are_percent_encoded() {
        let (pipeline, _) = pipeline("https://api.example.com/", article_registry());
        let descriptor = pipeline.registry().get("article").cloned().expect("registered");

        let invocation = pipeline
            .resolve(&descriptor, json!({"id": "a b/c"}))
            .expect("resolves");

        assert_eq!(invocation.url.path(), "/news/a%20b%2Fc/");
    }

    #[test]
    fn leftovers_become_json_body_for_post() {
        let (pipeline, _) = pipeline("https://api.example.com", article_registry());
        let descriptor = pipeline.registry().get("publish").cloned().expect("registered");

        let invocation = pipeline
            .resolve(&descriptor, json!({"id": "7", "channel": "push"}))
            .expect("resolves");

        assert_eq!(invocation.url.path(), "/news/7/publish/");
        assert_eq!(invocation.body, Some(json!({"channel": "push"})));
    }

    #[tokio::test]
    async fn when_endpoint_is_unknown_then_no_notification_is_emitted() {
        let (pipeline, sink) = pipeline("https://api.example.com", article_registry());

        let result = pipeline.invoke("missing", Value::Null).await;

        assert!(matches!(result, Err(InvokeError::UnknownEndpoint(name)) if name == "missing"));
        assert!(sink.seen.lock().expect("sink mutex poisoned").is_empty());
    }

    #[tokio::test]
    async fn when_required_field_is_missing_then_params_are_rejected_silently() {
        let (pipeline, sink) = pipeline("https://api.example.com", article_registry());

        let result = pipeline.invoke("publish", json!({"id": "7"})).await;

        assert!(matches!(result, Err(InvokeError::InvalidParams { .. })));
        assert!(sink.seen.lock().expect("sink mutex poisoned").is_empty());
    }
}
