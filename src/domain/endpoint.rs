use serde_json::Value;
use std::fmt;

// HTTP verbs understood by the remote admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Delete => "DELETE",
        }
    }

    // Leftover params go into a JSON body for these verbs and into the query string otherwise.
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpVerb::Post | HttpVerb::Put | HttpVerb::Patch)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Fields an endpoint expects in its request params.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    None,
    Json(&'static [&'static str]),
}

// Declared structure of a successful response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Object(&'static [&'static str]),
    ListOf(&'static [&'static str]),
}

impl ResponseShape {
    /// Structural check of a decoded 2xx body: required keys only, values are not inspected.
    /// An empty body (decoded as `null`) satisfies an object shape that declares no fields.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ResponseShape::Object(fields) if fields.is_empty() && value.is_null() => true,
            ResponseShape::Object(fields) => has_fields(value, fields),
            ResponseShape::ListOf(fields) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| has_fields(item, fields))),
        }
    }
}

fn has_fields(value: &Value, fields: &[&str]) -> bool {
    value
        .as_object()
        .is_some_and(|object| fields.iter().all(|field| object.contains_key(*field)))
}

/// Static definition of one named remote operation.
///
/// Paths are templates: a segment written as `{name}` is filled from the invocation
/// params of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub name: String,
    pub verb: HttpVerb,
    pub path: String,
    pub request: RequestShape,
    pub response: ResponseShape,
}

impl EndpointDescriptor {
    // Defaults to no request fields and a response with no required keys, which
    // also accepts an empty body such as a 204.
    pub fn new(name: impl Into<String>, verb: HttpVerb, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verb,
            path: path.into(),
            request: RequestShape::None,
            response: ResponseShape::Object(&[]),
        }
    }

    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, HttpVerb::Get, path)
    }

    pub fn post(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, HttpVerb::Post, path)
    }

    #[must_use]
    pub fn with_request(mut self, request: RequestShape) -> Self {
        self.request = request;
        self
    }

    #[must_use]
    pub fn with_response(mut self, response: ResponseShape) -> Self {
        self.response = response;
        self
    }

    // Names of the `{placeholder}` segments, in path order.
    pub fn placeholders(&self) -> Vec<&str> {
        self.path.split('/').filter_map(placeholder_name).collect()
    }
}

pub(crate) fn placeholder_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .filter(|name| !name.is_empty())
}
