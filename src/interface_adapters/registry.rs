use crate::domain::{EndpointDescriptor, RequestShape, ResponseShape};
use std::collections::HashMap;

// Endpoint names as the remote contract spells them.
pub mod names {
    pub const LOGIN_ADMIN: &str = "loginAdmin";
    pub const VERIFY_OTP: &str = "verifyOtp";
    pub const RESEND_OTP: &str = "resendOtp";
    pub const GET_MONITORING_DATA: &str = "getMonitoringData";
    pub const CHART_ENGAGEMENT: &str = "chartEngagement";
    pub const RESOURCE_USE: &str = "resoursUse";
    pub const ERRORS_DATA: &str = "errorsData";
    pub const SUMMARY_DATA: &str = "summaryData";
}

// Name-keyed set of endpoint descriptors. Registering an existing name replaces it.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: HashMap<String, EndpointDescriptor>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Returns the descriptor that was replaced, if any.
    pub fn register(&mut self, descriptor: EndpointDescriptor) -> Option<EndpointDescriptor> {
        self.endpoints.insert(descriptor.name.clone(), descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.get(name)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.endpoints.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl IntoIterator for EndpointRegistry {
    type Item = EndpointDescriptor;
    type IntoIter = std::collections::hash_map::IntoValues<String, EndpointDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.into_values()
    }
}

// The admin API surface: authentication and monitoring dashboard endpoints.
pub fn admin_endpoints() -> EndpointRegistry {
    let mut registry = EndpointRegistry::new();

    registry.register(
        EndpointDescriptor::post(names::LOGIN_ADMIN, "/auth/login/admin/")
            .with_request(RequestShape::Json(&["email", "password"]))
            .with_response(ResponseShape::Object(&["message", "email"])),
    );
    registry.register(
        EndpointDescriptor::post(names::VERIFY_OTP, "/auth/login/admin/verify/")
            .with_request(RequestShape::Json(&["email", "otp"]))
            .with_response(ResponseShape::Object(&["access", "refresh", "user"])),
    );
    registry.register(
        EndpointDescriptor::post(names::RESEND_OTP, "/auth/password-reset-request/")
            .with_request(RequestShape::Json(&["email"]))
            .with_response(ResponseShape::Object(&["message"])),
    );

    registry.register(
        EndpointDescriptor::get(names::GET_MONITORING_DATA, "/monitoring/dashboard/charts/api/")
            .with_response(ResponseShape::Object(&["endpoint", "avg_time"])),
    );
    registry.register(
        EndpointDescriptor::get(
            names::CHART_ENGAGEMENT,
            "/monitoring/dashboard/charts/engagement/",
        )
        .with_response(ResponseShape::ListOf(&[
            "date",
            "active_users",
            "avg_session_min",
        ])),
    );
    registry.register(
        EndpointDescriptor::get(names::RESOURCE_USE, "/monitoring/dashboard/charts/server/")
            .with_response(ResponseShape::ListOf(&["memory_usage", "cpu_usage", "time"])),
    );
    registry.register(
        EndpointDescriptor::get(names::ERRORS_DATA, "/monitoring/dashboard/errors/").with_response(
            ResponseShape::ListOf(&["id", "level", "message", "path", "count", "time_ago"]),
        ),
    );
    registry.register(
        EndpointDescriptor::get(names::SUMMARY_DATA, "/monitoring/dashboard/summary/")
            .with_response(ResponseShape::Object(&[
                "cache_hit_rate",
                "live_users",
                "response_time",
                "server_load",
            ])),
    );

    registry
}
