use serde::{Deserialize, Serialize};
use std::fmt;

// Wire DTOs for the admin API, one per request/response body.

#[derive(Clone, Serialize)]
pub struct LoginAdminRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoginAdminResponse {
    pub message: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Clone, PartialEq, Deserialize, Serialize)]
pub struct VerifyOtpResponse {
    pub access: String,
    pub refresh: String,
    pub user: AdminUser,
}

// Token values never reach logs.
impl fmt::Debug for VerifyOtpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyOtpResponse")
            .field("access", &"***")
            .field("refresh", &"***")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResendOtpRequest {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// Average latency for the slowest tracked API endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiTiming {
    pub endpoint: String,
    pub avg_time: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngagementPoint {
    pub date: String,
    pub active_users: u64,
    pub avg_session_min: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResourceUsagePoint {
    pub memory_usage: f64,
    pub cpu_usage: f64,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorLogEntry {
    pub id: u64,
    pub level: String,
    pub message: String,
    pub path: String,
    pub count: u64,
    pub time_ago: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DashboardSummary {
    pub cache_hit_rate: f64,
    pub live_users: u64,
    pub response_time: f64,
    pub server_load: f64,
}
