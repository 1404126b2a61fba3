// Use cases layer: admin workflows built on the request pipeline.

pub mod monitoring;
pub mod sign_in;

pub use monitoring::{DashboardSnapshot, MonitoringDashboard};
pub use sign_in::{SignInError, SignInFlow};
