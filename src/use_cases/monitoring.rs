use crate::interface_adapters::pipeline::{InvokeError, RequestPipeline};
use crate::interface_adapters::protocol::{
    ApiTiming, DashboardSummary, EngagementPoint, ErrorLogEntry, ResourceUsagePoint,
};
use crate::interface_adapters::registry::names;

// Every panel of the performance page, each with its own outcome.
#[derive(Debug)]
pub struct DashboardSnapshot {
    pub summary: Result<DashboardSummary, InvokeError>,
    pub api_timing: Result<ApiTiming, InvokeError>,
    pub engagement: Result<Vec<EngagementPoint>, InvokeError>,
    pub resource_usage: Result<Vec<ResourceUsagePoint>, InvokeError>,
    pub errors: Result<Vec<ErrorLogEntry>, InvokeError>,
}

impl DashboardSnapshot {
    // Panels that will render an error state.
    pub fn failed_panels(&self) -> usize {
        [
            self.summary.is_err(),
            self.api_timing.is_err(),
            self.engagement.is_err(),
            self.resource_usage.is_err(),
            self.errors.is_err(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }
}

// Read-only queries behind the performance and monitoring charts.
#[derive(Clone)]
pub struct MonitoringDashboard {
    pipeline: RequestPipeline,
}

impl MonitoringDashboard {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    // Each query notifies on its own failure; callers only decide what to render.
    pub async fn summary(&self) -> Result<DashboardSummary, InvokeError> {
        self.pipeline.call(names::SUMMARY_DATA, &()).await
    }

    pub async fn api_timing(&self) -> Result<ApiTiming, InvokeError> {
        self.pipeline.call(names::GET_MONITORING_DATA, &()).await
    }

    pub async fn engagement(&self) -> Result<Vec<EngagementPoint>, InvokeError> {
        self.pipeline.call(names::CHART_ENGAGEMENT, &()).await
    }

    pub async fn resource_usage(&self) -> Result<Vec<ResourceUsagePoint>, InvokeError> {
        self.pipeline.call(names::RESOURCE_USE, &()).await
    }

    pub async fn errors(&self) -> Result<Vec<ErrorLogEntry>, InvokeError> {
        self.pipeline.call(names::ERRORS_DATA, &()).await
    }

    // Fetches all panels concurrently. A failing panel does not hide the others.
    #[tracing::instrument(name = "dashboard_snapshot", skip_all)]
    pub async fn snapshot(&self) -> DashboardSnapshot {
        // join! rather than try_join!: one failing panel must not cancel the rest.
        let (summary, api_timing, engagement, resource_usage, errors) = tokio::join!(
            self.summary(),
            self.api_timing(),
            self.engagement(),
            self.resource_usage(),
            self.errors(),
        );

        let snapshot = DashboardSnapshot {
            summary,
            api_timing,
            engagement,
            resource_usage,
            errors,
        };
        // Failures were already logged and notified per panel; only count them here.
        tracing::debug!(failed = snapshot.failed_panels(), "dashboard snapshot fetched.");
        snapshot
    }
}
