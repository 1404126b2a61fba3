// Framework bootstrap for the admin console binary.

use crate::domain::{Credentials, Notification, NotificationSink};
use crate::frameworks::config::AppConfig;
use crate::interface_adapters::{
    ChannelSink, ConfigError, FileSessionStore, PipelineBuilder, RequestPipeline, TracingSink,
    admin_endpoints,
};
use crate::use_cases::{MonitoringDashboard, SignInError, SignInFlow};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Parser)]
#[command(name = "admin_console", about = "Sports admin dashboard console")]
pub struct Cli {
    /// Send notifications to the log instead of printing them.
    #[arg(long, global = true, env = "ADMIN_LOG_NOTIFICATIONS")]
    pub log_notifications: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Request an OTP for an admin account.
    Login { email: String, password: String },
    /// Complete sign-in with the OTP sent by email.
    Verify { otp: String },
    /// Send the OTP again to the pending login email.
    Resend,
    /// Forget the stored session.
    Logout,
    /// Fetch monitoring dashboard data.
    Monitoring {
        #[arg(value_enum, default_value_t = Panel::All)]
        panel: Panel,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Panel {
    Summary,
    Api,
    Engagement,
    Server,
    Errors,
    All,
}

#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error(transparent)]
    SignIn(#[from] SignInError),
    #[error(transparent)]
    Invoke(#[from] crate::interface_adapters::InvokeError),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("{0} monitoring panel(s) failed")]
    Panels(usize),
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub fn build_pipeline(
    config: &AppConfig,
    credentials: Credentials,
    sink: Arc<dyn NotificationSink>,
) -> Result<RequestPipeline, ConfigError> {
    let mut builder = PipelineBuilder::new();
    builder.configure(&config.api_base_url, config.credentials)?;
    builder.register_all(admin_endpoints());
    builder.build(credentials, sink)
}

// Pick where notifications go; the printer task exists only for the channel sink.
fn notification_sink(
    log_notifications: bool,
) -> (Arc<dyn NotificationSink>, Option<JoinHandle<()>>) {
    if log_notifications {
        return (Arc::new(TracingSink), None);
    }
    let (sink, rx) = ChannelSink::channel();
    let printer = tokio::spawn(print_notifications(rx));
    (Arc::new(sink), Some(printer))
}

pub async fn run() -> ExitCode {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(
        api_base_url = %config.api_base_url,
        session_file = %config.session_file.display(),
        "configuration loaded."
    );

    let store = FileSessionStore::new(&config.session_file);
    let (sink, printer) = notification_sink(cli.log_notifications);

    let pipeline = match build_pipeline(&config, Credentials::new(Arc::new(store)), sink) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!(error = %e, "failed to configure request pipeline");
            return ExitCode::FAILURE;
        }
    };

    let outcome = execute(cli.command, pipeline).await;

    // Every sender is gone once the pipeline is dropped, so the printer drains and exits.
    if let Some(printer) = printer {
        if let Err(e) = printer.await {
            tracing::error!(error = %e, "notification printer failed");
        }
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command, pipeline: RequestPipeline) -> Result<(), CommandError> {
    match command {
        Command::Login { email, password } => {
            let response = SignInFlow::new(pipeline).login(&email, &password).await?;
            print_json(&response)
        }
        Command::Verify { otp } => {
            let response = SignInFlow::new(pipeline).verify_otp(&otp).await?;
            print_json(&response.user)
        }
        Command::Resend => {
            let response = SignInFlow::new(pipeline).resend_otp().await?;
            print_json(&response)
        }
        Command::Logout => Ok(SignInFlow::new(pipeline).sign_out().await?),
        Command::Monitoring { panel } => {
            fetch_panel(MonitoringDashboard::new(pipeline), panel).await
        }
    }
}

async fn fetch_panel(dashboard: MonitoringDashboard, panel: Panel) -> Result<(), CommandError> {
    match panel {
        Panel::Summary => print_json(&dashboard.summary().await?),
        Panel::Api => print_json(&dashboard.api_timing().await?),
        Panel::Engagement => print_json(&dashboard.engagement().await?),
        Panel::Server => print_json(&dashboard.resource_usage().await?),
        Panel::Errors => print_json(&dashboard.errors().await?),
        Panel::All => {
            let snapshot = dashboard.snapshot().await;
            let failed = snapshot.failed_panels();
            print_json(&serde_json::json!({
                "summary": snapshot.summary.ok(),
                "api": snapshot.api_timing.ok(),
                "engagement": snapshot.engagement.ok(),
                "server": snapshot.resource_usage.ok(),
                "errors": snapshot.errors.ok(),
            }))?;
            if failed > 0 {
                return Err(CommandError::Panels(failed));
            }
            Ok(())
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// Display side of the notification channel.
async fn print_notifications(mut rx: mpsc::UnboundedReceiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        eprintln!(
            "[{}] {}: {}",
            notification.severity, notification.title, notification.description
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_notifications_flag_is_accepted_after_the_subcommand() {
        let args = ["admin_console", "monitoring", "errors", "--log-notifications"];

        let cli = Cli::try_parse_from(args).expect("valid arguments");

        assert!(cli.log_notifications);
        assert!(matches!(
            cli.command,
            Command::Monitoring {
                panel: Panel::Errors
            }
        ));
    }

    #[tokio::test]
    async fn when_notifications_are_logged_then_no_printer_is_spawned() {
        let (sink, printer) = notification_sink(true);

        sink.notify(Notification::destructive("Error", "500 Internal Server Error"));

        assert!(printer.is_none());
    }

    #[tokio::test]
    async fn printer_drains_once_the_sink_is_dropped() {
        let (sink, printer) = notification_sink(false);

        sink.notify(Notification::success("Success", "OTP resent successfully!"));
        drop(sink);

        printer
            .expect("channel sink has a printer")
            .await
            .expect("printer exits cleanly");
    }
}
