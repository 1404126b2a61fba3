use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Delegate to the console framework entry point.
    admin_console::run().await
}
