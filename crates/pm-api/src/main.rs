#[tokio::main]
async fn main() {
    if let Err(err) = pm_api::run().await {
        tracing::error!(error = %err, "pm-api failed");
        std::process::exit(1);
    }
}
