use clap::Parser;
use vizport_server::{Config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();
    let config = Config::parse();
    vizport_server::run(config).await
}
