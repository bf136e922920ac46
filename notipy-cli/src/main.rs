use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notipy_cli::{log_targets, Cli, Outcome};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(log_targets(cli.verbose))
        .init();

    debug!("Handling command: {:?}", cli.command);

    match notipy_cli::run(cli).await? {
        Outcome::Sent(response) => println!("{}", serde_json::to_string(&response)?),
        Outcome::Rendered(text) => println!("{text}"),
    }

    Ok(())
}
