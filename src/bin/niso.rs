use anyhow::Result;
use clap::Parser;
use niso::cli::{print_error, run, NisoCli};
use tracing::debug;

#[tokio::main]
async fn main() {
    if let Err(e) = try_main().await {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn try_main() -> Result<()> {
    let cli = NisoCli::parse();

    // Logs go to stderr so they never interleave with relayed remote output.
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    debug!("Starting niso v{}", env!("CARGO_PKG_VERSION"));

    run(cli).await?;
    Ok(())
}
