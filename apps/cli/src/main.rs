//! ghostwriter CLI: manage a Ghost site's content, members and settings
//! through the Admin API.

mod commands;
mod output;

use clap::Parser;
use color_eyre::eyre::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_until_interrupted(cli));

    // Stdin reads and terminal prompts sit on blocking threads that cannot be
    // interrupted; don't wait for them once the command has returned.
    runtime.shutdown_background();
    result
}

async fn run_until_interrupted(cli: Cli) -> Result<()> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling");
            on_signal.cancel();
        }
    });

    commands::run(cli, cancel).await
}
