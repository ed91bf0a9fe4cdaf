use clap::Parser;
use powledger_core::LedgerService;
use powledger_node::{NodeArgs, Server};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = NodeArgs::parse();
    let service = LedgerService::new(&args.ledger_config());
    info!(
        chain_hash = service.chain().chain_hash(),
        hashes_per_second = service.chain().hashes_per_second(),
        "ledger ready"
    );

    // mining holds the server's worker; the signal is watched off that task
    let server = Server::bind(args.listen, service).await?;
    let serving = tokio::spawn(server.run());
    tokio::select! {
        res = serving => res?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down, ledger discarded");
            // runtime shutdown would wait on an in-flight mine
            std::process::exit(0)
        }
    }
}
