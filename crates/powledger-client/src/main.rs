use clap::Parser;
use powledger_client::{menu, ClientArgs, LocalTransport, TcpTransport};
use powledger_core::LedgerService;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout belongs to the menu
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = ClientArgs::parse();
    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();

    if args.local {
        let service = LedgerService::new(&args.ledger_config());
        info!(chain_hash = service.chain().chain_hash(), "local ledger ready");
        let mut transport = LocalTransport::new(service);
        menu::run(&mut transport, input, &mut out).await
    } else {
        let mut transport = TcpTransport::connect(args.server).await?;
        info!(server = %args.server, "connected");
        menu::run(&mut transport, input, &mut out).await
    }
}
