use anyhow::Result;

use slither_arena::net::dispatcher::DispatcherHandle;
use slither_arena::net::ws::WsServer;
use slither_arena::state::lobby::Lobby;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:9001".to_owned());

    let lobby = Lobby::new();
    let dispatcher = DispatcherHandle::new(lobby);
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(WsServer::serve(&addr, dispatcher))?;
    Ok(())
}
