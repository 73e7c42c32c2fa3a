use actor_kv_store::{cli::Cli, server::Server, spawn_store};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let (store, mut worker) = spawn_store::<String>(cli.store_config());

    let listener = TcpListener::bind(cli.listen).await?;
    let server = Server::new(listener, store, cli.request_timeout());
    let addr = server.local_addr()?;
    info!("kv server listening on {}", addr);

    tokio::select! {
        result = server.run_until_ctrl_c() => {
            if let Err(err) = result {
                warn!("server exited with error: {err:?}");
                return Err(err);
            }
        }
        joined = &mut worker => {
            // The server still holds a handle, so the worker can only get here by panicking.
            error!(?joined, "store worker stopped while serving");
            anyhow::bail!("store worker stopped while serving");
        }
    }

    worker.await.context("store worker panicked")?;
    Ok(())
}
