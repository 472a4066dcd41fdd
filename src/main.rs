use std::error::Error;

use clap::Parser;

mod cli;
mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;
mod storage;

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = cli::Cli::parse();
    let mut cfg = config::Config::load_from(&cli.config)?;
    cli.apply(&mut cfg);
    logger::init(&cfg.logging)?;

    // Worker count comes from config, defaulting to the number of CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = cfg.get_socket_addr()?;
    let state = config::AppState::shared(cfg)?;

    state.store.ensure_dir().await.map_err(|e| {
        format!(
            "Failed to create upload directory '{}': {e}",
            state.store.dir().display()
        )
    })?;

    let shutdown = server::ShutdownSignal::register()?;
    let listener = server::create_listener(addr)?;
    logger::log_server_start(&addr, &state.config);

    server::run_server(listener, state, shutdown.recv()).await;
    Ok(())
}
