use clap::Parser;
use std::sync::Arc;
use tokio::sync::Notify;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod producer;
mod server;

/// Stream files and directory listings from a local directory over HTTP
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file, extension optional
    #[arg(short, long, default_value = "config")]
    config: String,

    /// Directory to serve, overriding `serve.root`
    #[arg(short, long)]
    root: Option<String>,

    /// Port to listen on, overriding `server.port`
    #[arg(short, long)]
    port: Option<u16>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = config::Config::load_from(&cli.config)?.with_overrides(config::Overrides {
        root: cli.root,
        port: cli.port,
    });
    logger::init(&cfg)?;

    // Worker count from config, defaulting to one per core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    if !std::path::Path::new(&cfg.serve.root).is_dir() {
        logger::log_warning(&format!(
            "Serving root {} is not a directory; every request will be answered with 404",
            cfg.serve.root
        ));
    }

    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    let state = Arc::new(config::AppState::new(cfg));
    server::start_server_loop(listener, state, shutdown).await;
    Ok(())
}
