// src/main.rs

use disco_kernel::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("disco-kernel error: {err:?}");
        std::process::exit(1);
    }
    // The stdin reader may still be parked in a blocking read, which would
    // keep the runtime from shutting down.
    std::process::exit(0);
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
