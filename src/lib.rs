// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod host;
pub mod kernel;
pub mod logging;
pub mod repl;

use anyhow::Result;
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default};
use crate::host::Session;
use crate::kernel::{DiscoKernel, InterruptHandle, KernelInfo, interrupt_channel};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - the Disco child process and the kernel adapter around it
/// - SIGINT → interrupt of the running request
/// - the stdin/stdout request loop
pub async fn run(args: CliArgs) -> Result<()> {
    let raw = load_or_default(args.config.as_deref())?.with_binary_override(args.binary.clone());
    let cfg = ConfigFile::try_from(raw)?;

    if args.print_info {
        println!("{}", serde_json::to_string_pretty(&KernelInfo::disco())?);
        return Ok(());
    }

    let (interrupts, listener) = interrupt_channel();
    let kernel = DiscoKernel::start(&cfg, listener).await?;

    forward_sigint(interrupts.clone());

    info!(
        binary = %cfg.repl.binary,
        prompt = ?cfg.repl.prompt,
        "serving requests on stdin/stdout"
    );
    Session::new(kernel, interrupts)
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    Ok(())
}

/// Turn every SIGINT the kernel receives into an interrupt of the running
/// request. The child sits in its own process group, so it only sees the
/// signal we forward.
fn forward_sigint(interrupts: InterruptHandle) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for SIGINT");
                return;
            }
            info!("SIGINT received; interrupting the running request");
            interrupts.interrupt();
        }
    });
}
