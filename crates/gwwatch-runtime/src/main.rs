//! gwwatch: debounced OPNsense gateway status monitor.
//! Polls the router, debounces status changes per gateway, and prints one
//! JSON line per reported change. Debounce state lives in SQLite.

use clap::Parser;

mod cli;
mod cmd_check;
mod cmd_list;
mod cmd_state;
mod context;
mod poll_loop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Logs go to stderr; stdout carries events and command output.
    let filter = std::env::var("GWWATCH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        cli::Command::Watch(opts) => {
            tracing::info!("gwwatch starting");
            poll_loop::run_watch(&args.router, opts).await?;
        }
        cli::Command::Check(opts) => {
            cmd_check::cmd_check(&args.router, opts).await?;
        }
        cli::Command::List => {
            cmd_list::cmd_list(&args.router).await?;
        }
        cli::Command::Verify => {
            cmd_list::cmd_verify(&args.router).await?;
        }
        cli::Command::State(opts) => {
            cmd_state::cmd_state(&args.router, &opts)?;
        }
        cli::Command::Reset(opts) => {
            cmd_state::cmd_reset(&args.router, &opts)?;
        }
    }

    Ok(())
}
