mod args;
mod output;
mod runner;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Scan {
            subnet,
            ports,
            concurrency,
            timeout,
            host_cap,
            output_format,
        } => {
            runner::run_scan(
                &cli.user,
                subnet,
                ports,
                concurrency,
                timeout,
                host_cap,
                output_format,
            )
            .await?;
        }
        Commands::Monitor {
            interface,
            alert_threshold,
            history,
            policy,
        } => {
            runner::run_monitor(&cli.user, interface, alert_threshold, history, policy).await?;
        }
        Commands::Sweep { subnet, host_cap } => {
            runner::run_sweep(&cli.user, subnet, host_cap).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).compact().init();
}
