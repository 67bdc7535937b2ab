use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "securenet")]
#[command(version)]
#[command(about = "Network security automation: subnet scanning and traffic monitoring", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Identity used for permission checks
    #[arg(short, long, default_value = "admin", global = true)]
    pub user: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover live hosts and open ports on a subnet
    Scan {
        /// Subnet in CIDR notation. Example: 192.168.1.0/24
        #[arg(short, long)]
        subnet: String,

        /// Ports to probe. Examples: 22,80,443 or 1-1024 or 22,80-90
        #[arg(short, long, default_value = "22,80,443,3389,5432")]
        ports: String,

        /// Max concurrent probes
        #[arg(short, long, default_value = "50")]
        concurrency: usize,

        /// Per-probe timeout in milliseconds
        #[arg(long, default_value = "1000")]
        timeout: u64,

        /// Refuse to enumerate prefixes with more usable hosts than this
        #[arg(long, default_value = "4096")]
        host_cap: u128,

        /// Output format: table, json
        #[arg(short, long, default_value = "table")]
        output_format: String,
    },
    /// Passively monitor traffic and alert on volume thresholds
    Monitor {
        /// Capture interface (default: first up, non-loopback interface)
        #[arg(short, long)]
        interface: Option<String>,

        /// Cumulative packet count past which alerts fire
        #[arg(short = 't', long, default_value = "1000")]
        alert_threshold: u64,

        /// Number of recent alerts retained in the report
        #[arg(long, default_value = "5")]
        history: usize,

        /// Alert rearm policy: every-packet, once, or every-n:<N>
        #[arg(long, default_value = "every-packet")]
        policy: String,
    },
    /// Ping sweep a subnet for responsive hosts
    Sweep {
        /// Subnet in CIDR notation
        #[arg(short, long)]
        subnet: String,

        /// Refuse to enumerate prefixes with more usable hosts than this
        #[arg(long, default_value = "4096")]
        host_cap: u128,
    },
}
