pub mod run;
pub mod trace;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use tracr_common::config::{
    CampaignConfig, DEFAULT_CONCURRENCY, DEFAULT_HOP_TIMEOUT, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_HOPS, DEFAULT_POLL_INTERVAL, DEFAULT_PUBLISH_ATTEMPTS, PublishBudget,
};

const DEFAULT_WAIT_MS: u64 = DEFAULT_HOP_TIMEOUT.as_millis() as u64;
const DEFAULT_POLL_MS: u64 = DEFAULT_POLL_INTERVAL.as_millis() as u64;

#[derive(Parser)]
#[command(name = "tracr")]
#[command(version, about = "Concurrent traceroute campaigns.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Print less; repeat to print only the summary
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Print more; repeat for per-line probe output
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Trace the route to many destinations concurrently
    #[command(alias = "r")]
    Run(RunArgs),
    /// Trace the route to a single destination
    #[command(alias = "t")]
    Trace {
        destination: String,
        #[command(flatten)]
        probe: ProbeArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Per-hop reply timeout in milliseconds
    #[arg(short = 'w', long = "wait", value_name = "MS", default_value_t = DEFAULT_WAIT_MS)]
    pub wait: u64,

    /// Highest TTL to try
    #[arg(short = 'm', long = "max-hops", default_value_t = DEFAULT_MAX_HOPS)]
    pub max_hops: u8,

    /// How often a running probe checks for cancellation, in milliseconds
    #[arg(long = "poll", value_name = "MS", default_value_t = DEFAULT_POLL_MS)]
    pub poll: u64,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Hostnames or addresses to trace
    pub destinations: Vec<String>,

    /// Read destinations from a file, one per line or comma separated
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Probes running at the same time
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Probe attempts per destination before giving up
    #[arg(short = 'r', long = "retries", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    #[command(flatten)]
    pub probe: ProbeArgs,

    /// Submissions of one result before publishing counts as failed
    #[arg(long, default_value_t = DEFAULT_PUBLISH_ATTEMPTS)]
    pub publish_attempts: u32,

    /// Fail a destination when publishing fails instead of probing it again
    #[arg(long)]
    pub independent_publish: bool,

    /// Directory receiving one JSON file per traced destination
    #[arg(short, long, value_name = "DIR", default_value = "results")]
    pub output: PathBuf,

    /// Session identifier stamped on every result
    #[arg(long, value_name = "ID")]
    pub session: Option<String>,
}

impl ProbeArgs {
    pub fn apply(&self, config: &mut CampaignConfig) {
        config.hop_timeout = Duration::from_millis(self.wait);
        config.max_hops = self.max_hops;
        config.poll_interval = Duration::from_millis(self.poll);
    }
}

impl RunArgs {
    pub fn to_config(&self) -> CampaignConfig {
        let mut config: CampaignConfig = CampaignConfig {
            concurrency: self.concurrency,
            max_attempts: self.max_attempts,
            publish_attempts: self.publish_attempts,
            publish_budget: if self.independent_publish {
                PublishBudget::Independent
            } else {
                PublishBudget::Shared
            },
            ..CampaignConfig::default()
        };
        self.probe.apply(&mut config);
        config
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
