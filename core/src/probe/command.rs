//! A probe executor backed by an **external traceroute process**.
//!
//! The process is started with the resolved address as its last argument,
//! its standard output is read line by line, and the cancellation signal is
//! checked after every line and on every poll tick. A canceled probe kills
//! its child before returning.

use std::net::IpAddr;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, trace};
use tracr_common::config::CampaignConfig;
use tracr_common::network::{destination::Destination, hop::HopList};
use tracr_protocols::traceroute;

use super::{ProbeExecutor, resolver};
use crate::error::ProbeError;
use crate::signal::CancellationSignal;

#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
    poll_interval: Duration,
}

impl CommandProbe {
    /// Uses the platform traceroute utility with numeric output.
    pub fn system(config: &CampaignConfig) -> Self {
        let (program, args) = system_command(config.hop_timeout, config.max_hops);
        Self {
            program,
            args,
            poll_interval: config.poll_interval,
        }
    }

    /// Runs `program args... <address>` instead of the platform utility.
    ///
    /// The program must print traceroute-style hop lines on standard output.
    pub fn custom(program: impl Into<String>, args: Vec<String>, poll_interval: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            poll_interval,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn ticker(&self) -> Interval {
        let mut ticker: Interval = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    /// Drives `work` to completion unless the signal is raised first, which
    /// is checked on every poll tick.
    async fn until_canceled<F: Future>(
        &self,
        work: F,
        signal: &CancellationSignal,
    ) -> Result<F::Output, ProbeError> {
        let mut ticker: Interval = self.ticker();
        tokio::pin!(work);

        loop {
            tokio::select! {
                output = &mut work => return Ok(output),
                _ = ticker.tick() => {
                    if signal.is_canceled() {
                        return Err(ProbeError::Canceled);
                    }
                }
            }
        }
    }

    async fn read_output(
        &self,
        child: &mut Child,
        stdout: ChildStdout,
        signal: &CancellationSignal,
    ) -> Result<Vec<String>, ProbeError> {
        let mut reader: Lines<BufReader<ChildStdout>> = BufReader::new(stdout).lines();
        let mut ticker: Interval = self.ticker();
        let mut output: Vec<String> = Vec::new();

        loop {
            tokio::select! {
                line = reader.next_line() => match line? {
                    Some(line) => {
                        if signal.is_canceled() {
                            return Err(abort(child).await);
                        }
                        trace!("{}: {line}", self.program);
                        output.push(line);
                    }
                    None => return Ok(output),
                },
                _ = ticker.tick() => {
                    if signal.is_canceled() {
                        return Err(abort(child).await);
                    }
                }
            }
        }
    }

    async fn wait_exit(
        &self,
        child: &mut Child,
        signal: &CancellationSignal,
    ) -> Result<ExitStatus, ProbeError> {
        let mut ticker: Interval = self.ticker();

        loop {
            tokio::select! {
                status = child.wait() => return Ok(status?),
                _ = ticker.tick() => {
                    if signal.is_canceled() {
                        return Err(abort(child).await);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl ProbeExecutor for CommandProbe {
    async fn execute(
        &self,
        destination: &mut Destination,
        signal: &CancellationSignal,
    ) -> Result<HopList, ProbeError> {
        if signal.is_canceled() {
            return Err(ProbeError::Canceled);
        }

        // Lookups can stall for the resolver's whole retry cycle.
        let address: IpAddr = self
            .until_canceled(resolver::resolve(destination), signal)
            .await??;

        debug!("Starting {} toward {destination}", self.program);

        let mut child: Child = Command::new(&self.program)
            .args(&self.args)
            .arg(address.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProbeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout: ChildStdout = child
            .stdout
            .take()
            .ok_or_else(|| ProbeError::Execution("probe output was not captured".to_string()))?;

        let lines: Vec<String> = self.read_output(&mut child, stdout, signal).await?;
        let status: ExitStatus = self.wait_exit(&mut child, signal).await?;

        if !status.success() {
            return Err(ProbeError::ExitStatus { status });
        }

        Ok(traceroute::parse_output(&lines))
    }
}

async fn abort(child: &mut Child) -> ProbeError {
    if let Err(e) = child.kill().await {
        debug!("Failed to kill canceled probe: {e}");
    }
    ProbeError::Canceled
}

fn system_command(hop_timeout: Duration, max_hops: u8) -> (String, Vec<String>) {
    if cfg!(windows) {
        let args: Vec<String> = vec![
            "-d".to_string(),
            "-w".to_string(),
            hop_timeout.as_millis().to_string(),
            "-h".to_string(),
            max_hops.to_string(),
        ];
        ("tracert".to_string(), args)
    } else {
        // traceroute only takes whole seconds.
        let wait_secs: u128 = hop_timeout.as_millis().div_ceil(1_000).max(1);
        let args: Vec<String> = vec![
            "-n".to_string(),
            "-w".to_string(),
            wait_secs.to_string(),
            "-m".to_string(),
            max_hops.to_string(),
        ];
        ("traceroute".to_string(), args)
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
