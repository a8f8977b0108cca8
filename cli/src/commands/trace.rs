use std::net::IpAddr;
use std::time::Instant;

use colored::*;
use tracing::{Instrument, Span, info_span, warn};
use tracing_indicatif::span_ext::IndicatifSpanExt;
use tracr_common::config::CampaignConfig;
use tracr_common::network::destination::Destination;
use tracr_common::network::hop::{Hop, HopList};
use tracr_core::error::ProbeError;
use tracr_core::probe::{CommandProbe, ProbeExecutor};
use tracr_core::signal::CancellationSignal;

use crate::commands::ProbeArgs;
use crate::terminal::progress;
use crate::terminal::{colors, print};

pub async fn trace(destination: String, args: &ProbeArgs, quiet: u8) -> anyhow::Result<()> {
    let mut config: CampaignConfig = CampaignConfig::default();
    args.apply(&mut config);
    config.validate()?;

    let probe: CommandProbe = CommandProbe::system(&config);
    let signal: CancellationSignal = CancellationSignal::new();
    let mut destination: Destination = Destination::new(destination);

    let canceler = {
        let signal: CancellationSignal = signal.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal.cancel();
            }
        })
    };

    let span: Span = if quiet == 0 {
        info_span!("trace", indicatif.pb_show = true)
    } else {
        Span::none()
    };
    span.pb_set_style(&progress::spinner_style()?);
    span.pb_set_message(&format!("Tracing {}...", destination.host().bold()));

    let start_time: Instant = Instant::now();
    let result: Result<HopList, ProbeError> = probe
        .execute(&mut destination, &signal)
        .instrument(span.clone())
        .await;
    canceler.abort();
    drop(span);

    let hops: HopList = match result {
        Ok(hops) => hops,
        Err(ProbeError::Canceled) => {
            warn!("Trace to {destination} canceled");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    print::header(&format!("route to {}", destination.host()), quiet);
    print_hops(&hops, &destination);

    let reached: bool = hops
        .last()
        .is_some_and(|hop| hop.address.is_some() && hop.address == destination.address());
    let verdict: ColoredString = if reached {
        "reached".bold().green()
    } else {
        "not reached".bold().red()
    };
    let total_time: ColoredString = format!("{:.2}s", start_time.elapsed().as_secs_f64()).bold().yellow();
    let output: String = format!("{} hops, destination {verdict} in {total_time}", hops.len());

    match quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => print::print(&output),
    }
    Ok(())
}

fn print_hops(hops: &[Hop], destination: &Destination) {
    for hop in hops {
        let ttl: ColoredString = format!("{:>2}", hop.ttl).color(colors::ACCENT);
        let address: ColoredString = match hop.address {
            Some(address) if Some(address) == destination.address() => {
                address.to_string().color(colors::SUCCESS).bold()
            }
            Some(IpAddr::V4(address)) => address.to_string().color(colors::IPV4_ADDR),
            Some(IpAddr::V6(address)) => address.to_string().color(colors::IPV6_ADDR),
            None => "*".color(colors::SILENT_HOP),
        };
        print::print_status(format!("{ttl}  {address}"));
    }
}
