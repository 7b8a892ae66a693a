mod args;
mod find_tty;
mod lines;
mod monitor;
mod send;
mod sim;
mod tty;

use crate::args::{Cli, Command, DeviceArgs};
use crate::tty::Tty;
use clap::Parser;
use crcuart_common::{crc32, Report, MAX_DATA_LEN};
use tracing_subscriber::filter::EnvFilter;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let default_filter = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "crcdude=info,crcuart_common=info",
            1 => "crcdude=debug,crcuart_common=debug",
            _ => "trace",
        }
    };
    tracing_subscriber::fmt()
        .without_time()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match &cli.command {
        Command::Send(args) => send::send(args, open_device(&args.device)?),
        Command::Monitor(args) => monitor::monitor(open_device(args)?),
        Command::Sim(args) => sim::sim(args),
        Command::Crc(args) => {
            let payload = args.load()?;
            let reports = device_reports(&payload);
            if reports.len() > 1 {
                tracing::warn!(
                    "{} bytes is more than one frame; the device would report {} CRCs",
                    payload.len(),
                    reports.len()
                );
            }
            tracing::debug!("{} bytes", payload.len());
            for report in reports {
                print!("{report}");
            }
            Ok(())
        }
    }
}

/// The reports a freshly started device would send for `payload` arriving in one burst: one per
/// `MAX_DATA_LEN` frame, or a no-data report if there is nothing to send.
fn device_reports(payload: &[u8]) -> Vec<Report> {
    if payload.is_empty() {
        return vec![Report::NoData(0)];
    }
    payload
        .chunks(MAX_DATA_LEN)
        .map(|frame| Report::Updated(crc32::compute(frame)))
        .collect()
}

fn open_device(args: &DeviceArgs) -> eyre::Result<Tty> {
    let device = match &args.device {
        Some(device) => device.clone(),
        None => {
            tracing::warn!("no device specified, searching for suitable TTY");
            let Some(device) = find_tty::find_most_recent_tty() else {
                eyre::bail!(
                    "failed to find suitable TTY device; expected device in /dev like one of: {}",
                    find_tty::pattern_list()
                );
            };
            tracing::info!("using device {}", device.display());
            device
        }
    };
    let mut tty = Tty::new(&device, args.baud)?;
    tty.clear()?;
    Ok(tty)
}
