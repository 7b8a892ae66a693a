use crcuart_common::{BAUD_RATE, IDLE_TIMEOUT_MS, MAX_DATA_LEN};
use eyre::{Context, Result};
use std::path::PathBuf;

#[derive(clap::Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase message verbosity
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Send a payload to the device and check the CRC it reports
    Send(SendArgs),
    /// Print everything the device sends
    Monitor(DeviceArgs),
    /// Run the calculator locally on stdin/stdout
    Sim(SimArgs),
    /// Print the CRC of a payload in the device's report format
    Crc(PayloadArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct DeviceArgs {
    /// TTY the device is attached to; will try to autodetect if not specified
    #[arg(short, long)]
    pub device: Option<PathBuf>,

    /// Baud rate of the link
    #[arg(short, long, default_value_t = BAUD_RATE)]
    pub baud: u32,
}

#[derive(clap::Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct PayloadArgs {
    /// File whose contents are the payload
    pub file: Option<PathBuf>,

    /// Literal text payload
    #[arg(short, long)]
    pub text: Option<String>,
}

impl PayloadArgs {
    pub fn load(&self) -> Result<Vec<u8>> {
        match (&self.file, &self.text) {
            (Some(path), _) => std::fs::read(path)
                .wrap_err_with(|| format!("failed to read {}", path.display())),
            (None, Some(text)) => Ok(text.as_bytes().to_vec()),
            (None, None) => eyre::bail!("no payload given"),
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct SendArgs {
    #[command(flatten)]
    pub device: DeviceArgs,

    #[command(flatten)]
    pub payload: PayloadArgs,

    /// How long to wait for the ready prompt, and then for the report, in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub timeout_ms: u64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SimArgs {
    /// Milliseconds of silence that end a frame
    #[arg(long, default_value_t = IDLE_TIMEOUT_MS, value_parser = clap::value_parser!(u32).range(1..))]
    pub idle_ms: u32,

    /// Largest frame, in bytes
    #[arg(long, default_value_t = MAX_DATA_LEN, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub capacity: usize,

    /// Stop after this many cycles instead of running forever
    #[arg(long)]
    pub cycles: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn send_defaults() {
        let cli = Cli::try_parse_from(["crcdude", "send", "--text", "123456789"]).unwrap();
        let Command::Send(send) = cli.command else {
            panic!("expected send, got {:?}", cli.command);
        };
        assert_eq!(send.device.baud, 937_500);
        assert!(send.device.device.is_none());
        assert_eq!(send.payload.load().unwrap(), b"123456789");
        assert_eq!(send.timeout_ms, 3000);
    }

    #[test]
    fn payload_is_required_and_exclusive() {
        assert!(Cli::try_parse_from(["crcdude", "crc"]).is_err());
        assert!(Cli::try_parse_from(["crcdude", "crc", "a.bin", "--text", "x"]).is_err());
        assert!(Cli::try_parse_from(["crcdude", "crc", "a.bin"]).is_ok());
    }

    #[test]
    fn sim_options() {
        let cli = Cli::try_parse_from([
            "crcdude", "-vv", "sim", "--idle-ms", "20", "--capacity", "64", "--cycles", "3",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Sim(sim) = cli.command else {
            panic!("expected sim, got {:?}", cli.command);
        };
        assert_eq!(sim.idle_ms, 20);
        assert_eq!(sim.capacity, 64);
        assert_eq!(sim.cycles, Some(3));
    }

    #[test]
    fn sim_rejects_zero_sizes() {
        assert!(Cli::try_parse_from(["crcdude", "sim", "--capacity", "0"]).is_err());
        assert!(Cli::try_parse_from(["crcdude", "sim", "--idle-ms", "0"]).is_err());
        assert!(Cli::try_parse_from(["crcdude", "sim", "--capacity", "0", "--idle-ms", "0"]).is_err());

        let cli = Cli::try_parse_from(["crcdude", "sim", "--capacity", "1", "--idle-ms", "1"]).unwrap();
        let Command::Sim(sim) = cli.command else {
            panic!("expected sim, got {:?}", cli.command);
        };
        assert_eq!(sim.capacity, 1);
        assert_eq!(sim.idle_ms, 1);
    }

    #[test]
    fn monitor_device_and_baud() {
        let cli =
            Cli::try_parse_from(["crcdude", "monitor", "-d", "/dev/ttyUSB0", "-b", "115200"])
                .unwrap();
        let Command::Monitor(dev) = cli.command else {
            panic!("expected monitor, got {:?}", cli.command);
        };
        assert_eq!(dev.device, Some(PathBuf::from("/dev/ttyUSB0")));
        assert_eq!(dev.baud, 115200);
    }
}
