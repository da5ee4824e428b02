use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use owl_core::{DEFAULT_LISTEN_ADDR, DecodeError, MULTICAST_ADDRESS, UdpSource, monitor_source};

mod console;
mod observability;
mod telemetry;

use console::{ConsoleSink, LineFormat, format_summary};
use telemetry::PrometheusSink;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("OWL_BUILD_COMMIT"),
    " ",
    env!("OWL_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "owl")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decode readings from the OWL Intuition electricity monitor.",
    long_about = None,
    after_help = "Examples:\n  owl listen --addr :41234\n  owl listen --multicast --metrics-addr :9100\n  owl decode packet.xml --stdout --pretty"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode one captured packet file and write the reading as JSON.
    #[command(
        after_help = "Examples:\n  owl decode packet.xml --stdout\n  owl decode 'captures/*.xml' -o reading.json --pretty"
    )]
    Decode {
        /// Path to a file holding exactly one packet
        input: PathBuf,

        /// Output path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Write JSON to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// Receive packets from the gateway and print one line per reading.
    #[command(
        after_help = "Examples:\n  owl listen\n  owl listen --addr :41234 --json\n  owl listen --multicast --count 10"
    )]
    Listen {
        /// Address to bind for unicast packets (":port" binds all interfaces)
        #[arg(long, env = "OWL_LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
        addr: String,

        /// Join a multicast group instead of binding --addr
        #[arg(
            long,
            env = "OWL_MULTICAST",
            value_name = "GROUP:PORT",
            num_args = 0..=1,
            default_missing_value = MULTICAST_ADDRESS
        )]
        multicast: Option<String>,

        /// Print readings as JSON lines
        #[arg(long)]
        json: bool,

        /// Stop after this many datagrams
        #[arg(long)]
        count: Option<u64>,

        /// Serve Prometheus metrics on this address
        #[arg(long, env = "OWL_METRICS_ADDR")]
        metrics_addr: Option<String>,

        /// Do not print the packet summary on exit
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    observability::init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Decode {
            input,
            output,
            stdout,
            pretty,
            compact,
            quiet,
        } => cmd_decode(input, output, stdout, pretty, compact, quiet),
        Commands::Listen {
            addr,
            multicast,
            json,
            count,
            metrics_addr,
            quiet,
        } => cmd_listen(addr, multicast, json, count, metrics_addr, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

impl From<DecodeError> for CliError {
    fn from(err: DecodeError) -> Self {
        let hint = match err {
            DecodeError::MalformedPacket => "input must hold a single <electricity> XML packet",
            DecodeError::WeatherPacket => "only electricity packets carry readings",
            DecodeError::InvalidBatteryFormat { .. } => "battery level must look like '100%'",
            DecodeError::UnexpectedChannelCount { .. } => {
                "electricity packets carry exactly three <chan> elements"
            }
        };
        CliError::new(err.to_string(), Some(hint.to_string()))
    }
}

fn cmd_decode(
    input: PathBuf,
    output: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let packet = PacketFile::load(&input)?;
    let output = match (stdout, output) {
        (true, _) => None,
        (false, Some(output)) => Some(packet.checked_output(output)?),
        (false, None) => {
            return Err(CliError::new(
                "missing output path",
                Some("use -o/--output or --stdout".to_string()),
            ));
        }
    };

    let reading = owl_core::decode(&packet.bytes)?;
    let json = serialize_reading(&reading, pretty, compact)?;

    let Some(output) = output else {
        println!("{}", json);
        return Ok(());
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&output, json)
        .with_context(|| format!("Failed to write reading: {}", output.display()))?;

    if !quiet {
        eprintln!("OK: reading written -> {}", output.display());
    }
    Ok(())
}

fn cmd_listen(
    addr: String,
    multicast: Option<String>,
    json: bool,
    count: Option<u64>,
    metrics_addr: Option<String>,
    quiet: bool,
) -> Result<(), CliError> {
    let mut source = match multicast.as_deref() {
        Some(group) => UdpSource::join_multicast(group)
            .with_context(|| format!("Failed to join multicast group {group}"))?,
        None => {
            UdpSource::bind(&addr).with_context(|| format!("Failed to listen on {addr}"))?
        }
    };
    let local_addr = source.local_addr().context("Failed to read local address")?;
    tracing::info!(local_addr = %local_addr, "listening for packets");

    let metrics = metrics_addr
        .as_deref()
        .map(PrometheusSink::install)
        .transpose()?;
    let format = if json {
        LineFormat::Json
    } else {
        LineFormat::Text
    };
    let mut sinks = (ConsoleSink::new(io::stdout().lock(), format), metrics);

    let summary =
        monitor_source(&mut source, &mut sinks, count).context("Receiving packets failed")?;
    if !quiet {
        eprintln!("{}", format_summary(&summary));
    }
    Ok(())
}

fn serialize_reading(
    reading: &owl_core::ElectricityReading,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(reading)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(reading)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

/// Largest file accepted as one captured datagram.
const MAX_PACKET_FILE_BYTES: u64 = 64 * 1024;
const PACKET_FILE_HINT: &str = "pass a file holding one captured datagram";

/// One captured datagram read from disk.
struct PacketFile {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl PacketFile {
    /// Load the packet at `input`, which may be a glob matching one file.
    fn load(input: &Path) -> Result<Self, CliError> {
        let path = match input.to_str().filter(|raw| raw.contains(['*', '?', '['])) {
            Some(pattern) => single_match(pattern)?,
            None => input.to_path_buf(),
        };

        let metadata = fs::metadata(&path).map_err(|_| {
            CliError::new(
                format!("packet file not found: {}", path.display()),
                Some(PACKET_FILE_HINT.to_string()),
            )
        })?;
        if !metadata.is_file() {
            return Err(CliError::new(
                format!("packet path is not a file: {}", path.display()),
                Some(PACKET_FILE_HINT.to_string()),
            ));
        }
        if metadata.len() > MAX_PACKET_FILE_BYTES {
            return Err(CliError::new(
                format!(
                    "packet file is too large ({} bytes): {}",
                    metadata.len(),
                    path.display()
                ),
                Some("capture a single datagram per file".to_string()),
            ));
        }

        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read packet file: {}", path.display()))?;
        Ok(Self { path, bytes })
    }

    /// Refuse an output path that would overwrite the packet itself.
    fn checked_output(&self, output: PathBuf) -> Result<PathBuf, CliError> {
        let same_file = match (fs::canonicalize(&self.path), fs::canonicalize(&output)) {
            (Ok(packet), Ok(existing)) => packet == existing,
            _ => false,
        };
        if same_file {
            return Err(CliError::new(
                format!("output would overwrite the packet file: {}", output.display()),
                Some("choose a different output path".to_string()),
            ));
        }
        Ok(output)
    }
}

fn single_match(pattern: &str) -> Result<PathBuf, CliError> {
    let invalid = |detail: String| {
        CliError::new(
            format!("invalid input pattern '{pattern}'"),
            Some(format!("pattern error: {detail}")),
        )
    };

    let mut matches = Vec::new();
    for entry in glob(pattern).map_err(|err| invalid(err.msg.to_string()))? {
        let path = entry.map_err(|err| invalid(err.to_string()))?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no packet files match pattern '{pattern}'"),
            Some("check the path or quote the pattern".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let first = matches[0].display();
            Err(CliError::new(
                format!("multiple files match pattern '{pattern}' ({count} matches, first {first})"),
                Some("decode decodes one packet; run it once per file".to_string()),
            ))
        }
    }
}
