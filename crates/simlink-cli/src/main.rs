//! SimLink CLI: airport frequencies, weather and cloud density queries.
//!
//! Queries run against a recorded host session: `--replay` names a JSON
//! file holding the dispatch messages the host should hand out, in order.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use simlink_models::{CloudDensitySample, FrequencyRecord, Weather};
use simlink_sdk::{ClientConfig, CloudDensityMode, ScriptedConnection, ScriptedReply, SimService};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "simlink")]
#[command(author, version, about = "Facility and weather queries against a simulator host", long_about = None)]
struct Cli {
    /// JSON replay file with the host's dispatch messages
    #[arg(long, global = true)]
    replay: Option<PathBuf>,

    /// Deadline per query in milliseconds (overrides SIMLINK_TIMEOUT_MS)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Cloud density strategy: `scan` or `in-cloud` (overrides SIMLINK_CLOUD_MODE)
    #[arg(long, global = true)]
    cloud_mode: Option<CloudDensityMode>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Radio frequencies of one airport
    Freq {
        /// ICAO code (e.g. KJFK)
        code: String,
    },
    /// Current weather at one or more stations
    Weather {
        /// Comma-separated ICAO codes (e.g. EDDB,LFPG)
        #[arg(value_delimiter = ',', required = true)]
        codes: Vec<String>,
    },
    /// Cloud density above one or more airports
    Clouds {
        /// Comma-separated ICAO codes
        #[arg(value_delimiter = ',', required = true)]
        codes: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialise structured logging (controlled via RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(ms) = cli.timeout_ms {
        config.timeout = Duration::from_millis(ms);
    }
    if let Some(mode) = cli.cloud_mode {
        config.cloud_mode = mode;
    }

    let replay = cli
        .replay
        .as_deref()
        .context("no simulator host binding in this build; pass --replay <file.json>")?;
    let connection = load_replay(replay)?;
    let mut service = SimService::new(connection, config);

    match cli.command {
        Command::Freq { code } => {
            let records = service
                .get_frequency(&code)
                .with_context(|| format!("frequency query for {code} failed"))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_frequencies(&records);
            }
        }
        Command::Weather { codes } => {
            let weather = service.get_weather(&codes).context("weather query failed")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&weather)?);
            } else {
                weather.values().for_each(print_weather);
            }
        }
        Command::Clouds { codes } => {
            let density = service
                .get_cloud_density(&codes)
                .context("cloud density query failed")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&density)?);
            } else {
                for (code, samples) in &density {
                    println!("{code}");
                    print_density(samples);
                }
            }
        }
    }

    Ok(())
}

fn load_replay(path: &std::path::Path) -> anyhow::Result<ScriptedConnection> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading replay file {}", path.display()))?;
    let steps: Vec<ScriptedReply> = serde_json::from_str(&text)
        .with_context(|| format!("parsing replay file {}", path.display()))?;
    info!(path = %path.display(), steps = steps.len(), "replay loaded");
    Ok(ScriptedConnection::from_replay(&steps))
}

fn print_frequencies(records: &[FrequencyRecord]) {
    if records.is_empty() {
        println!("no frequencies");
        return;
    }
    for rec in records {
        println!("{:<10} {:>8.3} MHz  {}", rec.kind, rec.mhz, rec.name);
    }
}

fn print_weather(wx: &Weather) {
    let layers: Vec<String> = wx
        .clouds
        .iter()
        .map(|layer| format!("{} {}ft", layer.coverage, layer.base))
        .collect();
    let clouds = if layers.is_empty() {
        "no layers".to_string()
    } else {
        layers.join(", ")
    };
    println!("{}  vis {} SM  {}", wx.waypoint, wx.visibility, clouds);
}

fn print_density(samples: &[CloudDensitySample]) {
    for s in samples {
        println!(
            "  {:>5}-{:<5} ft  {:>3}  {:>5.1}%  {}",
            s.min_alt, s.max_alt, s.value, s.percentage, s.coverage
        );
    }
}
