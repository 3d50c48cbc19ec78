use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use fleet_replay::input::csv::parse_time;
use fleet_replay::{
    FeedMode, FileHistory, LoadOutcome, LogSink, Period, ReplayController, ReplaySettings, ReplayState,
    TimeRange,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Replay a device's recorded positions
#[derive(Parser, Debug)]
#[command(name = "fleet-replay", version, about)]
struct Args {
    /// Position export (CSV or JSON)
    file: PathBuf,

    /// Device to replay
    #[arg(long)]
    device: i64,

    /// Range start (RFC 3339), requires --to
    #[arg(long, value_parser = parse_timestamp, requires = "to", conflicts_with = "period")]
    from: Option<DateTime<Utc>>,

    /// Range end (RFC 3339), requires --from
    #[arg(long, value_parser = parse_timestamp, requires = "from")]
    to: Option<DateTime<Utc>>,

    /// Report period preset (today, yesterday, this-week, previous-week, this-month, previous-month)
    #[arg(long)]
    period: Option<Period>,

    /// Milliseconds between two positions while playing
    #[arg(long)]
    interval_ms: Option<u64>,

    /// What to feed the renderer: route or marker
    #[arg(long)]
    feed: Option<FeedMode>,

    /// Maximum positions to load
    #[arg(long)]
    limit: Option<usize>,

    /// Play to the end and exit instead of reading commands from stdin
    #[arg(long)]
    auto: bool,

    /// Persist the effective playback settings
    #[arg(long)]
    save_settings: bool,
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    parse_time(s).map_err(|e| e.to_string())
}

/// Interactive replay commands
#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Play,
    Pause,
    Next,
    Prev,
    Seek(i64),
    Reset,
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let command = match parts.next().unwrap_or_default() {
            "play" | "p" => Command::Play,
            "pause" | "space" => Command::Pause,
            "next" | "n" => Command::Next,
            "prev" | "b" => Command::Prev,
            "seek" | "s" => {
                let index = parts
                    .next()
                    .ok_or("seek needs an index")?
                    .parse()
                    .map_err(|e| format!("bad index: {}", e))?;
                Command::Seek(index)
            }
            "reset" | "r" => Command::Reset,
            "status" | "" => Command::Status,
            "quit" | "q" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}'", other)),
        };
        Ok(command)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut settings = ReplaySettings::load();
    if let Some(interval) = args.interval_ms {
        settings.tick_interval_ms = interval;
    }
    if let Some(feed) = args.feed {
        settings.feed = feed;
    }
    if let Some(limit) = args.limit {
        settings.history_limit = limit;
    }
    if args.save_settings {
        settings.save()?;
        info!("Saved settings to {:?}", ReplaySettings::config_path());
    }

    let history = FileHistory::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    info!("{} contains devices {:?}", args.file.display(), history.devices());

    let controller = ReplayController::new(Arc::new(history), Box::new(LogSink::new()), settings.replay_config())?;

    let outcome = match (args.from, args.to, args.period) {
        (Some(from), Some(to), _) => controller.load(args.device, TimeRange::new(from, to)?).await?,
        (_, _, Some(period)) => {
            info!("Loading period {}", period.label());
            controller.load_period(args.device, period).await?
        }
        // Whole file
        _ => {
            controller
                .load(args.device, TimeRange::new(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)?)
                .await?
        }
    };

    if let LoadOutcome::Applied { len: 0 } = outcome {
        warn!("No positions for device {} in the requested range", args.device);
    }

    if args.auto {
        run_to_end(&controller).await;
    } else {
        run_interactive(&controller).await?;
    }

    controller.dispose();
    Ok(())
}

async fn run_to_end(controller: &ReplayController) {
    let mut updates = controller.subscribe();
    controller.play();

    while controller.state() == ReplayState::Playing {
        if updates.changed().await.is_err() {
            break;
        }
    }
}

async fn run_interactive(controller: &ReplayController) -> Result<()> {
    println!("Commands: play, pause, next, prev, seek <i>, reset, status, quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match line.trim().parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Play => controller.play(),
            Command::Pause => controller.pause(),
            Command::Next => controller.step_forward(),
            Command::Prev => controller.step_backward(),
            Command::Seek(index) => controller.seek(index),
            Command::Reset => controller.reset(),
            Command::Status => {
                let snapshot = controller.snapshot();
                let stats = snapshot.route_stats();
                println!(
                    "{:?} {}/{} ({:.0}%) travelled {}",
                    snapshot.state,
                    snapshot.cursor.map_or(0, |c| c + 1),
                    snapshot.len(),
                    snapshot.progress() * 100.0,
                    stats
                );
            }
            Command::Quit => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("play".parse::<Command>(), Ok(Command::Play));
        assert_eq!("s -3".parse::<Command>(), Ok(Command::Seek(-3)));
        assert_eq!("".parse::<Command>(), Ok(Command::Status));
        assert!("seek".parse::<Command>().is_err());
        assert!("rewind".parse::<Command>().is_err());
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from([
            "fleet-replay",
            "positions.csv",
            "--device",
            "7",
            "--period",
            "yesterday",
            "--feed",
            "marker",
        ])
        .unwrap();
        assert_eq!(args.device, 7);
        assert_eq!(args.period, Some(Period::Yesterday));
        assert_eq!(args.feed, Some(FeedMode::Marker));

        let conflicting = Args::try_parse_from([
            "fleet-replay",
            "positions.csv",
            "--device",
            "7",
            "--from",
            "2024-05-01T00:00:00Z",
            "--to",
            "2024-05-02T00:00:00Z",
            "--period",
            "today",
        ]);
        assert!(conflicting.is_err());
    }
}
