use anyhow::{Context, bail};
use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use idokep_core::{
    Config, ForecastEntry, ResultBundle, Snapshot, UpdateCoordinator, WeatherProvider,
    provider_from_config, sensor::SENSORS,
};
use inquire::Text;
use tracing::{error, info};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "idokep",
    version,
    about = "Current weather and forecasts from idokep.hu"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the default location.
    Configure {
        /// Location as it appears in idokep.hu URLs, e.g. "Budapest".
        /// Prompts when omitted.
        location: Option<String>,
    },

    /// Fetch once and print the result.
    Show {
        /// Overrides the configured location.
        location: Option<String>,

        /// Print the whole bundle as JSON.
        #[arg(long)]
        json: bool,

        /// Include the hourly forecast.
        #[arg(long)]
        hourly: bool,

        /// Include the daily forecast.
        #[arg(long)]
        daily: bool,
    },

    /// Keep polling at the configured interval until Ctrl-C.
    Watch {
        /// Overrides the configured location.
        location: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { location } => configure(location),
            Command::Show {
                location,
                json,
                hourly,
                daily,
            } => show(location, json, hourly, daily).await,
            Command::Watch { location } => watch(location).await,
        }
    }
}

fn configure(location: Option<String>) -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let location = match location {
        Some(location) => location,
        None => Text::new("Location:")
            .with_default(cfg.location())
            .with_help_message("Name as used in idokep.hu URLs, e.g. Szeged or Székesfehérvár")
            .prompt()
            .context("Failed to read location")?,
    };

    let location = location.trim();
    if location.is_empty() {
        bail!("Location must not be empty");
    }

    cfg.set_location(location);
    cfg.save()?;

    println!(
        "Default location set to '{location}' in {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn show(
    location: Option<String>,
    json: bool,
    hourly: bool,
    daily: bool,
) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let provider = provider_from_config(&cfg)?;

    let target = location.as_deref().unwrap_or(cfg.location());
    let bundle = provider
        .fetch(Some(target))
        .await
        .with_context(|| format!("Failed to fetch weather for '{target}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
        return Ok(());
    }

    print_current(&bundle);
    if hourly {
        println!();
        println!("Hourly:");
        bundle
            .hourly
            .iter()
            .for_each(|entry| print_entry(entry, "%a %H:%M"));
    }
    if daily {
        println!();
        println!("Daily:");
        bundle
            .daily
            .iter()
            .for_each(|entry| print_entry(entry, "%a %m-%d"));
    }

    Ok(())
}

async fn watch(location: Option<String>) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let provider = provider_from_config(&cfg)?;
    let coordinator = UpdateCoordinator::new(provider, location, cfg.poll_interval());

    coordinator
        .first_refresh()
        .await
        .context("Initial update failed")?;
    print_snapshot(&coordinator.snapshot());

    let mut updates = coordinator.subscribe();
    updates.borrow_and_update();

    let printer = async {
        while updates.changed().await.is_ok() {
            print_snapshot(&updates.borrow_and_update());
        }
    };

    info!(
        interval_secs = coordinator.interval().as_secs(),
        "Watching, press Ctrl-C to stop"
    );
    tokio::select! {
        _ = coordinator.run(shutdown_signal()) => {}
        _ = printer => {}
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for Ctrl-C");
    }
}

fn print_current(bundle: &ResultBundle) {
    let current = &bundle.current;
    println!(
        "{}: {}, {}{} (sunrise {}, sunset {})",
        bundle.location,
        current.condition,
        current.temperature,
        current.temperature_unit.symbol(),
        current.sunrise.format("%H:%M"),
        current.sunset.format("%H:%M"),
    );
}

fn print_entry(entry: &ForecastEntry, time_format: &str) {
    let mut line = format!(
        "  {}  {:<16} {:>5.1}°C",
        entry.datetime.format(time_format),
        entry.condition.as_str(),
        entry.temperature
    );

    if let Some(low) = entry.templow {
        line.push_str(&format!(" / {low:>5.1}°C"));
    }
    line.push_str(&format!("  {:>4.1} mm", entry.precipitation));
    if let Some(probability) = entry.precipitation_probability {
        line.push_str(&format!(" ({probability:>3}%)"));
    }
    match (entry.wind_speed, entry.wind_bearing) {
        (Some(speed), Some(bearing)) => {
            line.push_str(&format!("  wind {speed} km/h from {bearing}°"))
        }
        (None, Some(bearing)) => line.push_str(&format!("  wind ? km/h from {bearing}°")),
        _ => {}
    }

    println!("{line}");
}

fn print_snapshot(snapshot: &Snapshot) {
    let stamp = snapshot
        .last_success_at
        .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    let values = SENSORS
        .iter()
        .map(|sensor| match sensor.native_value(snapshot) {
            Some(value) => format!(
                "{}: {value}{}",
                sensor.name,
                sensor.unit.unwrap_or_default()
            ),
            None => format!("{}: unavailable", sensor.name),
        })
        .collect::<Vec<_>>()
        .join(", ");

    match &snapshot.last_error {
        Some(err) if !snapshot.last_update_success => {
            println!("[last success {stamp}] {values} (update failed: {err})")
        }
        _ => println!("[{stamp}] {values}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_counts_repetitions() {
        let cli = Cli::try_parse_from(["idokep", "-vv", "show", "Szeged", "--daily"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Show {
                location: Some(ref l),
                json: false,
                hourly: false,
                daily: true,
            } if l == "Szeged"
        ));
    }

    #[test]
    fn configure_location_is_optional() {
        let cli = Cli::try_parse_from(["idokep", "configure"]).unwrap();
        assert!(matches!(cli.command, Command::Configure { location: None }));
    }

    #[test]
    fn watch_accepts_trailing_verbose() {
        let cli = Cli::try_parse_from(["idokep", "watch", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
        assert!(matches!(cli.command, Command::Watch { location: None }));
    }
}
