//! ReplyPrefs command line
//!
//! Inspect and change the auto-reply preferences stored in the data directory.

use replyprefs::storage::PreferencesStore;
use replyprefs::types::app::find_supported;
use replyprefs::{App, AppContext, PreferencesConfig};
use std::process::ExitCode;

const USAGE: &str = "usage: replyprefs <command>

commands:
  show                  print all preferences as JSON
  service on|off        turn auto-reply on or off
  group-reply on|off    reply in group conversations
  delay <ms>            minimum time between replies
  enable <package>      enable auto-reply for an app
  disable <package>     disable auto-reply for an app";

/// A parsed command line
#[derive(Debug, PartialEq)]
enum Command {
    Show,
    Service(bool),
    GroupReply(bool),
    Delay(i64),
    Enable(String),
    Disable(String),
}

impl Command {
    fn parse(args: &[String]) -> Result<Self, String> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match args.as_slice() {
            [] | ["show"] => Ok(Command::Show),
            ["service", value] => Ok(Command::Service(parse_switch(value)?)),
            ["group-reply", value] => Ok(Command::GroupReply(parse_switch(value)?)),
            ["delay", value] => {
                let delay: i64 = value
                    .parse()
                    .map_err(|_| format!("Invalid delay '{}'", value))?;
                if delay < 0 {
                    return Err("Delay must not be negative".to_string());
                }
                Ok(Command::Delay(delay))
            }
            ["enable", package] => Ok(Command::Enable(package.to_string())),
            ["disable", package] => Ok(Command::Disable(package.to_string())),
            _ => Err(USAGE.to_string()),
        }
    }
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(format!("Expected on or off, got '{}'", other)),
    }
}

fn app_for(package: &str) -> App {
    find_supported(package).unwrap_or_else(|| App::new(package, package))
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let context = AppContext::new(PreferencesConfig::from_env())?;
    tracing::debug!("Using preferences at {}", context.preferences_path().display());
    let store = PreferencesStore::instance(&context)?;

    match command {
        Command::Show => {}
        Command::Service(enabled) => store.set_service_pref(enabled),
        Command::GroupReply(enabled) => store.set_group_reply_pref(enabled),
        Command::Delay(delay) => store.set_auto_reply_delay(delay),
        Command::Enable(package) => {
            store.save_enabled_apps(&app_for(&package), true)?;
        }
        Command::Disable(package) => {
            store.save_enabled_apps(&app_for(&package), false)?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&store.snapshot()?)?);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        }
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
