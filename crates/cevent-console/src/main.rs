//! CEvent Console
//!
//! Interactive host for the CEvent scheduler. Reads lines from stdin and
//! treats them either as host signals or as admin commands.
//!
//! # Usage
//!
//! ```bash
//! # Server console sender (cannot queue)
//! cevent-console --config cevents.toml
//!
//! # Act as a player holding every permission
//! cevent-console --player kitt
//!
//! # Act as a player with selected permission nodes
//! cevent-console --player guest --grant kts.listcevents --grant kts.viewqueuedcevent
//! ```
//!
//! Host lines: `round restart`, `round start <ready>`, `status`, `quit`.

mod commands;
mod host;

use anyhow::Result;
use cevent_core::builtin::builtin_catalog;
use cevent_core::{CEventScheduler, Settings};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::commands::Sender;
use crate::host::{ConsoleHost, HostLine};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (TOML); created on exit when missing
    #[arg(long, default_value = "cevents.toml")]
    config: PathBuf,

    /// Issue commands as this player instead of the server console
    #[arg(long)]
    player: Option<String>,

    /// Permission node held by the player (repeatable, defaults to all)
    #[arg(long = "grant", requires = "player")]
    grants: Vec<String>,

    /// Do not write settings back on exit
    #[arg(long, default_value_t = false)]
    no_save: bool,
}

fn restart_round(scheduler: &mut CEventScheduler<ConsoleHost>) {
    scheduler.host_mut().round_ended();
    match scheduler.notify_round_restarted() {
        Some(id) => {
            let name = scheduler.current().map(|c| c.name().to_string()).unwrap_or_default();
            println!("Round {}: {} ({})", scheduler.host().rounds(), name, id);
        }
        None => println!("Round {}: normal round", scheduler.host().rounds()),
    }
}

fn print_status(scheduler: &CEventScheduler<ConsoleHost>) {
    let view = scheduler.view_queue();
    println!("Current: {}", view.current.as_deref().unwrap_or("none"));
    println!("Queued: {}", view.slots.len());
    for hook in scheduler.host().active() {
        println!("  hooked: {}", hook);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (file_settings, load_error) = Settings::load_or_default(&args.config);
    let mut settings = file_settings.clone();
    settings.apply_env();

    let default_level = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = &load_error {
        error!(
            path = %args.config.display(),
            "There was an error loading the config file, using defaults: {}",
            e
        );
    }

    let mut scheduler = CEventScheduler::new(ConsoleHost::new());
    if settings.is_enabled {
        scheduler.register_catalog(builtin_catalog());
    } else {
        warn!("CEvents are disabled in settings, no catalogs loaded");
    }
    for report in scheduler.configure(settings) {
        if !report.all_registered() {
            warn!(catalog = %report.catalog, errors = ?report.errors, "Catalog loaded with errors");
        }
    }

    let sender = match args.player {
        Some(name) if args.grants.is_empty() => Sender::player(name, [Sender::ALL]),
        Some(name) => Sender::player(name, args.grants),
        None => Sender::console(),
    };
    info!(sender = %sender.name, player = sender.is_player, "CEvent console ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match HostLine::parse(line) {
            Ok(Some(HostLine::Quit)) => break,
            Ok(Some(HostLine::RoundRestart)) => restart_round(&mut scheduler),
            Ok(Some(HostLine::RoundStart { ready })) => {
                if scheduler.notify_round_started(ready) {
                    println!("Current event aborted: not enough players");
                } else {
                    println!("Round started with {} ready players", ready);
                }
            }
            Ok(Some(HostLine::Status)) => print_status(&scheduler),
            Ok(None) => {
                let response = commands::run_line(&mut scheduler, &sender, line);
                if response.success {
                    println!("{}", response);
                } else {
                    eprintln!("{}", response);
                }
            }
            Err(usage) => println!("{}", usage),
        }

        if scheduler.host_mut().take_restart_request() {
            restart_round(&mut scheduler);
        }
    }

    let host = scheduler.shutdown();
    info!(rounds = host.rounds(), "CEvent console stopped");

    if args.no_save || load_error.is_some() {
        return Ok(());
    }
    if let Err(e) = file_settings.save(&args.config) {
        error!(path = %args.config.display(), "Failed to save settings: {}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_round_advances_queue() {
        let mut scheduler = CEventScheduler::with_settings(ConsoleHost::new(), Settings::default());
        scheduler.register_catalog(builtin_catalog());
        commands::run_line(&mut scheduler, &Sender::player("p", [Sender::ALL]), "qec 1");

        restart_round(&mut scheduler);
        assert_eq!(scheduler.current().map(|c| c.id()), Some(1));
        assert_eq!(scheduler.host().rounds(), 1);
        assert_eq!(scheduler.host().active().count(), 2);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["cevent-console", "--player", "kitt", "--grant", "kts.listcevents"]);
        assert_eq!(args.player.as_deref(), Some("kitt"));
        assert_eq!(args.grants, vec!["kts.listcevents"]);
        assert_eq!(args.config, PathBuf::from("cevents.toml"));
        assert!(!args.no_save);
    }
}
