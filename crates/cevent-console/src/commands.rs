//! Admin commands: parsing, permission checks and response text
//!
//! Each input line is split with shell quoting rules and parsed by clap.
//! Commands never panic; every outcome is a [`Response`].

use cevent_core::{
    CEventScheduler, Permissions, QueueError, QueueTarget, RoundHost, RunIn, ScheduleError,
};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

const QUEUE_USAGE: &str = "queuecevent <eventId|null>";
const QUEUE_USAGE_TAIL: &str = "[runIn] [position]";
const RUN_IN_MESSAGE: &str = "runIn must be an integer >= 1.";
const POSITION_MESSAGE: &str = "position must be -1 or >= 1.";

/// A parsed admin command line
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_subcommand = true)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// List registered CEvents
    #[command(name = "listcevents", visible_alias = "lces")]
    ListCEvents,

    /// Queue a CEvent
    #[command(name = "queuecevent", visible_alias = "qec")]
    QueueCEvent {
        /// <eventId|null> [config...] [runIn] [position]
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Remove an entry from the CEvent queue
    #[command(name = "removequeuedcevent", visible_alias = "rqce")]
    RemoveQueuedCEvent {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// View the CEvent queue
    #[command(name = "viewceventqueue", visible_alias = "vceq")]
    ViewCEventQueue {
        /// Print the queue as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Clear the CEvent queue
    #[command(name = "clearceventqueue", visible_alias = "cceq")]
    ClearCEventQueue,

    /// Stop the current CEvent
    #[command(name = "stopcevent", visible_alias = "sce")]
    StopCEvent,
}

/// Who issued a command
#[derive(Debug, Clone)]
pub struct Sender {
    pub name: String,
    pub is_player: bool,
    permissions: BTreeSet<String>,
}

impl Sender {
    /// Wildcard permission node
    pub const ALL: &'static str = "*";

    /// The server console: every permission, but not a player.
    pub fn console() -> Self {
        Self {
            name: "Server".to_string(),
            is_player: false,
            permissions: BTreeSet::from([Self::ALL.to_string()]),
        }
    }

    pub fn player<I, S>(name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            is_player: true,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_permission(&self, node: &str) -> bool {
        self.permissions.contains(Self::ALL) || self.permissions.contains(node)
    }
}

/// Outcome of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub success: bool,
    pub message: String,
}

impl Response {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Split and parse one admin line.
pub fn parse_line(line: &str) -> Result<AdminCommand, String> {
    let tokens = shlex::split(line).ok_or_else(|| "Unbalanced quotes.".to_string())?;
    CommandLine::try_parse_from(tokens)
        .map(|parsed| parsed.command)
        .map_err(|e| e.to_string().trim_end().to_string())
}

/// Parse and run one admin line.
pub fn run_line<H: RoundHost>(
    scheduler: &mut CEventScheduler<H>,
    sender: &Sender,
    line: &str,
) -> Response {
    match parse_line(line) {
        Ok(command) => execute(scheduler, sender, command),
        Err(message) => Response::err(message),
    }
}

/// Run a parsed command on behalf of `sender`.
pub fn execute<H: RoundHost>(
    scheduler: &mut CEventScheduler<H>,
    sender: &Sender,
    command: AdminCommand,
) -> Response {
    let permissions = scheduler
        .settings()
        .map(|s| s.permissions.clone())
        .unwrap_or_default();
    debug!(sender = %sender.name, ?command, "Executing admin command");

    let node = required_permission(&permissions, &command);
    if matches!(command, AdminCommand::QueueCEvent { .. }) && !sender.is_player {
        return Response::err("You must be a player to run this command.");
    }
    if !sender.has_permission(node) {
        return Response::err("You do not have permission.");
    }

    match command {
        AdminCommand::ListCEvents => list(scheduler),
        AdminCommand::QueueCEvent { args } => queue(scheduler, &args),
        AdminCommand::RemoveQueuedCEvent { args } => remove(scheduler, &args),
        AdminCommand::ViewCEventQueue { json } => view(scheduler, json),
        AdminCommand::ClearCEventQueue => {
            let cleared = scheduler.clear_queue();
            Response::ok(format!("CEvent queue cleared ({} entries).", cleared))
        }
        AdminCommand::StopCEvent => match scheduler.stop_current() {
            Ok(name) => Response::ok(format!("Current event stopped: {}.", name)),
            Err(e) => Response::err(e.to_string()),
        },
    }
}

fn required_permission<'a>(permissions: &'a Permissions, command: &AdminCommand) -> &'a str {
    match command {
        AdminCommand::ListCEvents => &permissions.list_cevents,
        AdminCommand::QueueCEvent { .. } => &permissions.queue_cevent,
        AdminCommand::RemoveQueuedCEvent { .. } => &permissions.remove_queued_cevent,
        AdminCommand::ViewCEventQueue { .. } => &permissions.view_cevent_queue,
        AdminCommand::ClearCEventQueue => &permissions.clear_cevent_queue,
        AdminCommand::StopCEvent => &permissions.stop_current_cevent,
    }
}

fn list<H: RoundHost>(scheduler: &CEventScheduler<H>) -> Response {
    let events = scheduler.list_registered();
    if events.is_empty() {
        return Response::ok("No registered events.");
    }

    let mut lines = vec!["Registered Events:".to_string()];
    for event in events {
        lines.push(format!("{}: {}", event.id, event.name));
        if !event.description.is_empty() {
            lines.push(format!("  {}", event.description));
        }
    }
    Response::ok(lines.join("\n"))
}

fn usage_line(config_usage: &str) -> String {
    if config_usage.is_empty() {
        format!("Usage: {} {}", QUEUE_USAGE, QUEUE_USAGE_TAIL)
    } else {
        format!("Usage: {} {} {}", QUEUE_USAGE, config_usage, QUEUE_USAGE_TAIL)
    }
}

fn queue<H: RoundHost>(scheduler: &mut CEventScheduler<H>, args: &[String]) -> Response {
    let Some((first, rest)) = args.split_first() else {
        return Response::err(usage_line("[config...]"));
    };

    let target = match QueueTarget::parse(first) {
        Ok(target) => target,
        Err(e) => return Response::err(e.to_string()),
    };

    let id = match target {
        QueueTarget::NormalRound => {
            if !rest.is_empty() {
                return Response::err(ScheduleError::NormalRoundTakesNoArguments.to_string());
            }
            return match scheduler.queue(target, &[], 1, -1) {
                Ok(_) => Response::ok("Queued normal round."),
                Err(e) => Response::err(e.to_string()),
            };
        }
        QueueTarget::Event(id) => id,
    };

    let Some(registered) = scheduler.registry().find(id) else {
        return Response::err(ScheduleError::UnknownEvent { id }.to_string());
    };
    let expected = registered.expected_args();
    let config_usage = registered.usage();
    if rest.len() < expected {
        return Response::err(usage_line(&config_usage));
    }

    let (config_tokens, trailing) = rest.split_at(expected);
    let run_in = match trailing.first() {
        None => 1,
        Some(raw) => match raw.parse::<i64>() {
            Ok(run_in) if run_in < 1 => return Response::err(RUN_IN_MESSAGE),
            Ok(run_in) if RunIn::from_raw(run_in).is_err() => {
                return Response::err(run_in_limit_message())
            }
            Ok(run_in) => run_in,
            Err(_) => return Response::err(RUN_IN_MESSAGE),
        },
    };
    let position = match trailing.get(1) {
        None => -1,
        Some(raw) => match raw.parse::<i64>() {
            Ok(position) => position,
            Err(_) => return Response::err(POSITION_MESSAGE),
        },
    };
    if trailing.len() > 2 {
        return Response::err(ScheduleError::TooManyArguments.to_string());
    }

    match scheduler.queue(target, config_tokens, run_in, position) {
        Ok(queued) => Response::ok(format!(
            "Queued event {} at position {}.",
            queued.name, queued.position
        )),
        Err(e) => Response::err(schedule_error_message(&e)),
    }
}

fn run_in_limit_message() -> String {
    format!("runIn must be at most {}.", RunIn::MAX)
}

fn schedule_error_message(err: &ScheduleError) -> String {
    match err {
        ScheduleError::Queue(QueueError::InvalidRunIn { run_in }) if *run_in >= 1 => {
            run_in_limit_message()
        }
        ScheduleError::Queue(QueueError::InvalidRunIn { .. }) => RUN_IN_MESSAGE.to_string(),
        ScheduleError::Queue(QueueError::InvalidPosition { .. }) => POSITION_MESSAGE.to_string(),
        other => match other.usage() {
            Some(usage) => format!("{}\n{}", usage_line(usage), other),
            None => other.to_string(),
        },
    }
}

fn remove<H: RoundHost>(scheduler: &mut CEventScheduler<H>, args: &[String]) -> Response {
    let position = match args {
        [raw] => raw.parse::<i64>().ok(),
        _ => None,
    };
    let Some(position) = position else {
        return Response::err("Usage: removequeuedcevent <position>");
    };

    match scheduler.remove_queued(position) {
        Ok(name) => Response::ok(format!("Removed queued entry: {}.", name)),
        Err(_) => Response::err("Invalid queue position."),
    }
}

fn view<H: RoundHost>(scheduler: &CEventScheduler<H>, json: bool) -> Response {
    let view = scheduler.view_queue();
    if json {
        return match view.to_json() {
            Ok(json) => Response::ok(json),
            Err(e) => Response::err(format!("Failed to serialize queue: {}", e)),
        };
    }

    if view.slots.is_empty() {
        return Response::ok("The event queue is empty.");
    }

    let mut lines = vec!["CEvent Queue:".to_string()];
    if let Some(current) = view.current.as_deref() {
        lines.push(format!("Current Event: {}", current));
    }
    lines.extend(
        view.slots
            .iter()
            .map(|slot| format!("{}. {}", slot.position, slot.name)),
    );
    Response::ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ConsoleHost;
    use cevent_core::builtin::builtin_catalog;
    use cevent_core::Settings;

    fn scheduler() -> CEventScheduler<ConsoleHost> {
        let mut scheduler = CEventScheduler::with_settings(ConsoleHost::new(), Settings::default());
        scheduler.register_catalog(builtin_catalog());
        scheduler
    }

    fn admin() -> Sender {
        Sender::player("admin", [Sender::ALL])
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(parse_line("lces"), Ok(AdminCommand::ListCEvents));
        assert_eq!(
            parse_line("qec 2 3 1 2 -1"),
            Ok(AdminCommand::QueueCEvent {
                args: vec!["2", "3", "1", "2", "-1"]
                    .into_iter()
                    .map(String::from)
                    .collect()
            })
        );
        assert_eq!(
            parse_line("vceq --json"),
            Ok(AdminCommand::ViewCEventQueue { json: true })
        );
        assert!(parse_line("frobnicate").is_err());
        assert!(parse_line("qec \"1").is_err());
    }

    #[test]
    fn test_queue_requires_player_and_permission() {
        let mut scheduler = scheduler();
        let response = run_line(&mut scheduler, &Sender::console(), "qec 1");
        assert_eq!(
            response,
            Response::err("You must be a player to run this command.")
        );

        let guest = Sender::player("guest", ["kts.listcevents"]);
        let response = run_line(&mut scheduler, &guest, "qec 1");
        assert_eq!(response, Response::err("You do not have permission."));
        assert!(run_line(&mut scheduler, &guest, "lces").success);
        assert_eq!(scheduler.queue_len(), 0);
    }

    #[test]
    fn test_console_runs_everything_but_queue() {
        let mut scheduler = scheduler();
        let console = Sender::console();
        assert!(run_line(&mut scheduler, &console, "listcevents").success);
        assert!(run_line(&mut scheduler, &console, "cceq").success);
        assert!(run_line(&mut scheduler, &console, "vceq").success);
    }

    #[test]
    fn test_queue_normal_round() {
        let mut scheduler = scheduler();
        let response = run_line(&mut scheduler, &admin(), "qec NULL");
        assert_eq!(response, Response::ok("Queued normal round."));

        let response = run_line(&mut scheduler, &admin(), "qec null 2");
        assert_eq!(
            response,
            Response::err("No additional arguments allowed for null event.")
        );
        assert_eq!(scheduler.queue_len(), 1);
    }

    #[test]
    fn test_queue_event_with_config() {
        let mut scheduler = scheduler();
        let response = run_line(&mut scheduler, &admin(), "qec 2 4 1 3");
        assert!(response.success, "{}", response);
        assert_eq!(scheduler.queue_len(), 3);

        let response = run_line(&mut scheduler, &admin(), "qec 1 1 1");
        assert_eq!(response, Response::ok("Queued event Nuke Run at position 1."));
    }

    #[test]
    fn test_queue_argument_errors() {
        let mut scheduler = scheduler();
        let admin = admin();

        let response = run_line(&mut scheduler, &admin, "qec abc");
        assert_eq!(response, Response::err("Invalid event ID."));

        let response = run_line(&mut scheduler, &admin, "qec 99");
        assert_eq!(response, Response::err("Event not found."));

        let response = run_line(&mut scheduler, &admin, "qec 2 4");
        assert_eq!(
            response,
            Response::err("Usage: queuecevent <eventId|null> <medkits> <colas> [runIn] [position]")
        );

        let response = run_line(&mut scheduler, &admin, "qec 2 4 many");
        assert!(!response.success);
        assert!(response.message.ends_with("Colas must be an integer."));
        assert!(response.message.starts_with("Usage:"));

        let response = run_line(&mut scheduler, &admin, "qec 1 0");
        assert_eq!(response, Response::err("runIn must be an integer >= 1."));

        let response = run_line(&mut scheduler, &admin, "qec 1 soon");
        assert_eq!(response, Response::err("runIn must be an integer >= 1."));

        let response = run_line(&mut scheduler, &admin, "qec 1 0 abc");
        assert_eq!(response, Response::err("runIn must be an integer >= 1."));

        let response = run_line(&mut scheduler, &admin, "qec 1 1 0");
        assert_eq!(response, Response::err("position must be -1 or >= 1."));

        let response = run_line(&mut scheduler, &admin, "qec 1 1 -1 9");
        assert_eq!(response, Response::err("Too many arguments."));

        assert_eq!(scheduler.queue_len(), 0);
    }

    #[test]
    fn test_queue_run_in_limit() {
        let mut scheduler = scheduler();
        let admin = admin();

        let response = run_line(&mut scheduler, &admin, "qec 1 9223372036854775807");
        assert_eq!(response, Response::err("runIn must be at most 10000."));

        let response = run_line(&mut scheduler, &admin, "qec 1 100000000000 abc");
        assert_eq!(response, Response::err("runIn must be at most 10000."));

        assert_eq!(scheduler.queue_len(), 0);

        let response = run_line(&mut scheduler, &admin, "qec 1 10000");
        assert_eq!(response, Response::ok("Queued event Nuke Run at position 10000."));
        assert_eq!(scheduler.queue_len(), 10_000);
    }

    #[test]
    fn test_view_and_remove() {
        let mut scheduler = scheduler();
        let admin = admin();
        assert_eq!(
            run_line(&mut scheduler, &admin, "vceq"),
            Response::ok("The event queue is empty.")
        );

        run_line(&mut scheduler, &admin, "qec 1 2");
        assert_eq!(
            run_line(&mut scheduler, &admin, "viewceventqueue"),
            Response::ok("CEvent Queue:\n1. Normal Round\n2. Nuke Run")
        );

        assert_eq!(
            run_line(&mut scheduler, &admin, "rqce 3"),
            Response::err("Invalid queue position.")
        );
        assert_eq!(
            run_line(&mut scheduler, &admin, "rqce"),
            Response::err("Usage: removequeuedcevent <position>")
        );
        assert!(run_line(&mut scheduler, &admin, "rqce 1").success);
        assert_eq!(scheduler.queue_len(), 1);

        let json = run_line(&mut scheduler, &admin, "vceq --json");
        let value: serde_json::Value = serde_json::from_str(&json.message).unwrap();
        assert_eq!(value["slots"][0]["name"], "Nuke Run");
    }

    #[test]
    fn test_stop_current() {
        let mut scheduler = scheduler();
        let admin = admin();
        assert_eq!(
            run_line(&mut scheduler, &admin, "sce"),
            Response::err("No event is currently running.")
        );

        run_line(&mut scheduler, &admin, "qec 1");
        scheduler.notify_round_restarted();
        let response = run_line(&mut scheduler, &admin, "stopcevent");
        assert_eq!(response, Response::ok("Current event stopped: Nuke Run."));
        assert!(scheduler.host_mut().take_restart_request());
    }

    #[test]
    fn test_list_format() {
        let mut scheduler = scheduler();
        let response = run_line(&mut scheduler, &admin(), "lces");
        let first_lines: Vec<&str> = response.message.lines().take(2).collect();
        assert_eq!(first_lines, vec!["Registered Events:", "1: Nuke Run"]);

        let empty = CEventScheduler::with_settings(ConsoleHost::new(), Settings::default());
        assert_eq!(list(&empty), Response::ok("No registered events."));
    }
}
