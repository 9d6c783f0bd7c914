//! Console round host
//!
//! Stands in for the game server: it keeps the set of hook targets that
//! are live and turns restart requests into a flag the REPL polls.

use anyhow::bail;
use cevent_core::{HookResult, HookTarget, RoundHost};
use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct ConsoleHost {
    /// Labels of targets whose hooks are registered
    active: BTreeSet<String>,
    restart_requested: bool,
    rounds: u64,
}

impl ConsoleHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once per requested restart.
    pub fn take_restart_request(&mut self) -> bool {
        std::mem::take(&mut self.restart_requested)
    }

    pub fn active(&self) -> impl Iterator<Item = &str> + '_ {
        self.active.iter().map(String::as_str)
    }

    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Count a finished round; called before the scheduler sees the restart.
    pub fn round_ended(&mut self) {
        self.rounds += 1;
    }
}

fn label(target: &HookTarget<'_>) -> String {
    match target {
        HookTarget::Event(instance) => {
            format!("{} ({}) #{}", instance.name(), instance.id(), instance.occurrence())
        }
        HookTarget::Global(global) => format!("{} ({})", global.name(), global.id()),
    }
}

impl RoundHost for ConsoleHost {
    fn register_hooks(&mut self, target: HookTarget<'_>) -> HookResult {
        let label = label(&target);
        if !self.active.insert(label.clone()) {
            bail!("hooks for {} are already registered", label);
        }
        debug!(hook = %label, global = target.is_global(), "Registered hooks");
        Ok(())
    }

    fn unregister_hooks(&mut self, target: HookTarget<'_>) -> HookResult {
        let label = label(&target);
        if !self.active.remove(&label) {
            bail!("hooks for {} were not registered", label);
        }
        debug!(hook = %label, global = target.is_global(), "Unregistered hooks");
        Ok(())
    }

    fn request_round_restart(&mut self) {
        info!("Round restart requested");
        self.restart_requested = true;
    }
}

/// Lines the console interprets as host signals instead of admin commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostLine {
    RoundRestart,
    RoundStart { ready: u32 },
    Status,
    Quit,
}

impl HostLine {
    /// `Ok(None)` means the line is not a host line.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["quit"] | ["exit"] => Ok(Some(Self::Quit)),
            ["status"] => Ok(Some(Self::Status)),
            ["round", "restart"] => Ok(Some(Self::RoundRestart)),
            ["round", "start", ready] => ready
                .parse::<u32>()
                .map(|ready| Some(Self::RoundStart { ready }))
                .map_err(|_| "Usage: round start <ready players>".to_string()),
            ["round", ..] => Err("Usage: round restart | round start <ready players>".to_string()),
            _ => Ok(None),
        }
    }
}
