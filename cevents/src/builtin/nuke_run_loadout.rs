//! Nuke run with a configurable starting loadout

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

use crate::event::{CEvent, CEventConfig, ConfigError, ConfigResult, EventId, SharedConfig};

/// Items handed to every player at round start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutConfig {
    pub medkits: i32,
    pub colas: i32,
}

impl Default for LoadoutConfig {
    fn default() -> Self {
        Self {
            medkits: 5,
            colas: 3,
        }
    }
}

impl CEventConfig for LoadoutConfig {
    fn expected_args(&self) -> usize {
        2
    }

    fn usage(&self) -> &str {
        "<medkits> <colas>"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NukeRunWithLoadout;

impl NukeRunWithLoadout {
    pub const ID: EventId = 2;
}

impl CEvent for NukeRunWithLoadout {
    fn id(&self) -> EventId {
        Self::ID
    }

    fn name(&self) -> &str {
        "Nuke Run With Loadout"
    }

    fn description(&self) -> &str {
        "Players will run to the exit from the d-class cells while nuke goes off. And you can config what they get."
    }

    fn is_example(&self) -> bool {
        true
    }

    fn default_config(&self) -> SharedConfig {
        Arc::new(LoadoutConfig::default())
    }

    fn parse_config(&self, args: &[String]) -> ConfigResult {
        let [medkits, colas] = args else {
            return Err(ConfigError::new(format!(
                "Expected 2 arguments, got {}.",
                args.len()
            )));
        };
        let medkits = medkits
            .parse::<i32>()
            .map_err(|_| ConfigError::new("Medkits must be an integer."))?;
        let colas = colas
            .parse::<i32>()
            .map_err(|_| ConfigError::new("Colas must be an integer."))?;
        Ok(Arc::new(LoadoutConfig { medkits, colas }))
    }
}
