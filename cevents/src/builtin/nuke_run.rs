use crate::event::{CEvent, EventId};

/// Everyone starts in the cells and races the warhead to the exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NukeRun;

impl NukeRun {
    pub const ID: EventId = 1;
}

impl CEvent for NukeRun {
    fn id(&self) -> EventId {
        Self::ID
    }

    fn name(&self) -> &str {
        "Nuke Run"
    }

    fn description(&self) -> &str {
        "Players will run to the exit from the d-class cells while nuke goes off."
    }

    fn is_example(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nuke_run_takes_no_config() {
        let event = NukeRun;
        assert_eq!(event.id(), 1);
        assert_eq!(event.players_required(), None);
        assert_eq!(event.default_config().expected_args(), 0);
        assert!(event.parse_config(&[]).is_ok());
    }
}
