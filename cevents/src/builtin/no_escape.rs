use crate::event::GlobalCEvent;

/// Overlay that blocks escaping in every round it is active for.
///
/// The host decides what blocking means; the overlay only marks that the
/// behavior should be live.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEscape;

impl GlobalCEvent for NoEscape {
    fn is_example(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{GLOBAL_EVENT_ID, GLOBAL_EVENT_NAME};

    #[test]
    fn test_no_escape_identity() {
        assert_eq!(NoEscape.id(), GLOBAL_EVENT_ID);
        assert_eq!(NoEscape.name(), GLOBAL_EVENT_NAME);
        assert!(NoEscape.register_event());
        assert!(NoEscape.is_example());
    }
}
