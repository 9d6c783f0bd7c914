//! Host interface consumed by the lifecycle controller

use crate::event::HookTarget;

/// Result of a hook (un)registration. Failures are logged by the caller
/// and never propagated.
pub type HookResult = anyhow::Result<()>;

/// The round-based process the scheduler runs inside.
///
/// The host owns the actual game behavior of each event. The scheduler only
/// tells it which events' hooks should be live.
pub trait RoundHost {
    /// Start delivering game callbacks to `target`.
    fn register_hooks(&mut self, target: HookTarget<'_>) -> HookResult;

    /// Stop delivering game callbacks to `target`.
    fn unregister_hooks(&mut self, target: HookTarget<'_>) -> HookResult;

    /// Ask for a full round restart. The host answers later with its own
    /// round-restarted signal.
    fn request_round_restart(&mut self);
}

impl<H: RoundHost + ?Sized> RoundHost for Box<H> {
    fn register_hooks(&mut self, target: HookTarget<'_>) -> HookResult {
        (**self).register_hooks(target)
    }

    fn unregister_hooks(&mut self, target: HookTarget<'_>) -> HookResult {
        (**self).unregister_hooks(target)
    }

    fn request_round_restart(&mut self) {
        (**self).request_round_restart()
    }
}
