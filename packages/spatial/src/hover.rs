//! Debounced hover state machine.
//!
//! ```text
//! Idle ──move(r)──▶ Hovering(r) ──move(none)──▶ PendingHide(r) ──timer──▶ Idle
//!                      ▲  │ move(r2): switch now        │
//!                      └──┴─────────────────────────────┘ move(r'): cancel timer
//! any ──leave──▶ Idle (timer cancelled, no debounce)
//! ```
//!
//! Only losing a target is debounced. Switching between targets is
//! immediate, and leaving the map surface hides at once.
//!
//! The machine never touches a clock. Timers are requested from a
//! [`HoverScheduler`], and a timer that fires after it has been superseded
//! is recognized by its [`TimerHandle`] and ignored.

use std::collections::BTreeMap;
use std::time::Duration;

use feedback_map_geography_models::ScreenPosition;

/// Default delay between losing a target and hiding the tooltip.
pub const DEFAULT_HIDE_DELAY: Duration = Duration::from_millis(150);

/// Identifies one scheduled hide timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wraps a scheduler-assigned id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The scheduler-assigned id.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Something that can run a one-shot callback after a delay.
///
/// When the delay elapses the owner of the scheduler must call
/// [`HoverStateMachine::timer_fired`] with the handle that was returned.
pub trait HoverScheduler {
    /// Schedules a timer and returns its handle.
    fn schedule(&mut self, delay: Duration) -> TimerHandle;

    /// Cancels a timer. Cancelling an unknown or already-fired handle is a
    /// no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Current hover state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HoverState {
    /// Nothing hovered, no tooltip.
    #[default]
    Idle,
    /// Tooltip shown for `region`.
    Hovering {
        /// Hovered region name.
        region: String,
    },
    /// Pointer has left `region`'s catchment; the tooltip stays up until
    /// `timer` fires.
    PendingHide {
        /// Region whose tooltip is still shown.
        region: String,
        /// Pending hide timer.
        timer: TimerHandle,
    },
}

impl HoverState {
    /// The region whose tooltip is currently shown, if any.
    #[must_use]
    pub fn active_region(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Hovering { region } | Self::PendingHide { region, .. } => Some(region),
        }
    }

    /// The pending hide timer, if any.
    #[must_use]
    pub const fn pending_timer(&self) -> Option<TimerHandle> {
        match self {
            Self::PendingHide { timer, .. } => Some(*timer),
            _ => None,
        }
    }
}

/// Events for the tooltip renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum HoverEvent {
    /// Show (or move) the tooltip for `region`.
    Start {
        /// Region now hovered.
        region: String,
        /// Pointer position when the region was entered.
        screen_position: ScreenPosition,
    },
    /// Hide the tooltip.
    End,
}

/// Single owner of [`HoverState`].
#[derive(Debug, Clone)]
pub struct HoverStateMachine {
    state: HoverState,
    hide_delay: Duration,
}

impl Default for HoverStateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_HIDE_DELAY)
    }
}

impl HoverStateMachine {
    /// Creates an idle machine that waits `hide_delay` before hiding.
    #[must_use]
    pub const fn new(hide_delay: Duration) -> Self {
        Self {
            state: HoverState::Idle,
            hide_delay,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &HoverState {
        &self.state
    }

    /// Configured hide delay.
    #[must_use]
    pub const fn hide_delay(&self) -> Duration {
        self.hide_delay
    }

    /// Handles a pointer move. `hit` is the resolved region name, or
    /// `None` if the pointer is not within any catchment.
    pub fn pointer_move(
        &mut self,
        hit: Option<&str>,
        screen_position: ScreenPosition,
        scheduler: &mut impl HoverScheduler,
    ) -> Option<HoverEvent> {
        let (next, event) = match (&self.state, hit) {
            (HoverState::Idle | HoverState::PendingHide { .. }, None) => return None,
            (HoverState::Hovering { region }, Some(found)) if region == found => return None,
            (HoverState::Idle | HoverState::Hovering { .. }, Some(found)) => {
                (hovering(found), Some(start(found, screen_position)))
            }
            (HoverState::Hovering { region }, None) => {
                let timer = scheduler.schedule(self.hide_delay);
                log::trace!("Lost '{region}', hide scheduled as {timer:?}");
                let region = region.clone();
                (HoverState::PendingHide { region, timer }, None)
            }
            (HoverState::PendingHide { region, timer }, Some(found)) => {
                scheduler.cancel(*timer);
                let event = (region != found).then(|| start(found, screen_position));
                (hovering(found), event)
            }
        };

        self.transition(next);
        event
    }

    /// Handles a fired hide timer. Handles that are not the currently
    /// pending timer are stale and ignored.
    pub fn timer_fired(&mut self, handle: TimerHandle) -> Option<HoverEvent> {
        if self.state.pending_timer() != Some(handle) {
            log::trace!("Ignoring stale hide timer {handle:?}");
            return None;
        }
        self.transition(HoverState::Idle);
        Some(HoverEvent::End)
    }

    /// Handles the pointer leaving the map surface: hide immediately.
    pub fn pointer_leave(&mut self, scheduler: &mut impl HoverScheduler) -> Option<HoverEvent> {
        let was_shown = self.state.active_region().is_some();
        self.cancel_pending(scheduler);
        self.transition(HoverState::Idle);
        was_shown.then_some(HoverEvent::End)
    }

    /// Cancels any pending timer and resets to idle without emitting an
    /// event. Call when the map surface is destroyed.
    pub fn teardown(&mut self, scheduler: &mut impl HoverScheduler) {
        self.cancel_pending(scheduler);
        self.state = HoverState::Idle;
    }

    fn cancel_pending(&self, scheduler: &mut impl HoverScheduler) {
        if let Some(timer) = self.state.pending_timer() {
            scheduler.cancel(timer);
        }
    }

    fn transition(&mut self, next: HoverState) {
        if self.state != next {
            log::debug!("Hover {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }
}

fn hovering(region: &str) -> HoverState {
    HoverState::Hovering {
        region: region.to_string(),
    }
}

fn start(region: &str, screen_position: ScreenPosition) -> HoverEvent {
    HoverEvent::Start {
        region: region.to_string(),
        screen_position,
    }
}

/// A [`HoverScheduler`] driven by an explicit clock.
///
/// Hosts that already run a frame loop can advance it once per frame and
/// feed the due handles back into the machine.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<TimerHandle, Duration>,
}

impl ManualScheduler {
    /// Creates a scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed time since creation.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of timers that have neither fired nor been cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Advances the clock and returns the timers that became due, in
    /// deadline order.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerHandle> {
        self.now += by;

        let mut due: Vec<(Duration, TimerHandle)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= self.now)
            .map(|(handle, deadline)| (*deadline, *handle))
            .collect();
        due.sort();

        for (_, handle) in &due {
            self.pending.remove(handle);
        }
        due.into_iter().map(|(_, handle)| handle).collect()
    }
}

impl HoverScheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        self.pending.insert(handle, self.now + delay);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HERE: ScreenPosition = ScreenPosition::new(10.0, 20.0);

    fn machine() -> (HoverStateMachine, ManualScheduler) {
        (HoverStateMachine::default(), ManualScheduler::new())
    }

    fn fire_due(
        machine: &mut HoverStateMachine,
        scheduler: &mut ManualScheduler,
        by: Duration,
    ) -> Vec<HoverEvent> {
        scheduler
            .advance(by)
            .into_iter()
            .filter_map(|h| machine.timer_fired(h))
            .collect()
    }

    #[test]
    fn idle_to_hovering() {
        let (mut m, mut s) = machine();
        let event = m.pointer_move(Some("Nairobi"), HERE, &mut s);
        assert_eq!(
            event,
            Some(HoverEvent::Start {
                region: "Nairobi".to_string(),
                screen_position: HERE
            })
        );
        assert_eq!(m.state().active_region(), Some("Nairobi"));
    }

    #[test]
    fn same_region_is_noop() {
        let (mut m, mut s) = machine();
        m.pointer_move(Some("Nairobi"), HERE, &mut s);
        assert_eq!(m.pointer_move(Some("Nairobi"), HERE, &mut s), None);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn switching_regions_is_immediate() {
        let (mut m, mut s) = machine();
        m.pointer_move(Some("Nairobi"), HERE, &mut s);
        let event = m.pointer_move(Some("Kiambu"), HERE, &mut s);
        assert!(matches!(event, Some(HoverEvent::Start { region, .. }) if region == "Kiambu"));
        assert_eq!(
            m.state(),
            &HoverState::Hovering {
                region: "Kiambu".to_string()
            }
        );
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn losing_target_is_debounced() {
        let (mut m, mut s) = machine();
        m.pointer_move(Some("Nairobi"), HERE, &mut s);
        assert_eq!(m.pointer_move(None, HERE, &mut s), None);

        // 100 ms later: still pending, tooltip still up.
        assert!(fire_due(&mut m, &mut s, Duration::from_millis(100)).is_empty());
        assert!(matches!(m.state(), HoverState::PendingHide { region, .. } if region == "Nairobi"));
        assert_eq!(m.state().active_region(), Some("Nairobi"));

        // 160 ms: hidden.
        let events = fire_due(&mut m, &mut s, Duration::from_millis(60));
        assert_eq!(events, vec![HoverEvent::End]);
        assert_eq!(m.state(), &HoverState::Idle);
    }

    #[test]
    fn repeated_misses_do_not_restart_timer() {
        let (mut m, mut s) = machine();
        m.pointer_move(Some("Nairobi"), HERE, &mut s);
        m.pointer_move(None, HERE, &mut s);
        fire_due(&mut m, &mut s, Duration::from_millis(100));
        m.pointer_move(None, HERE, &mut s);
        assert_eq!(s.pending(), 1);

        let events = fire_due(&mut m, &mut s, Duration::from_millis(50));
        assert_eq!(events, vec![HoverEvent::End]);
    }

    #[test]
    fn reacquiring_cancels_timer() {
        let (mut m, mut s) = machine();
        m.pointer_move(Some("Nairobi"), HERE, &mut s);
        m.pointer_move(None, HERE, &mut s);
        assert_eq!(s.pending(), 1);

        // Back over the same region: no new start event.
        assert_eq!(m.pointer_move(Some("Nairobi"), HERE, &mut s), None);
        assert_eq!(s.pending(), 0);
        assert!(fire_due(&mut m, &mut s, Duration::from_secs(1)).is_empty());
        assert_eq!(m.state().active_region(), Some("Nairobi"));
    }

    #[test]
    fn pending_to_other_region() {
        let (mut m, mut s) = machine();
        m.pointer_move(Some("Nairobi"), HERE, &mut s);
        m.pointer_move(None, HERE, &mut s);
        let event = m.pointer_move(Some("Machakos"), HERE, &mut s);
        assert!(matches!(event, Some(HoverEvent::Start { region, .. }) if region == "Machakos"));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn stale_timer_is_ignored() {
        let (mut m, mut s) = machine();
        m.pointer_move(Some("Nairobi"), HERE, &mut s);
        m.pointer_move(None, HERE, &mut s);
        let stale = m.state().pending_timer().unwrap();
        m.pointer_move(Some("Kiambu"), HERE, &mut s);

        // A scheduler that failed to cancel still delivers the old handle.
        assert_eq!(m.timer_fired(stale), None);
        assert_eq!(m.state().active_region(), Some("Kiambu"));

        // A newer pending timer is not satisfied by the old handle either.
        m.pointer_move(None, HERE, &mut s);
        assert_eq!(m.timer_fired(stale), None);
        assert!(matches!(m.state(), HoverState::PendingHide { .. }));
    }

    #[test]
    fn leave_hides_immediately() {
        let (mut m, mut s) = machine();
        m.pointer_move(Some("Nairobi"), HERE, &mut s);
        m.pointer_move(None, HERE, &mut s);
        assert_eq!(m.pointer_leave(&mut s), Some(HoverEvent::End));
        assert_eq!(m.state(), &HoverState::Idle);
        assert_eq!(s.pending(), 0);

        // Nothing shown, nothing to hide.
        assert_eq!(m.pointer_leave(&mut s), None);
    }

    #[test]
    fn leave_from_hovering() {
        let (mut m, mut s) = machine();
        m.pointer_move(Some("Nairobi"), HERE, &mut s);
        assert_eq!(m.pointer_leave(&mut s), Some(HoverEvent::End));
        assert_eq!(m.state(), &HoverState::Idle);
    }

    #[test]
    fn teardown_cancels_timer_silently() {
        let (mut m, mut s) = machine();
        m.pointer_move(Some("Nairobi"), HERE, &mut s);
        m.pointer_move(None, HERE, &mut s);
        m.teardown(&mut s);
        assert_eq!(s.pending(), 0);
        assert_eq!(m.state(), &HoverState::Idle);
    }

    #[test]
    fn idle_miss_does_nothing() {
        let (mut m, mut s) = machine();
        assert_eq!(m.pointer_move(None, HERE, &mut s), None);
        assert_eq!(s.pending(), 0);
        assert_eq!(m.state(), &HoverState::Idle);
    }

    #[test]
    fn custom_delay() {
        let mut m = HoverStateMachine::new(Duration::from_millis(500));
        let mut s = ManualScheduler::new();
        m.pointer_move(Some("Nairobi"), HERE, &mut s);
        m.pointer_move(None, HERE, &mut s);
        assert!(fire_due(&mut m, &mut s, Duration::from_millis(400)).is_empty());
        assert_eq!(
            fire_due(&mut m, &mut s, Duration::from_millis(100)),
            vec![HoverEvent::End]
        );
    }
}
