//! Runs a [`HoverStateMachine`] on tokio.
//!
//! Pointer input is sent through a [`HoverHandle`]; the controller task
//! resolves each coordinate, drives the machine, and calls the
//! [`HoverListener`]. Hide timers are spawned sleep tasks that are aborted
//! when cancelled, so a superseded timer normally never fires. If one
//! races past cancellation anyway, the machine discards it as stale.

use std::collections::BTreeMap;
use std::time::Duration;

use feedback_map_geography_models::{Coordinate, ScreenPosition};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::hover::{HoverEvent, HoverScheduler, HoverState, HoverStateMachine, TimerHandle};
use crate::resolver::HitResolver;

/// Receives tooltip show/hide notifications.
pub trait HoverListener: Send + 'static {
    /// Show the tooltip for `region`, anchored at `screen_position`.
    fn on_hover_start(&mut self, region: &str, screen_position: ScreenPosition);

    /// Hide the tooltip.
    fn on_hover_end(&mut self);
}

/// Pointer input accepted by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    /// Pointer moved over the map surface.
    Move {
        /// Geographic coordinate under the pointer.
        coordinate: Coordinate,
        /// Pointer position in screen space.
        screen_position: ScreenPosition,
    },
    /// Pointer left the map surface.
    Leave,
}

struct TokioScheduler {
    next_id: u64,
    fired: mpsc::UnboundedSender<TimerHandle>,
    tasks: BTreeMap<TimerHandle, JoinHandle<()>>,
}

impl TokioScheduler {
    const fn new(fired: mpsc::UnboundedSender<TimerHandle>) -> Self {
        Self {
            next_id: 0,
            fired,
            tasks: BTreeMap::new(),
        }
    }

    fn forget(&mut self, handle: TimerHandle) {
        self.tasks.remove(&handle);
    }
}

impl HoverScheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        let fired = self.fired.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = fired.send(handle);
        });

        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.abort();
        }
    }
}

/// Handle to a running hover controller.
///
/// Dropping the handle stops the controller once queued input has been
/// processed. Use [`HoverHandle::shutdown`] to wait for that.
#[derive(Debug)]
pub struct HoverHandle {
    tx: mpsc::UnboundedSender<PointerInput>,
    state: watch::Receiver<HoverState>,
    task: JoinHandle<()>,
}

impl HoverHandle {
    /// Reports a pointer move.
    pub fn pointer_move(&self, coordinate: Coordinate, screen_position: ScreenPosition) {
        self.send(PointerInput::Move {
            coordinate,
            screen_position,
        });
    }

    /// Reports the pointer leaving the map surface.
    pub fn pointer_leave(&self) {
        self.send(PointerInput::Leave);
    }

    /// Sends raw pointer input.
    pub fn send(&self, input: PointerInput) {
        if self.tx.send(input).is_err() {
            log::warn!("Hover controller has stopped; dropping {input:?}");
        }
    }

    /// The most recently published hover state.
    #[must_use]
    pub fn state(&self) -> HoverState {
        self.state.borrow().clone()
    }

    /// A receiver that is notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HoverState> {
        self.state.clone()
    }

    /// Stops the controller and waits for it to tear down. Pending hide
    /// timers are cancelled without notifying the listener.
    pub async fn shutdown(self) {
        let Self { tx, task, .. } = self;
        drop(tx);
        if let Err(e) = task.await {
            log::error!("Hover controller task failed: {e}");
        }
    }
}

/// Spawns a hover controller on the current tokio runtime.
#[must_use]
pub fn spawn_hover_controller<L: HoverListener>(
    resolver: HitResolver,
    hide_delay: Duration,
    mut listener: L,
) -> HoverHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<PointerInput>();
    let (state_tx, state_rx) = watch::channel(HoverState::Idle);

    let task = tokio::spawn(async move {
        let (fired_tx, mut fired_rx) = mpsc::unbounded_channel();
        let mut scheduler = TokioScheduler::new(fired_tx);
        let mut machine = HoverStateMachine::new(hide_delay);

        log::debug!(
            "Hover controller started (catchment {} km, hide delay {:?})",
            resolver.catchment_km(),
            hide_delay
        );

        loop {
            let event = tokio::select! {
                biased;
                input = rx.recv() => match input {
                    Some(PointerInput::Move { coordinate, screen_position }) => {
                        let hit = resolver.resolve(coordinate);
                        let name = hit.as_ref().map(|h| h.region.name.as_str());
                        machine.pointer_move(name, screen_position, &mut scheduler)
                    }
                    Some(PointerInput::Leave) => machine.pointer_leave(&mut scheduler),
                    None => break,
                },
                Some(handle) = fired_rx.recv() => {
                    scheduler.forget(handle);
                    machine.timer_fired(handle)
                }
            };

            match event {
                Some(HoverEvent::Start {
                    region,
                    screen_position,
                }) => listener.on_hover_start(&region, screen_position),
                Some(HoverEvent::End) => listener.on_hover_end(),
                None => {}
            }

            state_tx.send_if_modified(|current| {
                if *current == *machine.state() {
                    false
                } else {
                    current.clone_from(machine.state());
                    true
                }
            });
        }

        machine.teardown(&mut scheduler);
        state_tx.send_replace(HoverState::Idle);
        log::debug!("Hover controller stopped");
    });

    HoverHandle {
        tx,
        state: state_rx,
        task,
    }
}
