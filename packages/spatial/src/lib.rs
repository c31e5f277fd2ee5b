#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Pointer hit resolution and hover state for the feedback map.
//!
//! [`resolver`] finds the region nearest to a pointer coordinate within a
//! catchment radius. [`hover`] turns the stream of hits into stable
//! hover-start / hover-end events, debouncing only the loss of a target so
//! the tooltip does not flicker when the pointer jitters across catchment
//! boundaries. [`controller`] runs that state machine on tokio with real
//! cancellable timers.

pub mod controller;
pub mod hover;
pub mod resolver;

pub use controller::{HoverHandle, HoverListener, PointerInput, spawn_hover_controller};
pub use hover::{
    DEFAULT_HIDE_DELAY, HoverEvent, HoverScheduler, HoverState, HoverStateMachine,
    ManualScheduler, TimerHandle,
};
pub use resolver::{DEFAULT_CATCHMENT_KM, Hit, HitResolver, resolve};
