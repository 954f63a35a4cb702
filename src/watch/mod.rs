// src/watch/mod.rs

//! Directory watching.
//!
//! This module is responsible for:
//! - Describing what to watch (`WatchTarget`, `TriggerMask`, `NameFilter`).
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Translating raw notifications into `ChangeEvent`s and relaying them to
//!   subscribers through an `EventRelay`.
//!
//! It never acts on the files itself; reacting to events (renaming,
//! relocating) is up to the subscribers.

pub mod event;
pub mod filter;
pub mod relay;
pub mod target;
pub mod trigger;
pub mod watcher;

pub use event::{ChangeEvent, ChangeKind, RenamePairing, translate};
pub use filter::NameFilter;
pub use relay::{EventRelay, Handler, HandlerId};
pub use target::WatchTarget;
pub use trigger::{TriggerCategory, TriggerMask};
pub use watcher::{WatchHandle, spawn_watch, watch};
