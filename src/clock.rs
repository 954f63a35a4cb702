// src/clock.rs

//! Source of "now" for the naming and relocation policies.
//!
//! Production code uses [`SystemClock`]; tests pin time with [`FixedClock`] so
//! computed names and dated directories are deterministic.

use std::fmt::Debug;

use chrono::{DateTime, Local};

pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Local>;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
