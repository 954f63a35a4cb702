#![allow(dead_code)]

use std::path::Path;

use chrono::{Local, TimeDelta, TimeZone};
use dirwatch::clock::FixedClock;

pub use dirwatch_test_utils::builders;
pub use dirwatch_test_utils::recorder::EventRecorder;
pub use dirwatch_test_utils::{init_tracing, wait_until, with_timeout};

/// 2024-03-05 at the given local time.
pub fn clock_at(hour: u32, minute: u32, second: u32, millis: i64) -> FixedClock {
    let base = Local
        .with_ymd_and_hms(2024, 3, 5, hour, minute, second)
        .unwrap();
    FixedClock(base + TimeDelta::milliseconds(millis))
}

/// 2024-03-05 14:07:03.512 local time.
pub fn fixed_clock() -> FixedClock {
    clock_at(14, 7, 3, 512)
}

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}
