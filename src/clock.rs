//! Wall clock access and sleeping, behind a trait so the monitor can be
//! driven by a fake clock in tests.

use std::time::Duration;

use chrono::{Local, Timelike};

pub trait Clock {
    /// Current local hour of the day (0-23).
    fn hour(&self) -> u32;

    /// Block the calling thread.
    fn sleep(&self, duration: Duration);
}

/// The system's local time and `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn hour(&self) -> u32 {
        Local::now().hour()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn hour(&self) -> u32 {
        (**self).hour()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}
