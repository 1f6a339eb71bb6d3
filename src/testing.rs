//! Test doubles for the hardware, network and clock seams.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    time::Duration,
};

use embedded_hal::blocking::{
    delay::DelayMs,
    i2c::{Write, WriteRead},
};

use crate::{
    ambient_light::LightProbe,
    clock::Clock,
    errors::{Error, Result},
    notifier::Transport,
    tsl2561,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

/// I2C bus recording all transactions and answering reads from a queue.
#[derive(Default)]
pub struct FakeBus {
    /// Successful writes (address, bytes)
    pub writes: Vec<(u8, Vec<u8>)>,
    /// Successful reads (address, command byte)
    pub reads: Vec<(u8, u8)>,
    /// Words returned by reads, in order
    pub words: VecDeque<u16>,
    pub fail_writes: bool,
    /// Fail all writes once this many writes succeeded
    pub fail_writes_after: Option<usize>,
}

impl FakeBus {
    pub fn queue_pair(&mut self, broadband: u16, infrared: u16) {
        self.words.push_back(broadband);
        self.words.push_back(infrared);
    }
}

impl Write for FakeBus {
    type Error = BusFault;

    fn write(&mut self, address: u8, bytes: &[u8]) -> std::result::Result<(), BusFault> {
        let exhausted = self
            .fail_writes_after
            .is_some_and(|n| self.writes.len() >= n);
        if self.fail_writes || exhausted {
            return Err(BusFault);
        }
        self.writes.push((address, bytes.to_vec()));
        Ok(())
    }
}

impl WriteRead for FakeBus {
    type Error = BusFault;

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> std::result::Result<(), BusFault> {
        let word = self.words.pop_front().ok_or(BusFault)?;
        buffer.copy_from_slice(&word.to_le_bytes());
        self.reads.push((address, bytes[0]));
        Ok(())
    }
}

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    pub calls: Vec<u16>,
}

impl DelayMs<u16> for RecordingDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.calls.push(ms);
    }
}

/// Returns the scripted readings in order, then fails with a bus error.
pub struct ScriptedProbe {
    readings: VecDeque<bool>,
}

impl ScriptedProbe {
    pub fn new(readings: &[bool]) -> Self {
        Self {
            readings: readings.iter().copied().collect(),
        }
    }
}

impl LightProbe for ScriptedProbe {
    fn read_light_state(&mut self) -> Result<bool> {
        self.readings
            .pop_front()
            .ok_or_else(|| Error::from(tsl2561::Error::Read(BusFault)))
    }
}

/// Transport failing a given number of times, then answering with a fixed
/// status code.
pub struct ScriptedTransport {
    requests: RefCell<Vec<String>>,
    failures: Cell<u32>,
    status: Cell<u16>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self {
            requests: RefCell::new(Vec::new()),
            failures: Cell::new(0),
            status: Cell::new(200),
        }
    }
}

impl ScriptedTransport {
    pub fn fail_next(&self, count: u32) {
        self.failures.set(count);
    }

    pub fn respond_with(&self, status: u16) {
        self.status.set(status);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    type Error = &'static str;

    fn get(&self, url: &str) -> std::result::Result<u16, Self::Error> {
        self.requests.borrow_mut().push(url.to_string());
        match self.failures.get() {
            0 => Ok(self.status.get()),
            n => {
                self.failures.set(n - 1);
                Err("connection refused")
            }
        }
    }
}

/// Clock with a settable hour that records sleeps.
pub struct ManualClock {
    hour: Cell<u32>,
    sleeps: RefCell<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(hour: u32) -> Self {
        Self {
            hour: Cell::new(hour),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn set_hour(&self, hour: u32) {
        self.hour.set(hour);
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Clock for ManualClock {
    fn hour(&self) -> u32 {
        self.hour.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}
