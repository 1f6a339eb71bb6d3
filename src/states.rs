//! State machine.
//!
//! The monitor remembers whether a lit notification was already sent. While
//! the light stays on, nothing else is sent, except that entering a reminder
//! hour forgets the earlier notification once so it is sent again.

use std::convert::Infallible;

use log::info;

use crate::{
    ambient_light::LightProbe,
    clock::Clock,
    config::{Config, ReminderHours, ReportWindow},
    errors::Result,
    notifier::{Notifier, Transport},
};

/// Notification events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Boot,
    Lit,
    Resolved,
}

impl Event {
    pub fn name(self) -> &'static str {
        match self {
            Self::Boot => "boot",
            Self::Lit => "lit",
            Self::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorState {
    previous_lit: bool,
    reminder_armed: bool,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            previous_lit: false,
            reminder_armed: true,
        }
    }
}

impl MonitorState {
    pub fn previous_lit(&self) -> bool {
        self.previous_lit
    }

    pub fn reminder_armed(&self) -> bool {
        self.reminder_armed
    }

    /// Forget a sent lit notification the first time a reminder hour is seen.
    ///
    /// The trigger fires once per stretch of reminder hours and is re-armed
    /// as soon as the hour is no longer a reminder hour. Returns whether the
    /// state was reset.
    pub fn rearm(&mut self, hour: u32, reminder_hours: &ReminderHours) -> bool {
        if !reminder_hours.contains(hour) {
            self.reminder_armed = true;
            return false;
        }
        if !self.reminder_armed {
            return false;
        }
        self.reminder_armed = false;
        self.previous_lit = false;
        true
    }

    /// Feed a new reading and return the event to send, if any.
    pub fn observe(&mut self, is_lit: bool, hour: u32, window: &ReportWindow) -> Option<Event> {
        if is_lit {
            if !self.previous_lit && window.contains(hour) {
                self.previous_lit = true;
                return Some(Event::Lit);
            }
            return None;
        }
        let was_lit = std::mem::replace(&mut self.previous_lit, false);
        was_lit.then_some(Event::Resolved)
    }
}

/// Output of a one-shot reading.
pub fn indicator(is_lit: bool, verbose: bool) -> &'static str {
    match (is_lit, verbose) {
        (true, true) => "Light is on",
        (true, false) => "1",
        (false, true) => "Light is off",
        (false, false) => "0",
    }
}

/// Take a single reading.
pub fn read_once<P: LightProbe>(probe: &mut P, verbose: bool) -> Result<&'static str> {
    let is_lit = probe.read_light_state()?;
    Ok(indicator(is_lit, verbose))
}

/// Continuous monitoring.
pub struct Monitor<'a, P, T, C> {
    config: &'a Config,
    probe: P,
    notifier: Notifier<T, C>,
    clock: C,
    state: MonitorState,
}

impl<'a, P, T, C> Monitor<'a, P, T, C>
where
    P: LightProbe,
    T: Transport,
    C: Clock + Clone,
{
    pub fn new(config: &'a Config, probe: P, transport: T, clock: C) -> Self {
        Self {
            config,
            probe,
            notifier: Notifier::new(transport, clock.clone()),
            clock,
            state: MonitorState::default(),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Send the boot event, if configured.
    pub fn boot(&self) {
        self.dispatch(Event::Boot);
    }

    /// One poll: apply the reminder rule, read the sensor, notify on
    /// transitions.
    pub fn cycle(&mut self) -> Result<Option<Event>> {
        let schedule = &self.config.schedule;
        let hour = self.clock.hour();

        if self.state.rearm(hour, &schedule.reminder_hours) {
            info!("Reminder hour {}, a lit notification may be sent again", hour);
        }

        let is_lit = self.probe.read_light_state()?;
        let event = self.state.observe(is_lit, hour, &schedule.report_window);
        if let Some(event) = event {
            self.dispatch(event);
        }
        Ok(event)
    }

    /// Poll forever. Only returns if reading the sensor fails.
    pub fn run(mut self) -> Result<Infallible> {
        self.boot();
        loop {
            self.cycle()?;
            self.clock.sleep(self.config.schedule.interval);
        }
    }

    fn dispatch(&self, event: Event) {
        let notify = &self.config.notify;
        let url = match event {
            Event::Boot => &notify.boot_url,
            Event::Lit => &notify.notify_url,
            Event::Resolved => &notify.resolved_url,
        };
        if url.is_empty() {
            return;
        }
        info!("Sending {} notification", event.name());
        self.notifier.send(url);
    }
}
