//! The round's periodic drivers
//!
//! Three independent timers (movement frames, game seconds, spawns) are
//! kept as due timestamps rather than callbacks, so cancelling them is just
//! disarming and nothing can fire after a round ends.

/// Which driver is due
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Driver {
    // Order matters: at equal due times a spawn lands first, then the frame
    // moves and collides, then the second tick evaluates combo decay.
    Spawn,
    Frame,
    Second,
}

/// A one-shot due time, re-armed by the owner after each firing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    due_ms: Option<u64>,
}

impl Timer {
    pub fn arm_at(&mut self, due_ms: u64) {
        self.due_ms = Some(due_ms);
    }

    pub fn disarm(&mut self) {
        self.due_ms = None;
    }

    pub fn due_ms(&self) -> Option<u64> {
        self.due_ms
    }

    pub fn is_armed(&self) -> bool {
        self.due_ms.is_some()
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.due_ms.is_some_and(|due| due <= now_ms)
    }

    /// Push the due time back, keeping whatever was left on the timer
    pub fn shift(&mut self, delta_ms: u64) {
        if let Some(due) = self.due_ms.as_mut() {
            *due = due.saturating_add(delta_ms);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timers {
    pub spawn: Timer,
    pub frame: Timer,
    pub second: Timer,
}

impl Timers {
    pub fn get_mut(&mut self, driver: Driver) -> &mut Timer {
        match driver {
            Driver::Spawn => &mut self.spawn,
            Driver::Frame => &mut self.frame,
            Driver::Second => &mut self.second,
        }
    }

    /// Earliest driver due at or before `now_ms`
    pub fn next_due(&self, now_ms: u64) -> Option<(Driver, u64)> {
        [
            (Driver::Spawn, self.spawn),
            (Driver::Frame, self.frame),
            (Driver::Second, self.second),
        ]
        .into_iter()
        .filter_map(|(driver, timer)| timer.due_ms.map(|due| (due, driver)))
        .filter(|&(due, _)| due <= now_ms)
        .min()
        .map(|(due, driver)| (driver, due))
    }

    /// Shift every armed driver (resume after a pause)
    pub fn shift(&mut self, delta_ms: u64) {
        self.spawn.shift(delta_ms);
        self.frame.shift(delta_ms);
        self.second.shift(delta_ms);
    }

    pub fn cancel_all(&mut self) {
        self.spawn.disarm();
        self.frame.disarm();
        self.second.disarm();
    }

    pub fn any_armed(&self) -> bool {
        self.spawn.is_armed() || self.frame.is_armed() || self.second.is_armed()
    }
}
