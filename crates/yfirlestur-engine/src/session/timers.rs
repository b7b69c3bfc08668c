use std::time::{Duration, Instant};

/// Trailing-edge debounce timer.
///
/// Every `schedule` bumps the generation and pushes the deadline out, so only
/// the latest scheduling can ever fire.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    generation: u64,
    /// Generation that armed the deadline
    deadline: Option<(u64, Instant)>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: 0,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// (Re)start the window at `now`
    pub fn schedule(&mut self, now: Instant) {
        self.generation += 1;
        self.deadline = Some((self.generation, now + self.window));
    }

    /// Drop the pending call, if any
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.map(|(_, at)| at)
    }

    /// Consume the pending call if its deadline has passed
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some((generation, at)) if at <= now && generation == self.generation => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Suppresses change handling for a short while after a self-inflicted edit
#[derive(Debug, Clone)]
pub struct SuppressionWindow {
    delay: Duration,
    expires_at: Option<Instant>,
}

impl SuppressionWindow {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            expires_at: None,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.expires_at = Some(now + self.delay);
    }

    /// Push the expiry out to `now + delay`
    pub fn extend(&mut self, now: Instant) {
        if self.expires_at.is_some() {
            self.arm(now);
        }
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now < at)
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Clear the window once it has run out. Returns whether it was cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.expires_at {
            Some(at) if at <= now => {
                self.expires_at = None;
                true
            }
            _ => false,
        }
    }
}
