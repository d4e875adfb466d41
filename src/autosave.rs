//! Debounced auto-save timer.
//!
//! Every edit pushes the deadline back to `now + delay`; only the last
//! scheduled fire survives. The clock is passed in, so the timer never reads
//! wall time itself and tests can step through it.

use std::time::{Duration, Instant};

/// Handed out when a scheduled save comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket {
    /// Which schedule produced this ticket; increases with every `touch`.
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct AutoSave {
    delay: Duration,
    deadline: Option<Instant>,
    generation: u64,
}

impl AutoSave {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            generation: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// An edit happened: replace any pending fire with one at `now + delay`.
    pub fn touch(&mut self, now: Instant) {
        self.generation += 1;
        self.deadline = Some(now + self.delay);
    }

    /// Drop the pending fire, if any. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns a ticket once the deadline has passed, then clears it.
    pub fn poll(&mut self, now: Instant) -> Option<SaveTicket> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(SaveTicket {
                    generation: self.generation,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(30);

    #[test]
    fn nothing_pending_initially() {
        let mut timer = AutoSave::new(DELAY);
        assert!(!timer.is_pending());
        assert_eq!(timer.poll(Instant::now()), None);
    }

    #[test]
    fn fires_once_after_delay() {
        let start = Instant::now();
        let mut timer = AutoSave::new(DELAY);
        timer.touch(start);

        assert_eq!(timer.poll(start + Duration::from_secs(29)), None);
        assert!(timer.poll(start + DELAY).is_some());
        assert_eq!(timer.poll(start + Duration::from_secs(90)), None);
    }

    #[test]
    fn each_edit_pushes_deadline_back() {
        let start = Instant::now();
        let mut timer = AutoSave::new(DELAY);
        timer.touch(start);
        timer.touch(start + Duration::from_secs(20));

        // The first schedule would have fired here
        assert_eq!(timer.poll(start + Duration::from_secs(31)), None);
        let ticket = timer.poll(start + Duration::from_secs(50)).unwrap();
        assert_eq!(ticket.generation, 2);
    }

    #[test]
    fn cancel_then_reschedule_fires_once() {
        let start = Instant::now();
        let mut timer = AutoSave::new(DELAY);
        timer.touch(start);
        timer.cancel();
        timer.cancel();
        assert!(!timer.is_pending());
        assert_eq!(timer.poll(start + DELAY), None);

        timer.touch(start + DELAY);
        let due = start + DELAY * 2;
        assert!(timer.poll(due).is_some());
        assert_eq!(timer.poll(due), None);
    }
}
