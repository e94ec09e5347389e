use std::time::Duration;

use instant::Instant;


pub const POLL_INTERVAL: Duration = Duration::from_millis(500);


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PollerState {
    Stopped,
    Running,
}

#[must_use]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PollerAction {
    // No need to do anything.
    Noop,

    // Time to ask the server whether the opponent has moved.
    // `OpponentPoller` assumes that a listen request will be sent when this is returned.
    SendListen,
}

// Decides when to poll for the opponent's moves. Only one poll is outstanding at a time: a slow
// server gets polled less often instead of being flooded.
#[derive(Clone, Debug)]
pub struct OpponentPoller {
    interval: Duration,
    state: PollerState,
    latest_poll_sent: Option<Instant>,
    latest_poll_answered: bool,
}

impl OpponentPoller {
    pub fn new(interval: Duration) -> Self {
        OpponentPoller {
            interval,
            state: PollerState::Stopped,
            latest_poll_sent: None,
            latest_poll_answered: true,
        }
    }

    pub fn state(&self) -> PollerState { self.state }
    pub fn is_running(&self) -> bool { self.state == PollerState::Running }
    pub fn interval(&self) -> Duration { self.interval }

    pub fn start(&mut self) { self.state = PollerState::Running; }

    // A reply to a poll sent before stopping is still accepted by `register_reply`, but no new
    // polls go out.
    pub fn stop(&mut self) { self.state = PollerState::Stopped; }

    pub fn update(&mut self, now: Instant) -> PollerAction {
        if self.state == PollerState::Stopped || !self.latest_poll_answered {
            return PollerAction::Noop;
        }
        if let Some(latest_poll_sent) = self.latest_poll_sent {
            if now.saturating_duration_since(latest_poll_sent) < self.interval {
                return PollerAction::Noop;
            }
        }
        self.latest_poll_sent = Some(now);
        self.latest_poll_answered = false;
        PollerAction::SendListen
    }

    pub fn register_reply(&mut self) { self.latest_poll_answered = true; }

    pub fn is_poll_in_flight(&self) -> bool { !self.latest_poll_answered }
}

impl Default for OpponentPoller {
    fn default() -> Self { Self::new(POLL_INTERVAL) }
}
