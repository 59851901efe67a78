use chrono::{DateTime, Duration, FixedOffset};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::utils::{clock::Clock, time::format_duration};

use super::record::TimeRecord;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("Tracking has already started")]
    AlreadyTracking,
    #[error("Tracking was not started")]
    NotTracking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running { start: DateTime<FixedOffset> },
}

/// The single timer of the application. Either idle or running since some moment, and reusable
/// after every stop.
///
/// Calls must be serialized by the owner; the only read that may happen while the timer runs is
/// [TrackingSession::elapsed] for live display.
pub struct TrackingSession {
    state: SessionState,
    clock: Box<dyn Clock>,
}

impl TrackingSession {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            state: SessionState::Idle,
            clock,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, SessionState::Running { .. })
    }

    /// Starts the timer and returns the moment it started at.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> Result<DateTime<FixedOffset>, SessionError> {
        if self.is_tracking() {
            return Err(SessionError::AlreadyTracking);
        }

        let start = self.clock.time();
        self.state = SessionState::Running { start };
        debug!("Started tracking at {start}");
        Ok(start)
    }

    /// Stops the timer. The resulting record has no category yet.
    #[instrument(skip(self))]
    pub fn stop(&mut self) -> Result<TimeRecord, SessionError> {
        let start = self.start_time()?;

        let end = self.clock.time();
        self.state = SessionState::Idle;
        debug!("Stopped tracking at {end}");
        Ok(TimeRecord::new(start, end))
    }

    pub fn start_time(&self) -> Result<DateTime<FixedOffset>, SessionError> {
        match self.state {
            SessionState::Running { start } => Ok(start),
            SessionState::Idle => Err(SessionError::NotTracking),
        }
    }

    pub fn elapsed_duration(&self) -> Result<Duration, SessionError> {
        let start = self.start_time()?;
        Ok(self.clock.time() - start)
    }

    /// Time since start, formatted for display.
    pub fn elapsed(&self) -> Result<String, SessionError> {
        self.elapsed_duration().map(format_duration)
    }
}
