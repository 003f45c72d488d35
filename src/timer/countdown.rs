//! Countdown state for a single card session

use serde::{Deserialize, Serialize};

use crate::error::TimerError;

/// Coarse classification of the remaining time, used for color cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityBand {
    Safe,
    Warning,
    Critical,
}

impl SeverityBand {
    /// Classify a progress fraction in `[0, 1]`
    pub fn from_progress(progress: f64) -> Self {
        if progress > 0.5 {
            SeverityBand::Safe
        } else if progress > 0.2 {
            SeverityBand::Warning
        } else {
            SeverityBand::Critical
        }
    }
}

/// Result of delivering one tick to a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still counting down
    Running { remaining_seconds: u32 },
    /// This tick brought the countdown to zero
    Expired,
    /// Tick arrived after expiry or after the timer was cancelled
    Ignored,
}

/// Remaining-time budget of a virtual card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownState {
    total_seconds: u32,
    remaining_seconds: u32,
    expired: bool,
}

impl CountdownState {
    /// Create a countdown with the full budget remaining
    pub fn new(total_seconds: i64) -> Result<Self, TimerError> {
        let total = u32::try_from(total_seconds)
            .ok()
            .filter(|total| *total > 0)
            .ok_or(TimerError::InvalidDuration(total_seconds))?;

        Ok(Self {
            total_seconds: total,
            remaining_seconds: total,
            expired: false,
        })
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self) -> TickOutcome {
        if self.expired {
            return TickOutcome::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.expired = true;
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining_seconds: self.remaining_seconds,
            }
        }
    }

    /// Fraction of the budget left, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        f64::from(self.remaining_seconds) / f64::from(self.total_seconds)
    }

    pub fn severity(&self) -> SeverityBand {
        SeverityBand::from_progress(self.progress())
    }

    /// Read-only view for rendering
    pub fn snapshot(&self) -> CountdownSnapshot {
        let progress = self.progress();
        CountdownSnapshot {
            total_seconds: self.total_seconds,
            remaining_seconds: self.remaining_seconds,
            expired: self.expired,
            progress,
            percent: (progress * 100.0).round() as u8,
            severity: SeverityBand::from_progress(progress),
            display: self.display(),
        }
    }

    /// `M:SS` while running, `Expired` afterwards
    pub fn display(&self) -> String {
        if self.expired {
            "Expired".to_string()
        } else {
            format!("{}:{:02}", self.remaining_seconds / 60, self.remaining_seconds % 60)
        }
    }
}

/// Point-in-time copy of a countdown, handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    pub total_seconds: u32,
    pub remaining_seconds: u32,
    pub expired: bool,
    pub progress: f64,
    pub percent: u8,
    pub severity: SeverityBand,
    pub display: String,
}
