// Booking wizard steps: a fixed linear order that progress indicators rely on

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StepError {
    #[error("Unknown booking step: {0}")]
    Unknown(String),
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BookingStep {
    #[default]
    Category,
    Route,
    Datetime,
    Party,
    Summary,
}

impl BookingStep {
    // Canonical order. Forward/backward is always measured against this, never visit history.
    pub const ALL: [BookingStep; 5] = [
        BookingStep::Category,
        BookingStep::Route,
        BookingStep::Datetime,
        BookingStep::Party,
        BookingStep::Summary,
    ];

    pub fn index(self) -> usize {
        match self {
            BookingStep::Category => 0,
            BookingStep::Route => 1,
            BookingStep::Datetime => 2,
            BookingStep::Party => 3,
            BookingStep::Summary => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStep::Category => "category",
            BookingStep::Route => "route",
            BookingStep::Datetime => "datetime",
            BookingStep::Party => "party",
            BookingStep::Summary => "summary",
        }
    }

    // Label shown in the step indicator
    pub fn label(self) -> &'static str {
        match self {
            BookingStep::Category => "Experience",
            BookingStep::Route => "Route",
            BookingStep::Datetime => "When",
            BookingStep::Party => "Party",
            BookingStep::Summary => "Confirm",
        }
    }
}

impl fmt::Display for BookingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStep {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| StepError::Unknown(s.to_string()))
    }
}
