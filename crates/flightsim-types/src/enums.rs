//! Value types for the discrete telemetry channels.
//!
//! Both [`LaunchPhase`] and [`ErrorCode`] travel over the wire as bare
//! integers (the dashboard indexes its label tables with them), so they are
//! modelled as range-checked newtypes around `u8` rather than Rust enums.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A raw channel value fell outside its documented range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{channel} value {value} out of range 0..={max}")]
pub struct OutOfRange {
    /// Name of the channel that rejected the value.
    pub channel: &'static str,
    /// The rejected value.
    pub value: u8,
    /// Largest accepted value.
    pub max: u8,
}

// ---------------------------------------------------------------------------
// Launch phase
// ---------------------------------------------------------------------------

/// Display labels indexed by phase number.
const PHASE_LABELS: [&str; 7] = [
    "Pre-Launch",
    "Ready to Launch",
    "Ascending",
    "Cruising",
    "Apogee",
    "Descending",
    "Landed",
];

/// Stage of the simulated flight, `0` (pre-launch) through `6` (landed).
///
/// Phases only ever move forward. Phases 2-4 climb, phases 5 and 6
/// descend towards the ground.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(try_from = "u8", into = "u8")]
#[ts(export, export_to = "bindings/")]
pub struct LaunchPhase(u8);

impl LaunchPhase {
    /// Sitting on the pad.
    pub const PRE_LAUNCH: Self = Self(0);
    /// Armed and waiting for ignition.
    pub const READY: Self = Self(1);
    /// Powered ascent.
    pub const ASCENDING: Self = Self(2);
    /// Coasting upwards.
    pub const CRUISING: Self = Self(3);
    /// Top of the trajectory, still gaining a little height.
    pub const APOGEE: Self = Self(4);
    /// Under parachute.
    pub const DESCENDING: Self = Self(5);
    /// Terminal phase. No further transitions.
    pub const LANDED: Self = Self(6);

    /// Build a phase from its wire value, rejecting anything above 6.
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::LANDED.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// The wire value of this phase.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// The phase after this one, or `self` when already terminal.
    pub const fn next(self) -> Self {
        if self.is_terminal() {
            self
        } else {
            Self(self.0.saturating_add(1))
        }
    }

    /// Whether this is the last phase.
    pub const fn is_terminal(self) -> bool {
        self.0 >= Self::LANDED.0
    }

    /// Whether altitude increases during this phase (phases 2-4).
    pub const fn is_climbing(self) -> bool {
        self.0 >= Self::ASCENDING.0 && self.0 < Self::DESCENDING.0
    }

    /// Whether altitude decreases during this phase (phases 5 and 6).
    pub const fn is_descending(self) -> bool {
        self.0 >= Self::DESCENDING.0
    }

    /// Human-readable label as shown on the dashboard.
    pub fn label(self) -> &'static str {
        PHASE_LABELS
            .get(usize::from(self.0))
            .copied()
            .unwrap_or("Unknown")
    }
}

impl TryFrom<u8> for LaunchPhase {
    type Error = OutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(OutOfRange {
            channel: "launch phase",
            value,
            max: Self::LANDED.0,
        })
    }
}

impl From<LaunchPhase> for u8 {
    fn from(phase: LaunchPhase) -> Self {
        phase.0
    }
}

impl core::fmt::Display for LaunchPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.0, self.label())
    }
}

// ---------------------------------------------------------------------------
// Error code
// ---------------------------------------------------------------------------

/// Descriptions indexed by error code.
const ERROR_DESCRIPTIONS: [&str; 6] = [
    "No Error",
    "Container descent rate failure",
    "Science Payload descent rate failure",
    "Container position failure",
    "Science Payload position failure",
    "Release failure",
];

/// Fault indicator reported with every sample. `0` is nominal, `1`-`5`
/// name a specific payload fault.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(try_from = "u8", into = "u8")]
#[ts(export, export_to = "bindings/")]
pub struct ErrorCode(u8);

impl ErrorCode {
    /// No fault.
    pub const NOMINAL: Self = Self(0);
    /// Lowest fault code.
    pub const FIRST_FAULT: u8 = 1;
    /// Highest fault code.
    pub const LAST_FAULT: u8 = 5;

    /// Build an error code from its wire value, rejecting anything above 5.
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::LAST_FAULT {
            Some(Self(value))
        } else {
            None
        }
    }

    /// The wire value of this code.
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether this code signals "no error".
    pub const fn is_nominal(self) -> bool {
        self.0 == 0
    }

    /// Human-readable description as shown on the dashboard.
    pub fn description(self) -> &'static str {
        ERROR_DESCRIPTIONS
            .get(usize::from(self.0))
            .copied()
            .unwrap_or("Unknown Error")
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = OutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(OutOfRange {
            channel: "error code",
            value,
            max: Self::LAST_FAULT,
        })
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.0, self.description())
    }
}
