// Calibration table and link settings for the pocket cube rig.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::servo::bridge::MAX_DUTY_TICKS;

// Servo control signal: 20 ms period, standard for analog servos
pub const PWM_FREQUENCY_HZ: u16 = 50;

// Bridge board channels the servos are wired to
pub const TURN_SERVO_CHANNEL: u8 = 0;
pub const ROTATE_SERVO_CHANNEL: u8 = 1;

// Command link baud rate (must match the host side)
pub const CMD_BAUDRATE: u32 = 9600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read calibration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse calibration file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{name} = {ticks} exceeds the {max}-tick duty range")]
    DutyOutOfRange {
        name: &'static str,
        ticks: u16,
        max: u16,
    },

    #[error("rotation stops must increase strictly from 0° to 270°, got {ticks:?}")]
    NonMonotonicStops { ticks: [u16; 4] },

    #[error("turn servo hold and push positions are both {ticks}")]
    TurnStopsEqual { ticks: u16 },
}

/// Duty-cycle ticks and settle times for the rig's two servos.
///
/// Defaults are the values of the reference rig; a JSON file can override
/// any subset of fields. All duty values are ticks of the 20 ms PWM period
/// (0..=4095).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Calibration {
    /// Turn servo: far crossbar just holding the cube
    pub turn_min_ticks: u16,
    /// Turn servo: crossbar pushing the cube past its tipping point
    pub turn_max_ticks: u16,
    /// Rotation servo stops for 0°, 90°, 180°, 270°
    pub rotate_ticks: [u16; 4],
    /// Wait per turn servo direction change
    pub turn_settle_ms: u64,
    /// Wait per 90° rotation step
    pub rotate_settle_ms: u64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            turn_min_ticks: 100,
            turn_max_ticks: 380,
            rotate_ticks: [102, 247, 397, 533],
            turn_settle_ms: 550,
            rotate_settle_ms: 650,
        }
    }
}

impl Calibration {
    /// Read a calibration file and check it against the rig's invariants.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let cal = Self::from_json(&fs::read_to_string(path)?)?;
        cal.validate()?;
        Ok(cal)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Duty values must fit the board's 12-bit register, and the four
    /// rotation stops must sweep strictly upward (the servo's travel is
    /// linear across 0–270°).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let duties = [
            ("turn_min_ticks", self.turn_min_ticks),
            ("turn_max_ticks", self.turn_max_ticks),
            ("rotate_ticks", self.rotate_ticks[0]),
            ("rotate_ticks", self.rotate_ticks[1]),
            ("rotate_ticks", self.rotate_ticks[2]),
            ("rotate_ticks", self.rotate_ticks[3]),
        ];
        for (name, ticks) in duties {
            if ticks > MAX_DUTY_TICKS {
                return Err(ConfigError::DutyOutOfRange {
                    name,
                    ticks,
                    max: MAX_DUTY_TICKS,
                });
            }
        }

        if !self.rotate_ticks.windows(2).all(|w| w[0] < w[1]) {
            return Err(ConfigError::NonMonotonicStops {
                ticks: self.rotate_ticks,
            });
        }

        if self.turn_min_ticks == self.turn_max_ticks {
            return Err(ConfigError::TurnStopsEqual {
                ticks: self.turn_min_ticks,
            });
        }

        Ok(())
    }

    pub fn turn_settle(&self) -> Duration {
        Duration::from_millis(self.turn_settle_ms)
    }

    pub fn rotate_settle(&self) -> Duration {
        Duration::from_millis(self.rotate_settle_ms)
    }
}
