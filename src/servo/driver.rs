// Actuator driver: the rig's two logical servo channels on the PWM bridge.

use tracing::{debug, info};

use super::bridge::{PwmDevice, Result};
use crate::config::{PWM_FREQUENCY_HZ, ROTATE_SERVO_CHANNEL, TURN_SERVO_CHANNEL};

/// Logical outputs of the rig, bound to fixed bridge channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorChannel {
    /// Vertical servo tipping the cube over
    Turn,
    /// Horizontal servo rotating the lower layer
    Rotate,
}

impl ActuatorChannel {
    fn number(self) -> u8 {
        match self {
            ActuatorChannel::Turn => TURN_SERVO_CHANNEL,
            ActuatorChannel::Rotate => ROTATE_SERVO_CHANNEL,
        }
    }
}

/// Writes duty values to the rig's servos through a [`PwmDevice`].
pub struct ActuatorDriver<D: PwmDevice> {
    device: D,
}

impl<D: PwmDevice> ActuatorDriver<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    /// Check that the board is reachable and set the servo PWM frequency.
    ///
    /// Must be called exactly once before [`set_signal`](Self::set_signal).
    /// A failure here means the bus is unusable; callers abort startup.
    pub fn initialize(&mut self) -> Result<()> {
        self.device.ping()?;
        self.device.set_frequency(PWM_FREQUENCY_HZ)?;
        info!("actuator board ready, PWM at {} Hz", PWM_FREQUENCY_HZ);
        Ok(())
    }

    /// Write a duty value to a channel. The board holds the signal until
    /// the next write; pacing the physical motion is the caller's job.
    pub fn set_signal(&mut self, channel: ActuatorChannel, ticks: u16) -> Result<()> {
        debug!("{:?} servo <- {} ticks", channel, ticks);
        self.device.set_duty(channel.number(), ticks)
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servo::bridge::{BridgeError, SimPwm};

    #[test]
    fn initialize_configures_servo_frequency() {
        let mut driver = ActuatorDriver::new(SimPwm::new());
        driver.initialize().unwrap();
        assert_eq!(driver.device().frequency_hz, Some(50));
    }

    #[test]
    fn channels_map_to_configured_outputs() {
        let mut driver = ActuatorDriver::new(SimPwm::new());
        driver.initialize().unwrap();
        driver.set_signal(ActuatorChannel::Turn, 100).unwrap();
        driver.set_signal(ActuatorChannel::Rotate, 102).unwrap();

        assert_eq!(driver.device().writes, vec![(0, 100), (1, 102)]);
    }

    #[test]
    fn out_of_range_duty_is_rejected_before_any_write() {
        let mut driver = ActuatorDriver::new(SimPwm::new());
        driver.initialize().unwrap();
        assert!(matches!(
            driver.set_signal(ActuatorChannel::Rotate, 5000),
            Err(BridgeError::DutyOutOfRange { .. })
        ));
        assert!(driver.device().writes.is_empty());
    }
}
