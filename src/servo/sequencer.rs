// Motion sequencer: tracks the cube's rotation stop and paces servo moves.
//
// Every operation blocks for its full settle wait before returning; two
// overlapping moves would crash the mechanism, so there is deliberately no
// async machinery and no way to cancel a wait. The rig has no position
// feedback: `current_angle` is only correct as long as nothing external
// moves the servos between commands.

use std::thread;

use tracing::{debug, info};

use super::angle::{RotationAngle, rotation_settle};
use super::bridge::{PwmDevice, Result};
use super::driver::{ActuatorChannel, ActuatorDriver};
use crate::config::Calibration;

pub struct MotionSequencer<D: PwmDevice> {
    driver: ActuatorDriver<D>,
    cal: Calibration,
    current_angle: RotationAngle,
}

impl<D: PwmDevice> MotionSequencer<D> {
    /// The driver must already be initialized. `current_angle` starts at 0°
    /// and matches the physical rig once
    /// [`initialize_position`](Self::initialize_position) has run.
    pub fn new(driver: ActuatorDriver<D>, cal: Calibration) -> Self {
        Self {
            driver,
            cal,
            current_angle: RotationAngle::Deg0,
        }
    }

    pub fn current_angle(&self) -> RotationAngle {
        self.current_angle
    }

    /// Drive both servos to their home positions: turn servo holding the
    /// cube, rotation servo at 0°, with an extra settle period to absorb
    /// homing overshoot. Must run once per power-on before any other
    /// operation.
    pub fn initialize_position(&mut self) -> Result<()> {
        info!("homing: turn servo to hold, rotation servo to 0°");

        self.driver
            .set_signal(ActuatorChannel::Turn, self.cal.turn_min_ticks)?;
        thread::sleep(self.cal.turn_settle());

        self.move_to(RotationAngle::Deg0)?;
        thread::sleep(self.cal.rotate_settle() * 2);

        Ok(())
    }

    /// Rotate the lower layer to a multiple of 90°.
    ///
    /// Any other value is dropped without moving the servo: an invalid
    /// request must never move the actuator.
    pub fn rotate_to(&mut self, degrees: i32) -> Result<()> {
        match RotationAngle::from_degrees(degrees) {
            Some(target) => self.move_to(target),
            None => {
                debug!("dropping rotation request to {}°", degrees);
                Ok(())
            }
        }
    }

    /// Rotate 90° to the left; from 0° this is the full reverse sweep to
    /// 270° (three steps of travel, not one).
    pub fn rotate_left(&mut self) -> Result<()> {
        self.move_to(self.current_angle.left())
    }

    /// Rotate 90° to the right; from 270° this sweeps back to 0°.
    pub fn rotate_right(&mut self) -> Result<()> {
        self.move_to(self.current_angle.right())
    }

    /// Tip the cube onto its side: push it past the tipping point, then
    /// pull the crossbar back to the holding position. Does not touch the
    /// tracked rotation angle.
    pub fn flip_cube(&mut self) -> Result<()> {
        self.driver
            .set_signal(ActuatorChannel::Turn, self.cal.turn_max_ticks)?;
        thread::sleep(self.cal.turn_settle());

        self.driver
            .set_signal(ActuatorChannel::Turn, self.cal.turn_min_ticks)?;
        thread::sleep(self.cal.turn_settle());

        Ok(())
    }

    /// Write the target stop and wait one settle period per 90° of travel.
    /// A same-stop move rewrites the duty value and waits zero.
    fn move_to(&mut self, target: RotationAngle) -> Result<()> {
        let steps = self.current_angle.steps_to(target);

        self.driver
            .set_signal(ActuatorChannel::Rotate, self.cal.rotate_ticks[target.index()])?;
        thread::sleep(rotation_settle(steps, self.cal.rotate_settle()));

        self.current_angle = target;
        debug!("rotation servo at {}° ({} steps)", target.degrees(), steps);
        Ok(())
    }

    pub fn device(&self) -> &D {
        self.driver.device()
    }
}
