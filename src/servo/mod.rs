// Servo control for the pocket cube rig
//
// Provides:
// - Serial protocol to the PWM bridge board
// - Actuator driver for the rig's two logical channels
// - Motion sequencer tracking the cube's rotation stop and pacing moves

pub mod angle;
pub mod bridge;
mod driver;
mod sequencer;

pub use angle::RotationAngle;
pub use bridge::{BridgeError, PwmBridge, PwmDevice, SimPwm};
pub use driver::{ActuatorChannel, ActuatorDriver};
pub use sequencer::MotionSequencer;
