// Host-side runtime for the pocket cube actuation rig.
//
// Receives single-character move commands over a serial link and executes
// them on the rig's two servos through a PWM bridge board. Every command
// blocks until the mechanical move has settled.

pub mod config;
pub mod messages;
pub mod runtime;
pub mod servo;
