// Blocking command loop: one serial byte in, at most one physical move out.
//
// There is no buffering beyond the OS serial buffer and no concurrency:
// a move blocks the loop for its whole settle time, which is exactly the
// pacing the mechanism needs. Bytes arriving mid-move simply wait in the
// OS buffer until the move returns.

use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info, warn};

use crate::config::Calibration;
use crate::messages::{Command, REPLY_OK};
use crate::servo::{ActuatorDriver, BridgeError, MotionSequencer, PwmBridge, PwmDevice, SimPwm};

/// Serial read chunk; the host never sends more than a short move string
/// at once.
const READ_CHUNK: usize = 32;

/// Poll timeout on the command port between read attempts.
const CMD_READ_TIMEOUT: Duration = Duration::from_millis(100);

pub struct RunOptions {
    /// Serial port the command host is connected to
    pub cmd_port: String,
    /// Serial port of the PWM bridge board (unused with `simulate`)
    pub pwm_port: Option<String>,
    /// Command link baud rate
    pub baud: u32,
    /// Optional JSON calibration file
    pub calibration: Option<PathBuf>,
    /// Log servo writes instead of driving hardware
    pub simulate: bool,
}

pub struct Runtime<D: PwmDevice> {
    sequencer: MotionSequencer<D>,
    moves: u64,
}

impl<D: PwmDevice> Runtime<D> {
    pub fn new(sequencer: MotionSequencer<D>) -> Self {
        Self { sequencer, moves: 0 }
    }

    /// Home the rig. The ready reply goes out once this returns.
    pub fn start(&mut self) -> Result<(), BridgeError> {
        self.sequencer.initialize_position()
    }

    /// Execute the operation behind one command byte, blocking until the
    /// move has settled. Returns the reply to write back, if the byte asks
    /// for one.
    pub fn handle_byte(&mut self, byte: u8) -> Result<Option<&'static str>, BridgeError> {
        let Some(cmd) = Command::from_byte(byte) else {
            if !Command::is_filler(byte) {
                warn!("ignoring unknown command byte 0x{:02X}", byte);
            }
            return Ok(None);
        };

        debug!("command {:?}", cmd);
        match cmd {
            Command::RotateLeft => self.sequencer.rotate_left()?,
            Command::RotateRight => self.sequencer.rotate_right()?,
            Command::FlipCube => self.sequencer.flip_cube()?,
            Command::Home => self.sequencer.initialize_position()?,
            Command::Ack => return Ok(Some(REPLY_OK)),
        }
        self.moves += 1;
        Ok(None)
    }

    pub fn sequencer(&self) -> &MotionSequencer<D> {
        &self.sequencer
    }

    /// Physical moves executed since startup.
    pub fn moves(&self) -> u64 {
        self.moves
    }
}

pub fn run(opts: RunOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cal = match &opts.calibration {
        Some(path) => {
            info!("loading calibration from {}", path.display());
            Calibration::load(path)?
        }
        None => Calibration::default(),
    };

    info!(
        "opening command port {} at {} baud",
        opts.cmd_port, opts.baud
    );
    let cmd_port = serialport::new(opts.cmd_port.as_str(), opts.baud)
        .timeout(CMD_READ_TIMEOUT)
        .open()?;

    if opts.simulate {
        info!("simulation mode: servo writes are logged, not sent");
        let mut driver = ActuatorDriver::new(SimPwm::new());
        driver.initialize()?;
        serve(cmd_port, Runtime::new(MotionSequencer::new(driver, cal)))
    } else {
        let pwm_port = opts
            .pwm_port
            .as_deref()
            .ok_or("either --pwm-port or --simulate is required")?;
        info!("opening PWM bridge on {}", pwm_port);
        let mut driver = ActuatorDriver::new(PwmBridge::open(pwm_port)?);
        driver.initialize()?;
        serve(cmd_port, Runtime::new(MotionSequencer::new(driver, cal)))
    }
}

fn serve<D: PwmDevice>(
    mut port: Box<dyn SerialPort>,
    mut runtime: Runtime<D>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    runtime.start()?;
    port.write_all(REPLY_OK.as_bytes())?;
    port.flush()?;
    info!("rig homed, ready for commands");

    let mut buf = [0u8; READ_CHUNK];
    loop {
        match port.read(&mut buf) {
            Ok(0) => continue,
            Ok(n) => {
                for &byte in &buf[..n] {
                    if let Some(reply) = runtime.handle_byte(byte)? {
                        port.write_all(reply.as_bytes())?;
                        port.flush()?;
                        debug!("acked after {} moves", runtime.moves());
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::Interrupted => {
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servo::RotationAngle;

    fn runtime() -> Runtime<SimPwm> {
        let mut driver = ActuatorDriver::new(SimPwm::new());
        driver.initialize().unwrap();
        let cal = Calibration {
            turn_settle_ms: 0,
            rotate_settle_ms: 0,
            ..Calibration::default()
        };
        Runtime::new(MotionSequencer::new(driver, cal))
    }

    #[test]
    fn one_byte_one_move() {
        let mut rt = runtime();
        assert_eq!(rt.handle_byte(b'R').unwrap(), None);
        assert_eq!(rt.sequencer().current_angle(), RotationAngle::Deg90);
        assert_eq!(rt.moves(), 1);
    }

    #[test]
    fn annotated_move_string_executes_only_the_moves() {
        let mut rt = runtime();
        for &byte in b"(TLTTRT) R>".iter() {
            let reply = rt.handle_byte(byte).unwrap();
            if byte == b'>' {
                assert_eq!(reply, Some("ok\n"));
            } else {
                assert_eq!(reply, None);
            }
        }
        // Rotations: L takes 0 -> 270, first R back to 0, trailing R to 90;
        // the four flips leave the angle alone
        assert_eq!(rt.sequencer().current_angle(), RotationAngle::Deg90);
        assert_eq!(rt.moves(), 7);
    }

    #[test]
    fn ack_requests_reply_without_motion() {
        let mut rt = runtime();
        let writes_before = rt.sequencer().device().writes.len();
        assert_eq!(rt.handle_byte(b'>').unwrap(), Some("ok\n"));
        assert_eq!(rt.sequencer().device().writes.len(), writes_before);
        assert_eq!(rt.moves(), 0);
    }

    #[test]
    fn unknown_bytes_are_dropped() {
        let mut rt = runtime();
        for &byte in b"xyz? \r\n()".iter() {
            assert_eq!(rt.handle_byte(byte).unwrap(), None);
        }
        assert_eq!(rt.sequencer().current_angle(), RotationAngle::Deg0);
        assert_eq!(rt.moves(), 0);
    }

    #[test]
    fn home_byte_rehomes_the_rig() {
        let mut rt = runtime();
        rt.handle_byte(b'R').unwrap();
        rt.handle_byte(b'R').unwrap();
        assert_eq!(rt.sequencer().current_angle(), RotationAngle::Deg180);

        rt.handle_byte(b'I').unwrap();
        assert_eq!(rt.sequencer().current_angle(), RotationAngle::Deg0);
    }
}
