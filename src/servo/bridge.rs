// Serial protocol to the PWM bridge board.
//
// The board is a dumb serial-to-PWM bridge in front of the servo driver
// chip: it holds the last duty value written to each channel until the
// next write. Frame format: [0xA5, Op, Params..., Checksum] with the
// checksum being the inverted byte sum of everything after the header.
// Only PING gets a reply (a single 0x5A byte); duty and frequency writes
// are fire-and-forget.

use serialport::{self, SerialPort};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::debug;

/// Default serial configuration for the bridge link
pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Frame header byte
const HEADER: u8 = 0xA5;

/// Reply the board sends to a ping
const PING_REPLY: u8 = 0x5A;

/// Highest duty value the board's 12-bit duty register accepts
pub const MAX_DUTY_TICKS: u16 = 4095;

/// Bridge instruction set
#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Opcode {
    Ping = 0x01,
    SetFrequency = 0x02,
    SetPwm = 0x03,
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timeout waiting for bridge reply")]
    Timeout,

    #[error("unexpected bridge reply: 0x{0:02X}")]
    UnexpectedReply(u8),

    #[error("duty value {ticks} exceeds the {max}-tick register range")]
    DutyOutOfRange { ticks: u16, max: u16 },
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Output device the actuator driver writes to.
///
/// Implemented by the serial [`PwmBridge`] and by [`SimPwm`] for runs and
/// tests without hardware.
pub trait PwmDevice {
    /// Check that the board is reachable.
    fn ping(&mut self) -> Result<()>;

    /// Set the shared PWM frequency for all channels.
    fn set_frequency(&mut self, hz: u16) -> Result<()>;

    /// Write a duty value (ticks of the PWM period) to a channel. The
    /// board asserts the signal until the next write on that channel.
    fn set_duty(&mut self, channel: u8, ticks: u16) -> Result<()>;
}

/// Serial connection to the bridge board
pub struct PwmBridge {
    port: Box<dyn SerialPort>,
}

impl PwmBridge {
    /// Open a new connection to the bridge
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self { port })
    }

    /// Checksum over everything after the header
    fn checksum(data: &[u8]) -> u8 {
        let sum: u16 = data.iter().map(|&b| u16::from(b)).sum();
        (!sum & 0xFF) as u8
    }

    /// Build a frame with header and checksum
    fn build_frame(op: Opcode, params: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(3 + params.len());

        frame.push(HEADER);
        frame.push(op as u8);
        frame.extend_from_slice(params);

        let checksum_data = &frame[1..]; // skip header
        frame.push(Self::checksum(checksum_data));

        frame
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.port.write_all(frame)?;
        self.port.flush()?;
        Ok(())
    }
}

impl PwmDevice for PwmBridge {
    fn ping(&mut self) -> Result<()> {
        let frame = Self::build_frame(Opcode::Ping, &[]);
        self.send_frame(&frame)?;

        let mut reply = [0u8; 1];
        self.port.read_exact(&mut reply).map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                BridgeError::Timeout
            } else {
                BridgeError::Io(e)
            }
        })?;

        if reply[0] != PING_REPLY {
            return Err(BridgeError::UnexpectedReply(reply[0]));
        }
        Ok(())
    }

    fn set_frequency(&mut self, hz: u16) -> Result<()> {
        debug!("bridge: set PWM frequency to {} Hz", hz);
        let frame = Self::build_frame(Opcode::SetFrequency, &hz.to_le_bytes());
        self.send_frame(&frame)
    }

    fn set_duty(&mut self, channel: u8, ticks: u16) -> Result<()> {
        if ticks > MAX_DUTY_TICKS {
            return Err(BridgeError::DutyOutOfRange {
                ticks,
                max: MAX_DUTY_TICKS,
            });
        }

        debug!("bridge: channel {} duty {} ticks", channel, ticks);
        let params = [channel, (ticks & 0xFF) as u8, (ticks >> 8) as u8];
        let frame = Self::build_frame(Opcode::SetPwm, &params);
        self.send_frame(&frame)
    }
}

/// Records writes instead of touching hardware.
///
/// Backs the runtime's `--simulate` mode and the sequencer tests. Applies
/// the same duty range check as the real board so simulated runs catch
/// bad values too.
#[derive(Debug, Default)]
pub struct SimPwm {
    pub frequency_hz: Option<u16>,
    /// Every duty write in order, as (channel, ticks)
    pub writes: Vec<(u8, u16)>,
}

impl SimPwm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last duty value written to `channel`, if any.
    pub fn last_duty(&self, channel: u8) -> Option<u16> {
        self.writes
            .iter()
            .rev()
            .find(|(ch, _)| *ch == channel)
            .map(|&(_, ticks)| ticks)
    }
}

impl PwmDevice for SimPwm {
    fn ping(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_frequency(&mut self, hz: u16) -> Result<()> {
        debug!("sim: set PWM frequency to {} Hz", hz);
        self.frequency_hz = Some(hz);
        Ok(())
    }

    fn set_duty(&mut self, channel: u8, ticks: u16) -> Result<()> {
        if ticks > MAX_DUTY_TICKS {
            return Err(BridgeError::DutyOutOfRange {
                ticks,
                max: MAX_DUTY_TICKS,
            });
        }

        debug!("sim: channel {} duty {} ticks", channel, ticks);
        self.writes.push((channel, ticks));
        Ok(())
    }
}
