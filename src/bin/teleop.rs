// Keyboard teleop: L/R rotate, T flip, I home, A ack round-trip, Q quit
//
// Connects to the host end of the rig's command link and sends one
// command character per keypress.
//
// Usage: cargo run --bin teleop -- <cmd-port>

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;
use tracing::info;

use pocketcube_runtime::config::CMD_BAUDRATE;

// The rig blocks while a move settles; a full re-home takes a few seconds
const REPLY_TIMEOUT: Duration = Duration::from_secs(60);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let port_name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    info!("Opening command port {}...", port_name);
    let mut port = serialport::new(port_name.as_str(), CMD_BAUDRATE)
        .timeout(REPLY_TIMEOUT)
        .open()?;

    info!("Waiting for the rig to home...");
    let ready = read_reply(&mut port)?;
    info!("Rig ready: {}", ready);

    info!("Controls: L/R=rotate, T=flip, I=home, A=ack round-trip, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&mut port);
    disable_raw_mode()?;

    result
}

fn run_teleop(port: &mut Box<dyn SerialPort>) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(KeyEvent { code, kind, .. }) = event::read()? else {
            continue;
        };
        if kind != KeyEventKind::Press && kind != KeyEventKind::Repeat {
            continue;
        }

        match code {
            KeyCode::Char('l') => send(port, b'L')?,
            KeyCode::Char('r') => send(port, b'R')?,
            KeyCode::Char('t') => send(port, b'T')?,
            KeyCode::Char('i') => send(port, b'I')?,

            // Ack round-trip: confirms all queued moves have settled
            KeyCode::Char('a') => {
                send(port, b'>')?;
                let reply = read_reply(port)?;
                info!("Rig replied: {}", reply);
            }

            KeyCode::Char('q') | KeyCode::Esc => break,

            _ => {}
        }
    }

    Ok(())
}

fn send(port: &mut Box<dyn SerialPort>, byte: u8) -> Result<(), Box<dyn std::error::Error>> {
    info!("Sending '{}'", byte as char);
    port.write_all(&[byte])?;
    port.flush()?;
    Ok(())
}

/// Read one reply line from the rig, without the line ending.
fn read_reply(port: &mut Box<dyn SerialPort>) -> Result<String, Box<dyn std::error::Error>> {
    let mut line = String::new();
    let mut byte = [0u8; 1];
    loop {
        port.read_exact(&mut byte)?;
        match byte[0] {
            b'\n' => break,
            b'\r' => {}
            b => line.push(b as char),
        }
    }
    Ok(line)
}
