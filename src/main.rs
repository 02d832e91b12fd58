use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pocketcube_runtime::config::CMD_BAUDRATE;
use pocketcube_runtime::runtime::{self, RunOptions};

/// Serial runtime for the pocket cube actuation rig.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Serial port the command host is connected to
    #[arg(long)]
    cmd_port: String,

    /// Serial port of the PWM bridge board
    #[arg(long, required_unless_present = "simulate")]
    pwm_port: Option<String>,

    /// Command link baud rate
    #[arg(long, default_value_t = CMD_BAUDRATE)]
    baud: u32,

    /// JSON calibration file overriding the built-in rig values
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Log servo writes instead of driving hardware
    #[arg(long)]
    simulate: bool,
}

fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();
    let opts = RunOptions {
        cmd_port: args.cmd_port,
        pwm_port: args.pwm_port,
        baud: args.baud,
        calibration: args.calibration,
        simulate: args.simulate,
    };

    if let Err(e) = runtime::run(opts) {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
