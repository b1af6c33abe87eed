//! Stdin control plane: one line per command while a run is in flight.

use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use courier_logging::courier_warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    Stop,
}

pub fn parse_command(line: &str) -> Option<ControlCommand> {
    match line.trim().to_lowercase().as_str() {
        "pause" | "p" => Some(ControlCommand::Pause),
        "resume" | "continue" | "r" => Some(ControlCommand::Resume),
        "stop" | "quit" | "q" => Some(ControlCommand::Stop),
        _ => None,
    }
}

/// Read commands from stdin on a background thread. The thread ends at EOF,
/// on `stop`, or when the receiving side is gone.
pub fn spawn_stdin_reader() -> mpsc::Receiver<ControlCommand> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            if line.trim().is_empty() {
                continue;
            }
            let command = match parse_command(&line) {
                Some(command) => command,
                None => {
                    courier_warn!("unknown command {line:?}; use pause / resume / stop");
                    continue;
                }
            };
            let stop = command == ControlCommand::Stop;
            if tx.send(command).is_err() || stop {
                break;
            }
        }
    });
    rx
}
