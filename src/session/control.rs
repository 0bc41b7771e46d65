//! Interactive session commands.
//!
//! Commands arrive as single-character lines: `q` quits, `s` pauses (or
//! steps back on finite sources), `p` snapshots, `t` toggles the overlay.
//! Parsing is case-insensitive and anything else advances without acting.
//!
//! `CommandSource` decouples the controller from stdin so tests can drive a
//! session from a scripted command list.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Snapshot,
    Pause,
    ToggleOverlay,
}

impl Command {
    /// First character of an input line, case-insensitive.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().chars().next()?.to_ascii_lowercase() {
            'q' => Some(Command::Quit),
            's' => Some(Command::Pause),
            'p' => Some(Command::Snapshot),
            't' => Some(Command::ToggleOverlay),
            _ => None,
        }
    }
}

pub trait CommandSource {
    /// Non-blocking-ish poll used between frames of continuous sources.
    fn poll(&mut self, timeout: Duration) -> Option<Command>;

    /// Block until the next command. Returns `None` when the input channel
    /// is closed, which the controller treats as a quit.
    fn wait(&mut self) -> Option<Command>;
}

/// Commands typed on stdin, read on a background thread so the frame loop
/// never blocks on a read.
pub struct StdinCommands {
    receiver: Receiver<Command>,
}

impl StdinCommands {
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if let Some(command) = Command::parse(&line) {
                    if sender.send(command).is_err() {
                        break;
                    }
                }
            }
        });
        Self { receiver }
    }
}

impl CommandSource for StdinCommands {
    fn poll(&mut self, timeout: Duration) -> Option<Command> {
        match self.receiver.recv_timeout(timeout) {
            Ok(command) => Some(command),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Command::Quit),
        }
    }

    fn wait(&mut self) -> Option<Command> {
        self.receiver.recv().ok()
    }
}

/// Fixed command sequence for tests; exhaustion reads as a closed channel.
pub struct ScriptedCommands {
    commands: std::collections::VecDeque<Option<Command>>,
}

impl ScriptedCommands {
    /// `None` entries mean "no command pending this frame".
    pub fn new(commands: Vec<Option<Command>>) -> Self {
        Self {
            commands: commands.into(),
        }
    }
}

impl CommandSource for ScriptedCommands {
    fn poll(&mut self, _timeout: Duration) -> Option<Command> {
        self.commands.pop_front().flatten()
    }

    fn wait(&mut self) -> Option<Command> {
        loop {
            match self.commands.pop_front() {
                Some(Some(command)) => return Some(command),
                Some(None) => continue,
                None => return None,
            }
        }
    }
}
