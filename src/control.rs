//! Remote control via Unix socket
//!
//! Accepts line-based text commands over a Unix socket and forwards them to
//! the main loop, where they act like the matching keyboard shortcuts.

use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::error::MarbleError;

pub const DEFAULT_SOCKET_PATH: &str = "/tmp/marble.sock";

/// Commands accepted from the socket and from MQTT
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Advance the palette step, same as clicking the sphere
    Step,
    /// Return to palette step 0
    Reset,
    ToggleFps,
    Save,
    Quit,
    /// Log the march trace under the pointer
    Probe,
    /// Change one tunable; validated by the receiver
    Set { name: String, value: f32 },
}

/// Parse one text command. Case-insensitive; unknown input yields `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim().to_lowercase();
    let mut words = line.split_whitespace();
    let head = words.next()?;
    let command = match head {
        "step" | "click" | "next" => Command::Step,
        "reset" => Command::Reset,
        "f" | "fps" => Command::ToggleFps,
        "s" | "save" => Command::Save,
        "q" | "quit" | "exit" => Command::Quit,
        "probe" => Command::Probe,
        "set" => {
            let name = words.next()?.to_string();
            let value = words.next()?.parse().ok()?;
            Command::Set { name, value }
        },
        _ => return None,
    };
    // Trailing junk makes the whole line invalid
    if words.next().is_some() {
        return None;
    }
    Some(command)
}

/// Controller that listens for commands on a Unix socket
pub struct Controller {
    receiver: Receiver<Command>,
    path: PathBuf,
    _listener_thread: thread::JoinHandle<()>,
}

impl Controller {
    /// Bind the socket at `path`, replacing any stale socket file
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MarbleError> {
        let path = path.as_ref().to_path_buf();
        let _ = std::fs::remove_file(&path);

        let listener = UnixListener::bind(&path).map_err(|e| {
            MarbleError::Socket(format!("failed to bind {}: {e}", path.display()))
        })?;

        // Non-blocking so the accept loop can notice shutdown
        listener
            .set_nonblocking(true)
            .map_err(|e| MarbleError::Socket(format!("failed to set non-blocking: {e}")))?;

        let (sender, receiver) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::listener_loop(&listener, &sender);
        });

        log::info!("remote control listening on {}", path.display());

        Ok(Self {
            receiver,
            path,
            _listener_thread: handle,
        })
    }

    fn listener_loop(listener: &UnixListener, sender: &Sender<Command>) {
        loop {
            match listener.accept() {
                Ok((stream, _)) => {
                    log::debug!("remote control client connected");
                    let sender = sender.clone();
                    thread::spawn(move || {
                        Self::handle_client(stream, &sender);
                    });
                },
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                },
                Err(e) => {
                    log::warn!("remote control socket closed: {e}");
                    break;
                },
            }
        }
    }

    fn handle_client(stream: UnixStream, sender: &Sender<Command>) {
        let reader = BufReader::new(stream);
        for line in reader.lines().map_while(Result::ok) {
            match parse_command(&line) {
                Some(cmd) => {
                    if sender.send(cmd).is_err() {
                        break;
                    }
                },
                None => log::warn!("ignoring unknown command {:?}", line.trim()),
            }
        }
    }

    /// Get any pending commands (non-blocking)
    pub fn poll(&self) -> Vec<Command> {
        self.receiver.try_iter().collect()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("step"), Some(Command::Step));
        assert_eq!(parse_command("  CLICK \n"), Some(Command::Step));
        assert_eq!(parse_command("reset"), Some(Command::Reset));
        assert_eq!(parse_command("fps"), Some(Command::ToggleFps));
        assert_eq!(parse_command("save"), Some(Command::Save));
        assert_eq!(parse_command("exit"), Some(Command::Quit));
        assert_eq!(parse_command("probe"), Some(Command::Probe));
    }

    #[test]
    fn test_parse_set_command() {
        assert_eq!(
            parse_command("set smoothing 0.35"),
            Some(Command::Set {
                name: "smoothing".into(),
                value: 0.35
            })
        );
        assert_eq!(
            parse_command("SET Iterations 64"),
            Some(Command::Set {
                name: "iterations".into(),
                value: 64.0
            })
        );
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("jump"), None);
        assert_eq!(parse_command("set smoothing"), None);
        assert_eq!(parse_command("set smoothing lots"), None);
        assert_eq!(parse_command("step now"), None);
    }

    #[test]
    fn test_controller_receives_socket_lines() {
        use std::io::Write;

        let path = std::env::temp_dir().join(format!("marble-test-{}.sock", std::process::id()));
        let controller = Controller::new(&path).expect("bind");
        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            stream.write_all(b"step\nbogus\nset depth 0.5\n").expect("write");
        }

        let mut received = Vec::new();
        for _ in 0..100 {
            received.extend(controller.poll());
            if received.len() >= 2 {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(
            received,
            vec![
                Command::Step,
                Command::Set {
                    name: "depth".into(),
                    value: 0.5
                }
            ]
        );
        drop(controller);
        assert!(!path.exists());
    }
}
