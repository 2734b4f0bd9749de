//! Outbound control actions
//!
//! One message per key event, fire-and-forget. Every message embeds the full
//! pressed-key snapshot rather than a delta, so the server can treat the
//! latest-received snapshot as authoritative and duplicates or reordering on
//! the wire are harmless.

use crate::input::LogicalKey;
use crate::{log_error, log_verbose};
use anyhow::Result;
use crossbeam_channel::Receiver;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Whether an action reports a key going down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Press,
    Release,
}

impl ActionKind {
    fn wire_name(self) -> &'static str {
        match self {
            ActionKind::Press => "key_press",
            ActionKind::Release => "key_release",
        }
    }
}

/// One outbound key action with the full snapshot taken at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAction {
    pub kind: ActionKind,
    pub key: LogicalKey,
    pub pressed_keys: Vec<LogicalKey>,
}

impl KeyAction {
    /// Encode as one newline-terminated JSON object.
    pub fn encode(&self) -> String {
        let value = serde_json::json!({
            "action": self.kind.wire_name(),
            "key": self.key,
            "pressed_keys": self.pressed_keys,
        });
        format!("{}\n", value)
    }
}

/// Client for the action port.
///
/// Writes are fire-and-forget while a background thread continuously drains
/// whatever the server sends back, so the TCP receive window never fills up
/// and a keystroke never waits a round trip.
pub struct ActionClient {
    stream: TcpStream,
    drain_running: Arc<AtomicBool>,
    drain_handle: Option<JoinHandle<()>>,
}

impl ActionClient {
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect(format!("{}:{}", host, port))?;
        stream.set_nodelay(true)?;

        let drain_running = Arc::new(AtomicBool::new(true));
        let drain_running_clone = drain_running.clone();
        let drain_stream = stream.try_clone()?;
        drain_stream.set_read_timeout(Some(std::time::Duration::from_millis(500)))?;

        let drain_handle = thread::spawn(move || {
            let mut reader = BufReader::new(drain_stream);
            let mut buf = String::new();
            while drain_running_clone.load(Ordering::SeqCst) {
                buf.clear();
                match reader.read_line(&mut buf) {
                    Ok(0) => break, // EOF
                    Ok(_) => {}     // Discard
                    Err(e) => {
                        if e.kind() == std::io::ErrorKind::TimedOut
                            || e.kind() == std::io::ErrorKind::WouldBlock
                        {
                            continue;
                        }
                        break;
                    }
                }
            }
        });

        Ok(Self {
            stream,
            drain_running,
            drain_handle: Some(drain_handle),
        })
    }

    /// Transmit one action. No acknowledgment is awaited and failures are
    /// not retried here.
    pub fn send(&mut self, action: &KeyAction) -> Result<()> {
        self.stream.write_all(action.encode().as_bytes())?;
        self.stream.flush()?;
        Ok(())
    }
}

impl Drop for ActionClient {
    fn drop(&mut self) {
        self.drain_running.store(false, Ordering::SeqCst);
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
        if let Some(handle) = self.drain_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Start the dispatcher thread that transmits queued key actions.
pub fn start_action_thread(host: String, port: u16, rx: Receiver<KeyAction>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut client = {
            let mut delay_ms = 500u64;
            loop {
                match ActionClient::connect(&host, port) {
                    Ok(c) => {
                        log_verbose!("ACTION", "Connected to {}:{}", host, port);
                        break c;
                    }
                    Err(e) => {
                        log_verbose!(
                            "ACTION",
                            "Connect to {}:{} failed: {}, retrying in {}ms...",
                            host,
                            port,
                            e,
                            delay_ms
                        );
                        thread::sleep(std::time::Duration::from_millis(delay_ms));
                        delay_ms = (delay_ms * 2).min(5000);
                    }
                }
            }
        };

        while let Ok(action) = rx.recv() {
            if let Err(e) = client.send(&action) {
                log_error!("ACTION", "Send failed: {}", e);
            }
        }
        log_verbose!("ACTION", "Thread exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::LogicalKey;

    #[test]
    fn test_encode_press_with_snapshot() {
        let action = KeyAction {
            kind: ActionKind::Press,
            key: LogicalKey::Up,
            pressed_keys: vec![LogicalKey::L1, LogicalKey::Up],
        };
        let encoded = action.encode();
        assert!(encoded.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(encoded.trim()).unwrap();
        assert_eq!(value["action"], "key_press");
        assert_eq!(value["key"], "up");
        assert_eq!(value["pressed_keys"][0], "l1");
        assert_eq!(value["pressed_keys"][1], "up");
    }

    #[test]
    fn test_encode_release_with_empty_snapshot() {
        let action = KeyAction {
            kind: ActionKind::Release,
            key: LogicalKey::Back,
            pressed_keys: vec![],
        };
        let value: serde_json::Value =
            serde_json::from_str(action.encode().trim()).unwrap();
        assert_eq!(value["action"], "key_release");
        assert_eq!(value["key"], "back");
        assert_eq!(value["pressed_keys"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_identical_snapshots_encode_identically() {
        // Last-write-wins on the server side: a duplicate must carry exactly
        // the same state as the original.
        let first = KeyAction {
            kind: ActionKind::Press,
            key: LogicalKey::Down,
            pressed_keys: vec![LogicalKey::Down],
        };
        let second = first.clone();
        assert_eq!(first.encode(), second.encode());
    }
}
