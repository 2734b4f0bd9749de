//! Streaming event subscriptions
//!
//! Each subscription is a long-lived TCP connection scoped to one event
//! filter. Messages are length-delimited and delivered in arrival order.
//! On any failure the subscription is re-established after a fixed delay,
//! indefinitely, until cancelled.

use crate::log_verbose;
use crossbeam_channel::Sender;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Fixed delay before every reconnect attempt. No backoff, no ceiling.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Largest accepted message payload. Anything bigger means a corrupt
/// length prefix, so the connection is dropped and re-established.
const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Which inbound event stream a subscription is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFilter {
    FrameUpdates,
    AudioClips,
}

impl StreamFilter {
    fn handshake(self) -> &'static str {
        match self {
            StreamFilter::FrameUpdates => "subscribe=frames\n",
            StreamFilter::AudioClips => "subscribe=audio\n",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            StreamFilter::FrameUpdates => "STREAM/FRAMES",
            StreamFilter::AudioClips => "STREAM/AUDIO",
        }
    }
}

/// Handle owning one subscription thread.
///
/// `cancel()` closes the live connection at the next read timeout and also
/// retires a pending reconnect: the delay is slept in small slices that
/// re-check the flag, so a stale reconnect can never fire after cancellation.
pub struct SubscriptionHandle {
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Open a perpetual subscription for `filter`, delivering every message
/// payload to `tx` in arrival order.
pub fn subscribe(
    host: String,
    port: u16,
    filter: StreamFilter,
    tx: Sender<Vec<u8>>,
) -> SubscriptionHandle {
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();

    let handle = thread::spawn(move || {
        while !cancelled_clone.load(Ordering::SeqCst) {
            log_verbose!(filter.tag(), "Connecting {}:{}...", host, port);
            match TcpStream::connect(format!("{}:{}", host, port)) {
                Ok(mut stream) => {
                    let _ = stream.set_nodelay(true);
                    let _ = stream.set_read_timeout(Some(Duration::from_millis(500)));

                    match stream.write_all(filter.handshake().as_bytes()) {
                        Ok(()) => {
                            let _ = stream.flush();
                            log_verbose!(filter.tag(), "Streaming");
                            let _ = receive_messages(&mut stream, filter, &tx, &cancelled_clone);
                        }
                        Err(e) => {
                            log_verbose!(filter.tag(), "Handshake failed: {}", e);
                        }
                    }
                }
                Err(e) => log_verbose!(filter.tag(), "Connect failed: {}", e),
            }

            if cancelled_clone.load(Ordering::SeqCst) {
                break;
            }

            // Fixed reconnect delay, slept in slices so cancellation can
            // retire the pending attempt.
            log_verbose!(
                filter.tag(),
                "Reconnecting in {}ms...",
                RECONNECT_DELAY.as_millis()
            );
            let slice = Duration::from_millis(100);
            let mut remaining = RECONNECT_DELAY;
            while remaining > Duration::ZERO {
                if cancelled_clone.load(Ordering::SeqCst) {
                    return;
                }
                let step = remaining.min(slice);
                thread::sleep(step);
                remaining -= step;
            }
        }
        log_verbose!(filter.tag(), "Subscription stopped");
    });

    SubscriptionHandle {
        cancelled,
        handle: Some(handle),
    }
}

/// Read length-delimited messages until the connection dies or the
/// subscription is cancelled. Messages are never buffered across
/// connections; whatever is in flight when this returns is lost.
fn receive_messages(
    stream: &mut TcpStream,
    filter: StreamFilter,
    tx: &Sender<Vec<u8>>,
    cancelled: &Arc<AtomicBool>,
) -> Result<(), ()> {
    let mut len_buf = [0u8; 4];
    let mut received = 0u64;

    while !cancelled.load(Ordering::SeqCst) {
        match stream.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                continue;
            }
            Err(e) => {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    log_verbose!(filter.tag(), "Server closed connection");
                } else {
                    log_verbose!(filter.tag(), "Read failed: {}", e);
                }
                return Err(());
            }
        }

        let size = u32::from_be_bytes(len_buf) as usize;
        if size > MAX_MESSAGE_SIZE {
            log_verbose!(filter.tag(), "Invalid message size: {} bytes", size);
            return Err(());
        }

        let mut payload = vec![0u8; size];
        if let Err(e) = read_fully(stream, &mut payload, cancelled) {
            log_verbose!(filter.tag(), "Failed to read payload: {}", e);
            return Err(());
        }

        received += 1;
        if received % 100 == 0 {
            log_verbose!(filter.tag(), "Message #{}: {} bytes", received, size);
        }

        match tx.try_send(payload) {
            Ok(()) => {}
            Err(crossbeam_channel::TrySendError::Full(_)) => {
                log_verbose!(filter.tag(), "Channel full, dropping message");
            }
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                log_verbose!(filter.tag(), "Channel disconnected");
                return Err(());
            }
        }
    }
    Ok(())
}

/// read_exact that rides out read timeouts so cancellation stays responsive
/// even mid-payload.
fn read_fully(
    stream: &mut TcpStream,
    buf: &mut [u8],
    cancelled: &Arc<AtomicBool>,
) -> std::io::Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        if cancelled.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "subscription cancelled",
            ));
        }
        match stream.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed mid-message",
                ))
            }
            Ok(n) => filled += n,
            Err(e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                continue;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::time::Instant;

    fn read_handshake(conn: &mut std::net::TcpStream) -> String {
        let mut buf = [0u8; 64];
        let n = conn.read(&mut buf).unwrap();
        String::from_utf8_lossy(&buf[..n]).into_owned()
    }

    fn write_message(conn: &mut std::net::TcpStream, payload: &[u8]) {
        conn.write_all(&(payload.len() as u32).to_be_bytes()).unwrap();
        conn.write_all(payload).unwrap();
        conn.flush().unwrap();
    }

    #[test]
    fn test_delivers_messages_in_order() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = bounded(16);

        let sub = subscribe("127.0.0.1".into(), port, StreamFilter::FrameUpdates, tx);

        let (mut conn, _) = listener.accept().unwrap();
        assert_eq!(read_handshake(&mut conn), "subscribe=frames\n");

        write_message(&mut conn, b"first");
        write_message(&mut conn, b"second");

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), b"first");
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), b"second");

        sub.cancel();
    }

    #[test]
    fn test_audio_filter_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, _rx) = bounded(16);

        let sub = subscribe("127.0.0.1".into(), port, StreamFilter::AudioClips, tx);

        let (mut conn, _) = listener.accept().unwrap();
        assert_eq!(read_handshake(&mut conn), "subscribe=audio\n");

        sub.cancel();
    }

    #[test]
    fn test_reconnects_after_fixed_delay() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, _rx) = bounded(16);

        let sub = subscribe("127.0.0.1".into(), port, StreamFilter::FrameUpdates, tx);

        let (mut conn, _) = listener.accept().unwrap();
        read_handshake(&mut conn);
        let dropped_at = Instant::now();
        drop(conn);

        // Exactly one resubscribe attempt, at roughly t+1000ms.
        let (mut conn2, _) = listener.accept().unwrap();
        let elapsed = dropped_at.elapsed();
        assert!(
            elapsed >= Duration::from_millis(900),
            "reconnected too early: {:?}",
            elapsed
        );
        assert!(
            elapsed < Duration::from_secs(5),
            "reconnected too late: {:?}",
            elapsed
        );
        read_handshake(&mut conn2);

        sub.cancel();
    }

    #[test]
    fn test_cancel_suppresses_pending_reconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, _rx) = bounded(16);

        let sub = subscribe("127.0.0.1".into(), port, StreamFilter::FrameUpdates, tx);

        let (mut conn, _) = listener.accept().unwrap();
        read_handshake(&mut conn);
        drop(conn);

        // Cancel inside the reconnect window; the scheduled attempt must
        // never fire.
        thread::sleep(Duration::from_millis(200));
        sub.cancel();

        listener.set_nonblocking(true).unwrap();
        let deadline = Instant::now() + Duration::from_millis(2500);
        while Instant::now() < deadline {
            match listener.accept() {
                Ok(_) => panic!("reconnect fired after cancellation"),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                }
                Err(e) => panic!("accept failed: {}", e),
            }
        }
    }

    #[test]
    fn test_oversized_length_prefix_drops_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = bounded(16);

        let sub = subscribe("127.0.0.1".into(), port, StreamFilter::FrameUpdates, tx);

        let (mut conn, _) = listener.accept().unwrap();
        read_handshake(&mut conn);
        conn.write_all(&u32::MAX.to_be_bytes()).unwrap();
        conn.flush().unwrap();

        // Client abandons the connection and comes back after the delay.
        let (mut conn2, _) = listener.accept().unwrap();
        read_handshake(&mut conn2);
        write_message(&mut conn2, b"recovered");
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            b"recovered"
        );

        sub.cancel();
    }
}
