//! Frame socket accept loop
//!
//! One dedicated thread accepts producer connections on the loopback
//! frame port. The server always serves the most recently connected
//! producer: each accept shuts down the previous connection, which
//! unblocks the old receiver's read and lets its thread exit on its own.

use std::net::{Ipv4Addr, Shutdown, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use framesink_core::{Error, FrameSlot, Result, StatsWindow};

use crate::receiver::FrameReceiver;

/// Delay before retrying after a transient accept error.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

type ActiveConnection = Arc<Mutex<Option<TcpStream>>>;

/// Owns the listening socket and the accept thread.
pub struct FrameListener {
    local_port: u16,
    running: Arc<AtomicBool>,
    active: ActiveConnection,
    accept_thread: Option<JoinHandle<()>>,
}

impl FrameListener {
    /// Bind the frame port and start accepting. A bind failure is returned
    /// to the caller and no thread is spawned.
    ///
    /// Port 0 binds an OS-assigned port, reported by [`local_port`].
    ///
    /// [`local_port`]: FrameListener::local_port
    pub fn start(
        port: u16,
        slot: Arc<FrameSlot>,
        stats: Arc<StatsWindow>,
        snapshot_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
            .map_err(|source| Error::Bind { port, source })?;
        let local_port = listener.local_addr()?.port();
        info!("Frame socket listening on 127.0.0.1:{}", local_port);

        let running = Arc::new(AtomicBool::new(true));
        let active: ActiveConnection = Arc::new(Mutex::new(None));

        let accept_thread = {
            let running = running.clone();
            let active = active.clone();
            thread::Builder::new()
                .name("framesink-accept".into())
                .spawn(move || accept_loop(listener, running, active, slot, stats, snapshot_dir))
                .map_err(Error::Io)?
        };

        Ok(Self {
            local_port,
            running,
            active,
            accept_thread: Some(accept_thread),
        })
    }

    /// Port the listener is actually bound to.
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Stop accepting and terminate the active connection. Idempotent;
    /// callable from any thread. Blocks until the accept thread has
    /// exited.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        // The accept call is blocking; a throwaway loopback connection
        // forces it to return so the loop can observe the stop request.
        let _ = TcpStream::connect((Ipv4Addr::LOCALHOST, self.local_port));

        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
        // The active connection is terminated only once the accept thread
        // has exited: an accept racing the stop could otherwise store a
        // fresh stream right after an earlier shutdown and leave its
        // receiver running with a socket nothing would ever close.
        shutdown_active(&self.active);
        debug!("Frame listener stopped");
    }
}

impl Drop for FrameListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(
    listener: TcpListener,
    running: Arc<AtomicBool>,
    active: ActiveConnection,
    slot: Arc<FrameSlot>,
    stats: Arc<StatsWindow>,
    snapshot_dir: Option<PathBuf>,
) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                if !running.load(Ordering::SeqCst) {
                    // The wake-up connection made by stop()
                    break;
                }
                supersede(&active, &stream);

                let receiver =
                    FrameReceiver::new(slot.clone(), stats.clone(), snapshot_dir.clone());
                let spawned = thread::Builder::new()
                    .name("framesink-recv".into())
                    .spawn(move || receiver.run(stream));
                if let Err(e) = spawned {
                    warn!("Failed to spawn receiver thread: {}", e);
                }
            }
            Err(e) => {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                // Transient errors must never kill the loop
                warn!("Accept failed: {}; retrying", e);
                thread::sleep(ACCEPT_RETRY_DELAY);
            }
        }
    }
    debug!("Accept loop exited");
}

/// Shut down the previous connection (if any) and retain a handle to the
/// new one so stop()/the next accept can terminate it.
fn supersede(active: &ActiveConnection, stream: &TcpStream) {
    let mut guard = active.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(prev) = guard.take() {
        debug!("New producer supersedes the previous connection");
        let _ = prev.shutdown(Shutdown::Both);
    }
    match stream.try_clone() {
        Ok(clone) => *guard = Some(clone),
        Err(e) => warn!("Could not retain connection handle: {}", e),
    }
}

fn shutdown_active(active: &ActiveConnection) {
    let mut guard = active.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(conn) = guard.take() {
        let _ = conn.shutdown(Shutdown::Both);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framesink_core::{Frame, FrameHeader};
    use std::io::Write;
    use std::time::Instant;

    fn start_listener(slot: &Arc<FrameSlot>) -> FrameListener {
        FrameListener::start(
            0,
            slot.clone(),
            Arc::new(StatsWindow::new()),
            None,
        )
        .unwrap()
    }

    fn connect(port: u16) -> TcpStream {
        TcpStream::connect((Ipv4Addr::LOCALHOST, port)).unwrap()
    }

    fn send_frame(stream: &mut TcpStream, width: u32, height: u32, fill: u8) {
        let header = FrameHeader { width, height };
        stream.write_all(&header.encode()).unwrap();
        stream
            .write_all(&vec![fill; header.payload_len()])
            .unwrap();
        stream.flush().unwrap();
    }

    fn wait_for_frame<F>(slot: &FrameSlot, mut accept: F) -> Frame
    where
        F: FnMut(&Frame) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(frame) = slot.take_and_clear() {
                if accept(&frame) {
                    return frame;
                }
            }
            assert!(Instant::now() < deadline, "timed out waiting for frame");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_round_trip() {
        let slot = Arc::new(FrameSlot::new());
        let listener = start_listener(&slot);
        let mut producer = connect(listener.local_port());

        let header = FrameHeader {
            width: 3,
            height: 2,
        };
        let payload: Vec<u8> = (0..header.payload_len() as u32).map(|i| i as u8).collect();
        producer.write_all(&header.encode()).unwrap();
        producer.write_all(&payload).unwrap();
        producer.flush().unwrap();

        let frame = wait_for_frame(&slot, |_| true);
        assert_eq!(frame.width, 3);
        assert_eq!(frame.height, 2);
        assert_eq!(frame.pixels(), payload.as_slice());
    }

    #[test]
    fn test_bounds_rejection_resyncs() {
        let slot = Arc::new(FrameSlot::new());
        let listener = start_listener(&slot);
        let mut producer = connect(listener.local_port());

        // Malformed header: no payload follows, parsing must resume on
        // the very next bytes
        let bad = FrameHeader {
            width: 5000,
            height: 10,
        };
        producer.write_all(&bad.encode()).unwrap();
        send_frame(&mut producer, 2, 2, 9);

        let frame = wait_for_frame(&slot, |_| true);
        assert_eq!(frame.width, 2);
        assert!(frame.pixels().iter().all(|&b| b == 9));
    }

    #[test]
    fn test_reconnect_takeover() {
        let slot = Arc::new(FrameSlot::new());
        let listener = start_listener(&slot);

        let mut first = connect(listener.local_port());
        send_frame(&mut first, 2, 2, 1);
        wait_for_frame(&slot, |f| f.pixels()[0] == 1);

        // A second producer supersedes the first without a server restart
        let mut second = connect(listener.local_port());
        thread::sleep(Duration::from_millis(20));
        send_frame(&mut second, 2, 2, 2);

        let frame = wait_for_frame(&slot, |f| f.pixels()[0] == 2);
        assert_eq!(frame.width, 2);

        // The first connection was shut down server-side; pushing more
        // data through it must eventually fail
        let mut dead = false;
        for _ in 0..200 {
            if first.write_all(&[0u8; 4096]).is_err() {
                dead = true;
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(dead, "superseded connection was never terminated");
    }

    #[test]
    fn test_stop_is_idempotent_and_restartable() {
        let slot = Arc::new(FrameSlot::new());

        let mut listener = start_listener(&slot);
        listener.stop();
        listener.stop();

        // A fresh listener accepts connections again
        let listener = start_listener(&slot);
        let mut producer = connect(listener.local_port());
        send_frame(&mut producer, 1, 1, 7);
        let frame = wait_for_frame(&slot, |_| true);
        assert_eq!(frame.pixels(), [7, 7, 7, 7]);
    }

    #[test]
    fn test_stop_terminates_active_receiver() {
        let slot = Arc::new(FrameSlot::new());
        let mut listener = start_listener(&slot);

        let mut producer = connect(listener.local_port());
        send_frame(&mut producer, 1, 1, 3);
        wait_for_frame(&slot, |_| true);

        listener.stop();

        let mut dead = false;
        for _ in 0..200 {
            if producer.write_all(&[0u8; 4096]).is_err() {
                dead = true;
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(dead, "receiver connection survived stop()");
    }

    #[test]
    fn test_stop_quiesces_with_racing_producer() {
        let slot = Arc::new(FrameSlot::new());
        let mut listener = start_listener(&slot);
        let port = listener.local_port();

        // Producer that reconnects and pushes frames until the server is
        // gone. A connection accepted in the same instant stop() runs must
        // still be terminated before stop() returns.
        let pusher = thread::spawn(move || {
            let header = FrameHeader {
                width: 1,
                height: 1,
            };
            let mut bytes = header.encode().to_vec();
            bytes.extend_from_slice(&[1u8; 4]);
            while let Ok(mut stream) = TcpStream::connect((Ipv4Addr::LOCALHOST, port)) {
                stream
                    .set_write_timeout(Some(Duration::from_millis(50)))
                    .unwrap();
                while stream.write_all(&bytes).is_ok() {}
            }
        });

        wait_for_frame(&slot, |_| true);
        listener.stop();
        pusher.join().unwrap();

        // No receiver may outlive stop(): once the producer is gone the
        // slot must go quiet and stay quiet.
        thread::sleep(Duration::from_millis(50));
        slot.take_and_clear();
        thread::sleep(Duration::from_millis(100));
        assert!(!slot.has_pending(), "receiver kept publishing after stop()");
    }
}
