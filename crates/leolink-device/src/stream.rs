use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::error::{DeviceError, Result};
use crate::traits::{DeviceConfig, ListenerSlot};

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const READ_CHUNK_SIZE: usize = 512;

/// Splits a raw byte stream into payloads ending in a terminator byte.
///
/// Whitespace between payloads (line endings emitted by some modems) is
/// dropped. A payload that grows past `max_len` without a terminator is
/// discarded so one corrupt burst cannot stall the stream.
#[derive(Debug)]
pub(crate) struct PayloadSplitter {
    buf: BytesMut,
    terminator: u8,
    max_len: usize,
}

impl PayloadSplitter {
    pub(crate) fn new(terminator: u8, max_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            terminator,
            max_len,
        }
    }

    pub(crate) fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Next complete payload, terminator included.
    pub(crate) fn next_payload(&mut self) -> Option<Bytes> {
        loop {
            let end = self.buf.iter().position(|b| *b == self.terminator)?;
            let mut payload = self.buf.split_to(end + 1);
            let start = payload
                .iter()
                .position(|b| !b.is_ascii_whitespace())
                .unwrap_or(payload.len());
            payload.advance(start);
            if !payload.is_empty() {
                return Some(payload.freeze());
            }
        }
    }

    /// Drop the pending partial payload if it exceeds the limit.
    ///
    /// Returns the number of discarded bytes.
    pub(crate) fn discard_overflow(&mut self) -> Option<usize> {
        if self.buf.len() <= self.max_len {
            return None;
        }
        let dropped = self.buf.len();
        self.buf.clear();
        Some(dropped)
    }
}

/// Background thread that reads a stream and dispatches payloads.
pub(crate) struct ReaderTask {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReaderTask {
    pub(crate) fn spawn<R>(
        name: &str,
        mut stream: R,
        config: &DeviceConfig,
        listener: ListenerSlot,
        link_up: Arc<AtomicBool>,
    ) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let mut splitter = PayloadSplitter::new(config.terminator, config.max_payload_len);
        let thread_running = running.clone();
        let device = name.to_string();

        let handle = std::thread::Builder::new()
            .name(format!("leolink-rx-{name}"))
            .spawn(move || {
                let mut chunk = [0u8; READ_CHUNK_SIZE];
                while thread_running.load(Ordering::SeqCst) {
                    let read = match stream.read(&mut chunk) {
                        Ok(0) => {
                            debug!(%device, "device stream reached EOF");
                            link_up.store(false, Ordering::SeqCst);
                            break;
                        }
                        Ok(n) => n,
                        Err(err)
                            if matches!(
                                err.kind(),
                                ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                            ) =>
                        {
                            continue
                        }
                        Err(err) => {
                            if thread_running.load(Ordering::SeqCst) {
                                warn!(%device, error = %err, "device read failed; link marked down");
                            }
                            link_up.store(false, Ordering::SeqCst);
                            break;
                        }
                    };

                    splitter.extend(&chunk[..read]);
                    while let Some(payload) = splitter.next_payload() {
                        if !listener.dispatch(&payload) {
                            debug!(%device, len = payload.len(), "no listener registered; payload dropped");
                        }
                    }
                    if let Some(dropped) = splitter.discard_overflow() {
                        warn!(%device, dropped, "unterminated payload exceeded limit; discarded");
                    }
                }
            })?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub(crate) fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("device reader thread panicked");
            }
        }
    }
}

impl Drop for ReaderTask {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Writer half plus reader thread of an open stream device.
pub(crate) struct StreamLink<W> {
    writer: W,
    reader: ReaderTask,
    link_up: Arc<AtomicBool>,
}

impl<W: Write> StreamLink<W> {
    pub(crate) fn start<R>(
        name: &str,
        writer: W,
        reader: R,
        config: &DeviceConfig,
        listener: ListenerSlot,
    ) -> Result<Self>
    where
        R: Read + Send + 'static,
    {
        let link_up = Arc::new(AtomicBool::new(true));
        let reader = ReaderTask::spawn(name, reader, config, listener, link_up.clone())?;
        Ok(Self {
            writer,
            reader,
            link_up,
        })
    }

    pub(crate) fn is_up(&self) -> bool {
        self.link_up.load(Ordering::SeqCst)
    }

    pub(crate) fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if !self.is_up() {
            return Err(DeviceError::Shutdown);
        }
        let written = self
            .writer
            .write_all(data)
            .and_then(|()| self.writer.flush());
        written.map_err(|err| {
            self.link_up.store(false, Ordering::SeqCst);
            DeviceError::Io(err)
        })
    }

    pub(crate) fn writer(&self) -> &W {
        &self.writer
    }

    pub(crate) fn stop(mut self) {
        self.link_up.store(false, Ordering::SeqCst);
        self.reader.stop();
    }
}
