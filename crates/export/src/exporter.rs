use std::collections::HashMap;

use anvil_chunk::Chunk;
use anvil_common::{ChunkPos, chunk_hash};
use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::payload::encode_payload;
use crate::scheduler::{InlineScheduler, TaskScheduler};

#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("chunk ({x}, {z}) is not loaded")]
    NotLoaded { x: i32, z: i32 },
    #[error("failed to encode chunk payload: {0}")]
    Encode(#[from] std::io::Error),
}

/// Resolves chunk coordinates to loaded chunks.
pub trait ChunkSource {
    fn chunk(&self, x: i32, z: i32) -> Option<&Chunk>;
}

/// Loaded chunks keyed by [`chunk_hash`].
impl ChunkSource for HashMap<i64, Chunk> {
    fn chunk(&self, x: i32, z: i32) -> Option<&Chunk> {
        self.get(&chunk_hash(x, z))
    }
}

/// Receives finished payloads on the thread that owns the exporter.
pub trait ExportSink {
    fn chunk_ready(&mut self, pos: ChunkPos, payload: Vec<u8>);

    /// An async export that could not be packaged.
    fn export_failed(&mut self, pos: ChunkPos, error: ChunkError) {
        tracing::warn!(x = pos.x, z = pos.z, "chunk export failed: {error}");
    }
}

impl<F: FnMut(ChunkPos, Vec<u8>)> ExportSink for F {
    fn chunk_ready(&mut self, pos: ChunkPos, payload: Vec<u8>) {
        self(pos, payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Package on the calling thread and deliver before returning.
    Sync,
    /// Package a snapshot on the scheduler; deliver from `poll`.
    Async,
}

impl ExportMode {
    pub fn from_async_flag(async_requests: bool) -> Self {
        if async_requests {
            ExportMode::Async
        } else {
            ExportMode::Sync
        }
    }
}

struct Completed {
    pos: ChunkPos,
    payload: Result<Vec<u8>, ChunkError>,
}

/// Turns loaded chunks into client payloads.
pub struct ChunkExporter {
    mode: ExportMode,
    scheduler: Box<dyn TaskScheduler>,
    done_tx: Sender<Completed>,
    done_rx: Receiver<Completed>,
    in_flight: usize,
}

impl ChunkExporter {
    pub fn new(mode: ExportMode, scheduler: Box<dyn TaskScheduler>) -> Self {
        let (done_tx, done_rx) = unbounded();
        Self {
            mode,
            scheduler,
            done_tx,
            done_rx,
            in_flight: 0,
        }
    }

    /// Exporter that always packages inline.
    pub fn sync() -> Self {
        Self::new(ExportMode::Sync, Box::new(InlineScheduler))
    }

    pub fn mode(&self) -> ExportMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ExportMode) {
        self.mode = mode;
    }

    /// Async exports scheduled but not yet delivered.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Package chunk `(x, z)` from `source`.
    ///
    /// In sync mode `sink` has been called when this returns. In async mode
    /// the chunk is cloned now and the payload arrives through [`poll`] or
    /// [`wait_all`]; later edits to the live chunk do not affect it.
    ///
    /// [`poll`]: Self::poll
    /// [`wait_all`]: Self::wait_all
    pub fn request_export<S, K>(
        &mut self,
        source: &S,
        x: i32,
        z: i32,
        sink: &mut K,
    ) -> Result<(), ChunkError>
    where
        S: ChunkSource + ?Sized,
        K: ExportSink + ?Sized,
    {
        let chunk = source.chunk(x, z).ok_or(ChunkError::NotLoaded { x, z })?;
        let pos = ChunkPos::new(x, z);
        match self.mode {
            ExportMode::Sync => {
                let payload = encode_payload(chunk)?;
                tracing::trace!(x, z, bytes = payload.len(), "exported chunk");
                sink.chunk_ready(pos, payload);
            }
            ExportMode::Async => {
                let snapshot = chunk.clone();
                let done = self.done_tx.clone();
                self.in_flight += 1;
                self.scheduler.schedule(Box::new(move || {
                    let payload = encode_payload(&snapshot);
                    // The exporter owns the receiver; a closed channel means
                    // it was dropped and nobody is waiting for this result.
                    let _ = done.send(Completed { pos, payload });
                }));
            }
        }
        Ok(())
    }

    /// Deliver every finished export without blocking. Returns how many
    /// were delivered.
    pub fn poll<K: ExportSink + ?Sized>(&mut self, sink: &mut K) -> usize {
        let mut delivered = 0;
        while let Ok(done) = self.done_rx.try_recv() {
            self.deliver(done, sink);
            delivered += 1;
        }
        delivered
    }

    /// Block until every scheduled export has been delivered.
    pub fn wait_all<K: ExportSink + ?Sized>(&mut self, sink: &mut K) -> usize {
        let mut delivered = 0;
        while self.in_flight > 0 {
            match self.done_rx.recv() {
                Ok(done) => {
                    self.deliver(done, sink);
                    delivered += 1;
                }
                Err(_) => break,
            }
        }
        delivered
    }

    fn deliver<K: ExportSink + ?Sized>(&mut self, done: Completed, sink: &mut K) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match done.payload {
            Ok(payload) => sink.chunk_ready(done.pos, payload),
            Err(e) => sink.export_failed(done.pos, e),
        }
    }
}

impl std::fmt::Debug for ChunkExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkExporter")
            .field("mode", &self.mode)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}
