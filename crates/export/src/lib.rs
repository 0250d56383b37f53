//! Chunk export: packages a chunk into the flat client payload.
//!
//! # Invariants
//! - Async packaging only ever sees an owned snapshot taken at dispatch.
//! - Every scheduled export completes and reaches the sink exactly once.
//! - Sync exports reach the sink before `request_export` returns.

mod exporter;
pub mod le_nbt;
pub mod payload;
mod scheduler;

pub use exporter::{ChunkError, ChunkExporter, ChunkSource, ExportMode, ExportSink};
pub use payload::encode_payload;
pub use scheduler::{InlineScheduler, Task, TaskScheduler, WorkerPool};
