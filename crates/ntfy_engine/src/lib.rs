//! Listener engine: streaming connections, reconnection and history fetches.
mod connector;
mod engine;
mod history;
mod persist;
mod stream;
mod supervisor;
mod types;

pub use connector::{LineReader, ReqwestConnector, StreamConnector};
pub use engine::{EngineEvents, EngineHandle};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use types::{EngineEvent, EngineSettings, TransportError, WorkerConfig};
