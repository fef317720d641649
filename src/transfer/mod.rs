pub mod color;
pub mod engine;
pub mod record;
pub mod sink;

pub use engine::{TransferEngine, TransferError, TransferSummary};
pub use record::{FieldMapping, OutputRecord, Position, ShapeKind};
pub use sink::{RemoteSink, SinkError};
