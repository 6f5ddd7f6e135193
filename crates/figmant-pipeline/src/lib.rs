pub mod ingest;
pub mod process;
pub mod upload;

pub use ingest::{IngestReport, Ingestor};
pub use process::{ImagePolicy, ProcessError, ProcessedImage};
pub use upload::{upload_attachment, UploadedObject};
