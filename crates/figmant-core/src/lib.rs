pub mod analysis;
pub mod attachment;
pub mod credits;
pub mod error;
pub mod intake;
pub mod ledger;
pub mod template;

pub use attachment::{AttachmentKind, AttachmentRecord, AttachmentStatus, ProcessingInfo};
pub use error::FigmantError;
pub use intake::{IncomingFile, IntakeLimits, IntakePartition, RejectReason, RejectedFile};
pub use ledger::{Ledger, StatusUpdate};
