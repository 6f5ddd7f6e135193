use std::sync::Mutex;

use tracing::warn;

use crate::attachment::{AttachmentRecord, AttachmentStatus, ProcessingInfo};

/// Fields applied alongside a status transition.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub error_message: Option<String>,
    pub upload_path: Option<String>,
    pub public_url: Option<String>,
    pub processing_info: Option<ProcessingInfo>,
}

impl StatusUpdate {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn uploaded(upload_path: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            upload_path: Some(upload_path.into()),
            public_url: Some(public_url.into()),
            ..Default::default()
        }
    }

    pub fn with_processing_info(mut self, info: ProcessingInfo) -> Self {
        self.processing_info = Some(info);
        self
    }
}

/// The ordered, in-memory list of attachment records for one session.
///
/// Every mutation goes through this type; pipeline stages never hold a record
/// directly. Updates are applied atomically per record under the lock, and a
/// stale update for an id that has since been removed is dropped with a log
/// line rather than an error, since the only consequence is that nothing is
/// left to reflect it.
#[derive(Debug, Default)]
pub struct Ledger {
    records: Mutex<Vec<AttachmentRecord>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records in the given order, preserving intake order.
    /// A record whose id is already present is skipped.
    pub fn append(&self, records: Vec<AttachmentRecord>) {
        let mut guard = self.records.lock().unwrap();
        for record in records {
            if guard.iter().any(|r| r.id == record.id) {
                warn!(id = %record.id, "duplicate attachment id, skipping append");
                continue;
            }
            guard.push(record);
        }
    }

    /// Transition one record.
    ///
    /// Returns `false` without touching anything when the id is unknown, the
    /// transition is not permitted, or an `Uploaded` transition arrives
    /// without an object key. Callers treat `false` as "stop working on this
    /// record".
    pub fn update_status(&self, id: &str, status: AttachmentStatus, update: StatusUpdate) -> bool {
        let mut guard = self.records.lock().unwrap();
        let Some(record) = guard.iter_mut().find(|r| r.id == id) else {
            warn!(id, status = %status, "attachment not in ledger, dropping update");
            return false;
        };

        if !record.status.can_transition_to(status) {
            warn!(
                id,
                from = %record.status,
                to = %status,
                "rejected attachment status transition"
            );
            return false;
        }

        if status == AttachmentStatus::Uploaded
            && update.upload_path.as_deref().map_or(true, str::is_empty)
        {
            warn!(id, "uploaded transition without object key, dropping update");
            return false;
        }

        record.status = status;
        match status {
            AttachmentStatus::Uploaded => {
                record.error_message = None;
                record.upload_path = update.upload_path;
                record.public_url = update.public_url;
                if update.processing_info.is_some() {
                    record.processing_info = update.processing_info;
                }
            }
            AttachmentStatus::Failed => {
                record.error_message = update.error_message;
                record.upload_path = None;
                record.public_url = None;
                if update.processing_info.is_some() {
                    record.processing_info = update.processing_info;
                }
            }
            AttachmentStatus::Pending => {
                // Retry reset: wipe the previous attempt entirely.
                record.error_message = None;
                record.upload_path = None;
                record.public_url = None;
                record.processing_info = None;
            }
            AttachmentStatus::Processing => {}
        }
        true
    }

    /// Remove a record in any status. Returns it if it was present.
    pub fn remove(&self, id: &str) -> Option<AttachmentRecord> {
        let mut guard = self.records.lock().unwrap();
        let idx = guard.iter().position(|r| r.id == id)?;
        Some(guard.remove(idx))
    }

    pub fn get(&self, id: &str) -> Option<AttachmentRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Current records in intake order.
    pub fn snapshot(&self) -> Vec<AttachmentRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
