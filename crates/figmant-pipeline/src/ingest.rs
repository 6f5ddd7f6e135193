use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use figmant_core::attachment::{AttachmentKind, AttachmentRecord, AttachmentStatus};
use figmant_core::intake::{self, IncomingFile, IntakeLimits, RejectedFile};
use figmant_core::ledger::{Ledger, StatusUpdate};
use figmant_core::FigmantError;
use figmant_store::ObjectStore;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::process::{process_image, ImagePolicy};
use crate::upload::upload_attachment;

/// Outcome of one intake batch. `record_ids` are in intake order; `handles`
/// cover the per-attachment tasks spawned for the accepted files, so callers
/// that need completion (tests, shutdown paths) can await them.
pub struct IngestReport {
    pub record_ids: Vec<String>,
    pub rejected: Vec<RejectedFile>,
    pub handles: Vec<JoinHandle<()>>,
}

/// Drives dropped files through intake, processing, and upload, reconciling
/// every outcome onto the ledger it owns.
///
/// Each accepted attachment gets its own spawned task; tasks only ever touch
/// their own record id, so no coordination beyond the ledger lock is needed.
/// There is no cancellation path for an in-flight upload and no automatic
/// retry; a failed record waits for [`Ingestor::retry`] or removal.
pub struct Ingestor {
    store: Arc<dyn ObjectStore>,
    ledger: Arc<Ledger>,
    limits: IntakeLimits,
    policy: ImagePolicy,
    // Source payloads retained for retry, dropped on upload success or
    // removal. Bytes handles, so clones are cheap.
    sources: Arc<Mutex<HashMap<String, IncomingFile>>>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            ledger: Arc::new(Ledger::new()),
            limits: IntakeLimits::default(),
            policy: ImagePolicy::default(),
            sources: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_limits(mut self, limits: IntakeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_policy(mut self, policy: ImagePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The session's attachment ledger. Read-only for callers; all
    /// mutations flow through the pipeline (plus [`Ingestor::remove`]).
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Accept a dropped/picked batch: filter it, append pending records in
    /// intake order, and start one task per accepted file. Rejected files
    /// never get a record.
    pub fn ingest(&self, batch: Vec<IncomingFile>) -> IngestReport {
        let part = intake::partition(batch, &self.limits);
        for rejected in &part.rejected {
            info!(name = %rejected.name, reason = %rejected.reason, "rejected at intake");
        }

        let mut records = Vec::with_capacity(part.accepted.len());
        for file in &part.accepted {
            records.push(AttachmentRecord::pending(
                file.name.clone(),
                AttachmentKind::from_content_type(&file.content_type),
            ));
        }
        let record_ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        self.ledger.append(records);

        {
            let mut sources = self.sources.lock().unwrap();
            for (id, file) in record_ids.iter().zip(&part.accepted) {
                sources.insert(id.clone(), file.clone());
            }
        }

        let handles = record_ids
            .iter()
            .zip(part.accepted)
            .map(|(id, file)| self.spawn_stages(id.clone(), file))
            .collect();

        IngestReport {
            record_ids,
            rejected: part.rejected,
            handles,
        }
    }

    /// Append a url-kind record. The asset already has a resolvable address,
    /// so there is nothing to process or upload.
    pub fn attach_url(&self, url: &str) -> Result<String, FigmantError> {
        let trimmed = url.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(FigmantError::InvalidInput(format!(
                "not an http(s) url: {url}"
            )));
        }
        let record = AttachmentRecord::from_url(trimmed);
        let id = record.id.clone();
        self.ledger.append(vec![record]);
        Ok(id)
    }

    /// User-triggered retry of a failed record: reset it to pending and
    /// re-run the full stage sequence on the retained source payload.
    /// Returns `None` when the record is missing, not failed, or its source
    /// is no longer held.
    pub fn retry(&self, id: &str) -> Option<JoinHandle<()>> {
        let record = self.ledger.get(id)?;
        if record.status != AttachmentStatus::Failed {
            warn!(id, status = %record.status, "retry only applies to failed attachments");
            return None;
        }
        let source = self.sources.lock().unwrap().get(id).cloned();
        let Some(file) = source else {
            warn!(id, "no retained source for retry");
            return None;
        };
        if !self
            .ledger
            .update_status(id, AttachmentStatus::Pending, StatusUpdate::default())
        {
            return None;
        }
        Some(self.spawn_stages(id.to_string(), file))
    }

    /// User-triggered removal, permitted in any status. A task still in
    /// flight for this id will find its updates dropped by the ledger.
    pub fn remove(&self, id: &str) -> Option<AttachmentRecord> {
        self.sources.lock().unwrap().remove(id);
        self.ledger.remove(id)
    }

    fn spawn_stages(&self, id: String, file: IncomingFile) -> JoinHandle<()> {
        let store = self.store.clone();
        let ledger = self.ledger.clone();
        let sources = self.sources.clone();
        let policy = self.policy.clone();
        tokio::spawn(async move {
            run_stages(store, ledger, sources, policy, id, file).await;
        })
    }
}

/// One attachment's stage sequence: processing (images only), then upload.
/// Strictly ordered within the record; independent records run concurrently.
async fn run_stages(
    store: Arc<dyn ObjectStore>,
    ledger: Arc<Ledger>,
    sources: Arc<Mutex<HashMap<String, IncomingFile>>>,
    policy: ImagePolicy,
    id: String,
    file: IncomingFile,
) {
    if !ledger.update_status(&id, AttachmentStatus::Processing, StatusUpdate::default()) {
        // Removed (or otherwise ineligible) before the task got scheduled.
        return;
    }

    let is_image = AttachmentKind::from_content_type(&file.content_type) == AttachmentKind::Image;
    let (payload, processing_info) = if is_image {
        let data = file.data.clone();
        let policy = policy.clone();
        let result = tokio::task::spawn_blocking(move || process_image(&data, &policy)).await;
        match result {
            Ok(Ok(processed)) => (processed.data, Some(processed.info)),
            Ok(Err(e)) => {
                info!(%id, name = %file.name, error = %e, "image processing failed");
                ledger.update_status(
                    &id,
                    AttachmentStatus::Failed,
                    StatusUpdate::failed(e.to_string()),
                );
                return;
            }
            Err(e) => {
                ledger.update_status(
                    &id,
                    AttachmentStatus::Failed,
                    StatusUpdate::failed(format!("processing task: {e}")),
                );
                return;
            }
        }
    } else {
        (file.data.clone(), None)
    };

    match upload_attachment(store.as_ref(), &file.name, payload).await {
        Ok(uploaded) => {
            let mut update = StatusUpdate::uploaded(uploaded.key.clone(), uploaded.url);
            if let Some(info) = processing_info {
                update = update.with_processing_info(info);
            }
            if ledger.update_status(&id, AttachmentStatus::Uploaded, update) {
                sources.lock().unwrap().remove(&id);
                info!(%id, key = %uploaded.key, "attachment uploaded");
            } else {
                // Record vanished between the storage write and
                // reconciliation. The remote object is left in place.
                warn!(%id, key = %uploaded.key, "upload finished for a record no longer in the ledger");
            }
        }
        Err(e) => {
            info!(%id, name = %file.name, error = %e, "upload failed");
            ledger.update_status(
                &id,
                AttachmentStatus::Failed,
                StatusUpdate::failed(e.to_string()),
            );
        }
    }
}
