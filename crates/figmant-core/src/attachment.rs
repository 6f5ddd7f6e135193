use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    File,
    Url,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::File => "file",
            AttachmentKind::Url => "url",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "image" => Some(AttachmentKind::Image),
            "file" => Some(AttachmentKind::File),
            "url" => Some(AttachmentKind::Url),
            _ => None,
        }
    }

    /// Classify a file by its declared content type.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("image/") {
            AttachmentKind::Image
        } else {
            AttachmentKind::File
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentStatus {
    Pending,
    Processing,
    Uploaded,
    Failed,
}

impl AttachmentStatus {
    pub const ALL: &[AttachmentStatus] = &[
        AttachmentStatus::Pending,
        AttachmentStatus::Processing,
        AttachmentStatus::Uploaded,
        AttachmentStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentStatus::Pending => "pending",
            AttachmentStatus::Processing => "processing",
            AttachmentStatus::Uploaded => "uploaded",
            AttachmentStatus::Failed => "failed",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AttachmentStatus::Pending),
            "processing" => Some(AttachmentStatus::Processing),
            "uploaded" => Some(AttachmentStatus::Uploaded),
            "failed" => Some(AttachmentStatus::Failed),
            _ => None,
        }
    }

    /// Whether a record may move from `self` to `next`.
    ///
    /// Transitions are monotonic within a single attempt; the only way
    /// backwards is a user-triggered retry of a failed record.
    pub fn can_transition_to(&self, next: AttachmentStatus) -> bool {
        matches!(
            (self, next),
            (AttachmentStatus::Pending, AttachmentStatus::Processing)
                | (AttachmentStatus::Processing, AttachmentStatus::Uploaded)
                | (AttachmentStatus::Processing, AttachmentStatus::Failed)
                | (AttachmentStatus::Failed, AttachmentStatus::Pending)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AttachmentStatus::Uploaded)
    }
}

impl fmt::Display for AttachmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata produced by the image processing stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    pub original_bytes: u64,
    pub processed_bytes: u64,
    pub width: u32,
    pub height: u32,
    /// Source format as reported by the decoder, e.g. "png".
    pub source_format: String,
    /// True when the payload was re-encoded (downscale or recompression).
    pub recompressed: bool,
}

/// One user-supplied file or URL destined for analysis.
///
/// `upload_path` is set exactly when `status` is `Uploaded`; `error_message`
/// exactly when it is `Failed`. The ledger enforces both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub id: String,
    pub name: String,
    pub kind: AttachmentKind,
    pub status: AttachmentStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub upload_path: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub processing_info: Option<ProcessingInfo>,
    pub created_at: DateTime<Utc>,
}

impl AttachmentRecord {
    /// A fresh pending record, as created at intake.
    pub fn pending(name: impl Into<String>, kind: AttachmentKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            status: AttachmentStatus::Pending,
            error_message: None,
            upload_path: None,
            public_url: None,
            processing_info: None,
            created_at: Utc::now(),
        }
    }

    /// A url-kind record. The asset already has a resolvable address, so the
    /// record is complete on creation with the URL as its remote location.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: Uuid::new_v4().to_string(),
            name: url.clone(),
            kind: AttachmentKind::Url,
            status: AttachmentStatus::Uploaded,
            error_message: None,
            upload_path: Some(url.clone()),
            public_url: Some(url),
            processing_info: None,
            created_at: Utc::now(),
        }
    }
}
