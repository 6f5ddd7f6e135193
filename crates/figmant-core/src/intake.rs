use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One dropped or picked file, before any record exists for it.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

pub const DEFAULT_MAX_BYTES: u64 = 50 * 1024 * 1024;

pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/gif",
    "application/pdf",
];

/// Size ceiling and allowed content types applied at intake.
#[derive(Debug, Clone)]
pub struct IntakeLimits {
    pub max_bytes: u64,
    pub allowed_types: Vec<String>,
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl IntakeLimits {
    pub fn allows_type(&self, content_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == content_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum RejectReason {
    TooLarge { size: u64, limit: u64 },
    UnsupportedType { content_type: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TooLarge { size, limit } => {
                write!(f, "file is {size} bytes, limit is {limit}")
            }
            RejectReason::UnsupportedType { content_type } => {
                write!(f, "unsupported file type: {content_type}")
            }
        }
    }
}

/// A file turned away at intake. No ledger record is ever created for it.
#[derive(Debug, Clone)]
pub struct RejectedFile {
    pub name: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default)]
pub struct IntakePartition {
    pub accepted: Vec<IncomingFile>,
    pub rejected: Vec<RejectedFile>,
}

/// Partition a batch into accepted and rejected files.
///
/// Pure: the same batch and limits always produce the same partition, and
/// accepted files pass through unchanged in their original order.
pub fn partition(batch: Vec<IncomingFile>, limits: &IntakeLimits) -> IntakePartition {
    let mut out = IntakePartition::default();
    for file in batch {
        if !limits.allows_type(&file.content_type) {
            out.rejected.push(RejectedFile {
                name: file.name,
                reason: RejectReason::UnsupportedType {
                    content_type: file.content_type,
                },
            });
        } else if file.data.len() as u64 > limits.max_bytes {
            out.rejected.push(RejectedFile {
                name: file.name,
                reason: RejectReason::TooLarge {
                    size: file.data.len() as u64,
                    limit: limits.max_bytes,
                },
            });
        } else {
            out.accepted.push(file);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content_type: &str, len: usize) -> IncomingFile {
        IncomingFile::new(name, content_type, Bytes::from(vec![0u8; len]))
    }

    #[test]
    fn accepts_allowed_types_under_limit() {
        let limits = IntakeLimits::default();
        let batch = vec![
            file("a.png", "image/png", 1024),
            file("b.pdf", "application/pdf", 2048),
        ];
        let part = partition(batch, &limits);
        assert_eq!(part.accepted.len(), 2);
        assert!(part.rejected.is_empty());
        // Order preserved.
        assert_eq!(part.accepted[0].name, "a.png");
        assert_eq!(part.accepted[1].name, "b.pdf");
    }

    #[test]
    fn rejects_oversized_file() {
        let limits = IntakeLimits {
            max_bytes: 100,
            ..Default::default()
        };
        let part = partition(vec![file("big.png", "image/png", 101)], &limits);
        assert!(part.accepted.is_empty());
        assert_eq!(part.rejected.len(), 1);
        assert_eq!(
            part.rejected[0].reason,
            RejectReason::TooLarge {
                size: 101,
                limit: 100
            }
        );
    }

    #[test]
    fn exactly_at_limit_is_accepted() {
        let limits = IntakeLimits {
            max_bytes: 100,
            ..Default::default()
        };
        let part = partition(vec![file("edge.png", "image/png", 100)], &limits);
        assert_eq!(part.accepted.len(), 1);
    }

    #[test]
    fn rejects_unsupported_type() {
        let limits = IntakeLimits::default();
        let part = partition(vec![file("movie.mp4", "video/mp4", 10)], &limits);
        assert!(part.accepted.is_empty());
        assert_eq!(
            part.rejected[0].reason,
            RejectReason::UnsupportedType {
                content_type: "video/mp4".into()
            }
        );
    }

    #[test]
    fn mixed_batch_partitions_deterministically() {
        let limits = IntakeLimits {
            max_bytes: 1000,
            ..Default::default()
        };
        let batch = || {
            vec![
                file("ok.png", "image/png", 500),
                file("big.pdf", "application/pdf", 2000),
                file("nope.svg", "image/svg+xml", 10),
                file("also-ok.jpg", "image/jpeg", 999),
            ]
        };
        let first = partition(batch(), &limits);
        let second = partition(batch(), &limits);
        assert_eq!(first.accepted.len(), 2);
        assert_eq!(first.rejected.len(), 2);
        assert_eq!(
            first.accepted.iter().map(|f| &f.name).collect::<Vec<_>>(),
            second.accepted.iter().map(|f| &f.name).collect::<Vec<_>>()
        );
    }

    #[test]
    fn default_limits_match_product_ceiling() {
        let limits = IntakeLimits::default();
        assert_eq!(limits.max_bytes, 50 * 1024 * 1024);
        assert!(limits.allows_type("image/png"));
        assert!(limits.allows_type("application/pdf"));
        assert!(!limits.allows_type("video/mp4"));
    }

    #[test]
    fn reject_reason_messages() {
        let too_large = RejectReason::TooLarge {
            size: 60,
            limit: 50,
        };
        assert_eq!(too_large.to_string(), "file is 60 bytes, limit is 50");
        let unsupported = RejectReason::UnsupportedType {
            content_type: "video/mp4".into(),
        };
        assert_eq!(
            unsupported.to_string(),
            "unsupported file type: video/mp4"
        );
    }
}
