use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::model::{CommitReport, ScanEntry};
use crate::remote::{bounded, RemoteError, RemoteStore};

/// Why a chunk did not go through.
#[derive(Debug)]
pub enum FailureKind {
    /// The remote store answered and said no.
    Rejected(String),
    /// No usable answer: network failure, timeout, undecodable reply.
    Transport(RemoteError),
}

#[derive(Debug)]
pub struct ChunkFailure {
    /// Zero-based index of the chunk that failed.
    pub chunk_index: usize,
    pub kind: FailureKind,
}

/// Result of one commit run.
#[derive(Debug)]
pub struct CommitOutcome {
    pub report: CommitReport,
    pub failure: Option<ChunkFailure>,
}

/// BatchCommitter: submits a batch in fixed-size chunks, one at a time,
/// stopping at the first chunk that is not acknowledged.
///
/// Never touches the staging store; the caller decides what to drop based
/// on the returned [`CommitReport`].
pub struct BatchCommitter {
    remote: Arc<dyn RemoteStore>,
    chunk_size: usize,
    timeout: Duration,
}

impl BatchCommitter {
    /// `chunk_size` must be non-zero (see `PipelineConfig::validate`).
    pub fn new(remote: Arc<dyn RemoteStore>, chunk_size: usize, timeout: Duration) -> Self {
        Self {
            remote,
            chunk_size,
            timeout,
        }
    }

    pub async fn commit(&self, entries: &[ScanEntry]) -> CommitOutcome {
        let chunks_total = entries.len().div_ceil(self.chunk_size);
        let mut report = CommitReport {
            chunks_total,
            chunks_committed: 0,
            entries_committed: 0,
            entries_pending: entries.len(),
        };

        for (index, chunk) in entries.chunks(self.chunk_size).enumerate() {
            info!(
                "submitting chunk {}/{} ({} entries)",
                index + 1,
                chunks_total,
                chunk.len()
            );

            let kind = match bounded(self.timeout, self.remote.submit_chunk(chunk)).await {
                Ok(ack) if ack.accepted => {
                    report.chunks_committed += 1;
                    report.entries_committed += chunk.len();
                    report.entries_pending -= chunk.len();
                    continue;
                }
                Ok(ack) => FailureKind::Rejected(
                    ack.rejected_reason
                        .unwrap_or_else(|| "rejected without reason".to_string()),
                ),
                Err(e) => FailureKind::Transport(e),
            };

            warn!("chunk {}/{} failed: {:?}; {}", index + 1, chunks_total, kind, report);
            return CommitOutcome {
                report,
                failure: Some(ChunkFailure {
                    chunk_index: index,
                    kind,
                }),
            };
        }

        info!("commit finished: {}", report);
        CommitOutcome {
            report,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fake::FakeRemote;

    fn batch(n: usize) -> Vec<ScanEntry> {
        (0..n)
            .map(|i| ScanEntry {
                item_id: "item-1".into(),
                invoice_number: format!("INV-{}", i / 40),
                sku: "SKU-1".into(),
                item_name: "Scanner".into(),
                serial_number: format!("SN-{i:04}"),
                quantity: 1,
            })
            .collect()
    }

    fn committer(remote: Arc<FakeRemote>) -> BatchCommitter {
        BatchCommitter::new(remote, 50, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn chunks_are_sent_in_order() {
        let remote = Arc::new(FakeRemote::new());
        let entries = batch(120);
        let outcome = committer(remote.clone()).commit(&entries).await;

        assert!(outcome.failure.is_none());
        assert_eq!(outcome.report.chunks_total, 3);
        assert_eq!(outcome.report.chunks_committed, 3);
        assert!(outcome.report.is_complete());

        let subs = remote.submissions();
        let sizes: Vec<usize> = subs.iter().map(|s| s.len()).collect();
        assert_eq!(sizes, [50, 50, 20]);
        let sent: Vec<String> = subs.concat();
        let expected: Vec<String> = entries.iter().map(|e| e.serial_number.clone()).collect();
        assert_eq!(sent, expected);
    }

    #[tokio::test]
    async fn rejection_stops_before_later_chunks() {
        let remote = Arc::new(FakeRemote::new());
        remote.reject_submission(1);
        let outcome = committer(remote.clone()).commit(&batch(120)).await;

        assert_eq!(remote.submissions().len(), 2);
        assert_eq!(outcome.report.entries_committed, 50);
        assert_eq!(outcome.report.entries_pending, 70);
        assert_eq!(outcome.report.to_string(), "50 committed, 70 pending");
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.chunk_index, 1);
        assert!(matches!(failure.kind, FailureKind::Rejected(_)));
    }

    #[tokio::test]
    async fn transport_error_stops_immediately() {
        let remote = Arc::new(FakeRemote::new());
        remote.drop_submission(0);
        let outcome = committer(remote.clone()).commit(&batch(60)).await;

        assert_eq!(remote.submissions().len(), 1);
        assert_eq!(outcome.report.entries_committed, 0);
        assert_eq!(outcome.report.entries_pending, 60);
        assert!(matches!(
            outcome.failure.unwrap().kind,
            FailureKind::Transport(RemoteError::Server { status: 502, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_chunk_is_a_transport_error() {
        let remote = Arc::new(FakeRemote::new());
        remote.stall();
        let outcome = committer(remote).commit(&batch(10)).await;
        assert!(matches!(
            outcome.failure.unwrap().kind,
            FailureKind::Transport(RemoteError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn exact_multiple_has_no_trailing_chunk() {
        let remote = Arc::new(FakeRemote::new());
        let outcome = committer(remote.clone()).commit(&batch(100)).await;
        assert_eq!(outcome.report.chunks_total, 2);
        assert_eq!(remote.submissions().len(), 2);
    }
}
