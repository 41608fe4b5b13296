use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::fold_key;
use crate::remote::{bounded, ExistsKind, RemoteError, RemoteStore};

/// Result of the pre-append check for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SingleCheck {
    pub invoice_exists: bool,
    pub serial_exists: bool,
}

/// Result of the pre-commit check for a whole batch. Values keep the
/// spelling used in the batch, in batch order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCheck {
    pub existing_invoices: Vec<String>,
    pub existing_serials: Vec<String>,
    pub duplicates_within_batch: Vec<String>,
}

impl BatchCheck {
    pub fn is_clean(&self) -> bool {
        self.existing_invoices.is_empty()
            && self.existing_serials.is_empty()
            && self.duplicates_within_batch.is_empty()
    }
}

impl fmt::Display for BatchCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.existing_invoices.is_empty() {
            parts.push(format!(
                "invoices already registered: {}",
                self.existing_invoices.join(", ")
            ));
        }
        if !self.existing_serials.is_empty() {
            parts.push(format!(
                "serial numbers already registered: {}",
                self.existing_serials.join(", ")
            ));
        }
        if !self.duplicates_within_batch.is_empty() {
            parts.push(format!(
                "serial numbers repeated in batch: {}",
                self.duplicates_within_batch.join(", ")
            ));
        }
        if parts.is_empty() {
            return write!(f, "no duplicates");
        }
        write!(f, "{}", parts.join("; "))
    }
}

/// DuplicateDetector: asks the remote store whether invoices or serials
/// are already registered. Any remote failure (including a timeout) is
/// returned as an error; callers must treat that as "blocked".
pub struct DuplicateDetector {
    remote: Arc<dyn RemoteStore>,
    timeout: Duration,
}

impl DuplicateDetector {
    pub fn new(remote: Arc<dyn RemoteStore>, timeout: Duration) -> Self {
        Self { remote, timeout }
    }

    /// Check one scan. The two lookups run concurrently.
    pub async fn check_single(
        &self,
        invoice: &str,
        serial: &str,
    ) -> Result<SingleCheck, RemoteError> {
        let invoices = [invoice.trim().to_string()];
        let serials = [serial.trim().to_string()];
        let (invoice_hits, serial_hits) = tokio::try_join!(
            self.query(ExistsKind::Invoice, &invoices),
            self.query(ExistsKind::Serial, &serials),
        )?;

        let check = SingleCheck {
            invoice_exists: contains_folded(&invoice_hits, invoice),
            serial_exists: contains_folded(&serial_hits, serial),
        };
        debug!("single check {}/{}: {:?}", invoice, serial, check);
        Ok(check)
    }

    /// Check a batch about to be committed: remote hits for both lists,
    /// plus serials that occur more than once in `serials` itself.
    pub async fn check_batch(
        &self,
        invoices: &[String],
        serials: &[String],
    ) -> Result<BatchCheck, RemoteError> {
        let duplicates_within_batch = repeated(serials);
        let invoices = distinct(invoices);
        let serials = distinct(serials);

        let (invoice_hits, serial_hits) = tokio::try_join!(
            self.query(ExistsKind::Invoice, &invoices),
            self.query(ExistsKind::Serial, &serials),
        )?;

        let check = BatchCheck {
            existing_invoices: keep_matched(invoices, &invoice_hits),
            existing_serials: keep_matched(serials, &serial_hits),
            duplicates_within_batch,
        };
        if !check.is_clean() {
            warn!("batch check found duplicates: {}", check);
        }
        Ok(check)
    }

    async fn query(&self, kind: ExistsKind, values: &[String]) -> Result<Vec<String>, RemoteError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        bounded(self.timeout, self.remote.query_exists(kind, values))
            .await
            .inspect_err(|e| warn!("exists query ({:?}, {} values) failed: {}", kind, values.len(), e))
    }
}

fn contains_folded(hits: &[String], value: &str) -> bool {
    let key = fold_key(value);
    hits.iter().any(|h| fold_key(h) == key)
}

/// First spelling of each folded value, in order.
fn distinct(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && seen.insert(fold_key(v)))
        .map(str::to_string)
        .collect()
}

/// Values occurring more than once (folded), reported once each in the
/// order their first repeat appears.
fn repeated(values: &[String]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for value in values {
        let n = counts.entry(fold_key(value)).or_insert(0);
        *n += 1;
        if *n == 2 {
            out.push(value.trim().to_string());
        }
    }
    out
}

fn keep_matched(values: Vec<String>, hits: &[String]) -> Vec<String> {
    let hit_keys: HashSet<String> = hits.iter().map(|h| fold_key(h)).collect();
    values
        .into_iter()
        .filter(|v| hit_keys.contains(&fold_key(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fake::FakeRemote;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn detector(remote: Arc<FakeRemote>) -> DuplicateDetector {
        DuplicateDetector::new(remote, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn single_check_reports_each_field() {
        let remote = Arc::new(FakeRemote::new());
        remote.register_serial("SN-100");
        let d = detector(remote.clone());

        let check = d.check_single("INV-1", "sn-100").await.unwrap();
        assert_eq!(check, SingleCheck { invoice_exists: false, serial_exists: true });

        remote.register_invoice("inv-1");
        let check = d.check_single("INV-1", "SN-200").await.unwrap();
        assert_eq!(check, SingleCheck { invoice_exists: true, serial_exists: false });
    }

    #[tokio::test]
    async fn unreachable_remote_fails_closed() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_unreachable(true);
        let d = detector(remote);
        assert!(d.check_single("INV-1", "SN-1").await.is_err());
        assert!(d
            .check_batch(&strings(&["INV-1"]), &strings(&["SN-1"]))
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn silent_remote_times_out() {
        let remote = Arc::new(FakeRemote::new());
        remote.stall();
        let d = detector(remote);
        let err = d.check_single("INV-1", "SN-1").await.unwrap_err();
        assert!(matches!(err, RemoteError::Timeout(_)));
    }

    #[tokio::test]
    async fn batch_check_names_remote_hits_in_batch_spelling() {
        let remote = Arc::new(FakeRemote::new());
        remote.register_serial("sn-100");
        remote.register_invoice("INV-OLD");
        let d = detector(remote);

        let check = d
            .check_batch(
                &strings(&["INV-NEW", "inv-old", "INV-NEW"]),
                &strings(&["SN-099", "SN-100", "SN-101"]),
            )
            .await
            .unwrap();
        assert_eq!(check.existing_invoices, ["inv-old"]);
        assert_eq!(check.existing_serials, ["SN-100"]);
        assert!(check.duplicates_within_batch.is_empty());
        assert!(!check.is_clean());
        assert!(check.to_string().contains("SN-100"));
    }

    #[tokio::test]
    async fn batch_check_finds_repeats_within_batch() {
        let remote = Arc::new(FakeRemote::new());
        let d = detector(remote.clone());

        let check = d
            .check_batch(
                &strings(&["INV-1"]),
                &strings(&["SN-1", "SN-2", "sn-1", "SN-1", "SN-3", "sn-3"]),
            )
            .await
            .unwrap();
        assert_eq!(check.duplicates_within_batch, ["sn-1", "sn-3"]);
        assert!(check.existing_serials.is_empty());

        // Values are de-duplicated before they are sent.
        let sent = remote.exists_calls();
        let serial_query = sent.iter().find(|(k, _)| *k == ExistsKind::Serial).unwrap();
        assert_eq!(serial_query.1, strings(&["SN-1", "SN-2", "SN-3"]));
    }

    #[tokio::test]
    async fn empty_batch_skips_remote() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_unreachable(true);
        let d = detector(remote);
        let check = d.check_batch(&[], &[]).await.unwrap();
        assert!(check.is_clean());
    }
}
