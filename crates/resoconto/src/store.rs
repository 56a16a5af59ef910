use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::types::Report;

/// Capacity of the snapshot channel; slow observers skip ahead when they lag
const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// In-memory report collection shared by the poller, the confirm flow and
/// any observers rendering live status.
///
/// Cloning yields another handle to the same collection. Merges are keyed by
/// id and the last snapshot written wins.
#[derive(Clone)]
pub struct ReportStore {
    reports: Arc<RwLock<Vec<Report>>>,
    snapshots: broadcast::Sender<Report>,
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportStore {
    pub fn new() -> Self {
        let (snapshots, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            reports: Arc::new(RwLock::new(Vec::new())),
            snapshots,
        }
    }

    /// Replace the report with the same id, or prepend it if unknown
    pub async fn merge(&self, snapshot: Report) {
        {
            let mut reports = self.reports.write().await;
            match reports.iter_mut().find(|r| r.id == snapshot.id) {
                Some(existing) => *existing = snapshot.clone(),
                None => reports.insert(0, snapshot.clone()),
            }
        }
        debug!(id = %snapshot.id, status = %snapshot.status, "Merged report snapshot");

        // No receivers is fine
        let _ = self.snapshots.send(snapshot);
    }

    /// Swap the whole collection, e.g. after a list fetch
    pub async fn replace_all(&self, reports: Vec<Report>) {
        *self.reports.write().await = reports;
    }

    pub async fn get(&self, id: &str) -> Option<Report> {
        self.reports.read().await.iter().find(|r| r.id == id).cloned()
    }

    pub async fn list(&self) -> Vec<Report> {
        self.reports.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.reports.read().await.is_empty()
    }

    /// Clear the confirmed flag locally. Returns true if it was set.
    pub async fn mark_unconfirmed(&self, id: &str) -> bool {
        let updated = {
            let mut reports = self.reports.write().await;
            match reports.iter_mut().find(|r| r.id == id && r.confirmed) {
                Some(report) => {
                    report.confirmed = false;
                    Some(report.clone())
                }
                None => None,
            }
        };

        match updated {
            Some(report) => {
                debug!(id = %id, "Report unconfirmed by edit");
                let _ = self.snapshots.send(report);
                true
            }
            None => false,
        }
    }

    /// Receive every snapshot merged from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Report> {
        self.snapshots.subscribe()
    }
}
