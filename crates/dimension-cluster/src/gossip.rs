//! Gossip dissemination
//!
//! Changed membership records accumulate in a buffer keyed by node id,
//! so a burst of changes about one peer collapses to its newest record.
//! A single task drains the buffer after a debounce window and pushes the
//! batch to every neighbour. If any neighbour push fails, the whole batch
//! is requeued and retried on a linear interval, merged with whatever
//! arrived in the meantime.

use crate::transport::{Neighbours, Transport};
use crate::wire::{GossipPush, MemberRecord, PATH_CLUSTER};
use bytes::Bytes;
use dimension_core::{NodeId, TimeProvider, GOSSIP_BATCH_COUNT_MAX, GOSSIP_RETRY_INTERVAL_MS};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tracing::{debug, warn};

/// Debounced gossip pusher
#[derive(Debug)]
pub struct Disseminator {
    local: NodeId,
    buffer: Mutex<HashMap<NodeId, MemberRecord>>,
    notify: Notify,
    transport: Arc<dyn Transport>,
    neighbours: Arc<dyn Neighbours>,
    time: Arc<dyn TimeProvider>,
    debounce_ms: u64,
    rpc_timeout_ms: u64,
}

impl Disseminator {
    /// Create a disseminator for the given node
    pub fn new(
        local: NodeId,
        transport: Arc<dyn Transport>,
        neighbours: Arc<dyn Neighbours>,
        time: Arc<dyn TimeProvider>,
        debounce_ms: u64,
        rpc_timeout_ms: u64,
    ) -> Arc<Self> {
        assert!(debounce_ms > 0, "debounce must be positive");
        assert!(rpc_timeout_ms > 0, "RPC timeout must be positive");

        Arc::new(Self {
            local,
            buffer: Mutex::new(HashMap::new()),
            notify: Notify::new(),
            transport,
            neighbours,
            time,
            debounce_ms,
            rpc_timeout_ms,
        })
    }

    /// Buffer a record for dissemination
    ///
    /// A newer record for the same node replaces the buffered one.
    pub fn buffer_record(&self, record: MemberRecord) {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        buffer.insert(record.id.clone(), record);
        drop(buffer);
        self.notify.notify_one();
    }

    /// Number of records awaiting dissemination
    pub fn pending_count(&self) -> usize {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Drain up to one batch from the buffer
    fn take_batch(&self) -> Vec<MemberRecord> {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        let keys: Vec<NodeId> = buffer.keys().take(GOSSIP_BATCH_COUNT_MAX).cloned().collect();
        keys.iter().filter_map(|k| buffer.remove(k)).collect()
    }

    /// Put a failed batch back, never clobbering newer buffered records
    fn requeue(&self, batch: Vec<MemberRecord>) {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        for record in batch {
            buffer.entry(record.id.clone()).or_insert(record);
        }
    }

    /// Push one batch to every neighbour; true if all pushes succeeded
    ///
    /// Each send runs under the RPC timeout; a hung neighbour counts as a
    /// failed push and the batch takes the retry path.
    async fn push_batch(&self, batch: &[MemberRecord]) -> bool {
        let push = GossipPush {
            cluster: batch.to_vec(),
        };
        let body = match serde_json::to_vec(&push) {
            Ok(body) => Bytes::from(body),
            Err(error) => {
                warn!(%error, "failed to encode gossip push, keeping batch");
                return false;
            }
        };

        let mut all_ok = true;
        for peer in self.neighbours.neighbours().await {
            if peer == self.local {
                continue;
            }
            let send = self.transport.send(&peer, PATH_CLUSTER, body.clone());
            match tokio::time::timeout(Duration::from_millis(self.rpc_timeout_ms), send).await {
                Ok(Ok(_)) => {
                    debug!(%peer, records = batch.len(), "gossip pushed");
                }
                Ok(Err(error)) => {
                    warn!(%peer, %error, "gossip push failed");
                    all_ok = false;
                }
                Err(_) => {
                    warn!(%peer, timeout_ms = self.rpc_timeout_ms, "gossip push timed out");
                    all_ok = false;
                }
            }
        }
        all_ok
    }

    /// Run the dissemination loop until shutdown
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        loop {
            // Wait for the first change, then debounce to coalesce a burst.
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = shutdown.recv() => return,
            }
            tokio::select! {
                _ = self.time.sleep_ms(self.debounce_ms) => {}
                _ = shutdown.recv() => return,
            }

            loop {
                let batch = self.take_batch();
                if batch.is_empty() {
                    break;
                }
                if self.push_batch(&batch).await {
                    if self.pending_count() == 0 {
                        break;
                    }
                    // More arrived while pushing; debounce again.
                    tokio::select! {
                        _ = self.time.sleep_ms(self.debounce_ms) => {}
                        _ = shutdown.recv() => return,
                    }
                } else {
                    self.requeue(batch);
                    tokio::select! {
                        _ = self.time.sleep_ms(GOSSIP_RETRY_INTERVAL_MS) => {}
                        _ = shutdown.recv() => return,
                    }
                }
            }
        }
    }
}
