//! Eager snapshot refresh worker.
//!
//! In eager mode a single named thread re-runs the recompute off the
//! read path whenever a mutation lands. The nudge channel is bounded at
//! one slot: a burst of invalidations collapses into the token already
//! queued, so the worker never falls behind a mutation storm.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender, TrySendError};

use crate::rank::RankCache;

pub(crate) struct RefreshWorker {
    tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshWorker {
    pub(crate) fn start(rank: Arc<RankCache>) -> Self {
        let (tx, rx) = bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("trustgraph-refresh".to_string())
            .spawn(move || {
                while rx.recv().is_ok() {
                    // A failed recompute is retried on the next nudge or
                    // served lazily by the next reader; nothing to do here.
                    let _ = rank.get_snapshot();
                }
            })
            .expect("failed to spawn trustgraph refresh worker");

        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Request a refresh. Coalesces with any already-pending request.
    pub(crate) fn nudge(&self) {
        if let Some(tx) = &self.tx {
            match tx.try_send(()) {
                Ok(()) | Err(TrySendError::Full(())) => {}
                Err(TrySendError::Disconnected(())) => {}
            }
        }
    }
}

impl Drop for RefreshWorker {
    fn drop(&mut self) {
        // Close the channel so the worker's recv() loop exits.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;
    use crate::composite::CompositeScorer;
    use crate::edge::EdgeKind;
    use crate::graph::GraphStore;
    use crate::solver::InfluenceSolver;
    use std::time::Duration;

    #[test]
    fn burst_of_nudges_leaves_cache_fresh() {
        let graph = Arc::new(GraphStore::new());
        let rank = Arc::new(RankCache::new(
            Arc::clone(&graph),
            InfluenceSolver::default(),
            CompositeScorer::default(),
        ));
        let worker = RefreshWorker::start(Arc::clone(&rank));

        for i in 0..10 {
            graph
                .record_interaction(
                    AgentId::new(format!("a{i}")).unwrap(),
                    AgentId::new(format!("b{i}")).unwrap(),
                    true,
                )
                .unwrap();
            rank.invalidate();
            worker.nudge();
        }
        graph
            .add_edge(
                EdgeKind::Trust,
                AgentId::new("a0").unwrap(),
                AgentId::new("b1").unwrap(),
                None,
            )
            .unwrap();
        rank.invalidate();
        worker.nudge();

        // Give the worker a moment, then verify the cache converged on
        // the final graph version (get_snapshot self-heals regardless).
        thread::sleep(Duration::from_millis(50));
        let snap = rank.get_snapshot().unwrap();
        assert_eq!(snap.version, graph.version());
        drop(worker);
    }

    #[test]
    fn drop_joins_the_worker() {
        let graph = Arc::new(GraphStore::new());
        let rank = Arc::new(RankCache::new(
            graph,
            InfluenceSolver::default(),
            CompositeScorer::default(),
        ));
        let worker = RefreshWorker::start(rank);
        worker.nudge();
        drop(worker); // must not hang
    }
}
