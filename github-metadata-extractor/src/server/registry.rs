use super::models::RunStatus;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Number of finished runs kept by [`RunRegistry::new`].
pub const DEFAULT_FINISHED_RUNS: usize = 1024;

#[derive(Debug, Default)]
struct Runs {
    statuses: HashMap<String, RunStatus>,
    /// Finished workflow ids, oldest first.
    finished: VecDeque<String>,
}

impl Runs {
    fn forget_finished(&mut self, workflow_id: &str) {
        self.finished.retain(|id| id != workflow_id);
    }
}

/// Status of runs started by this process, keyed by workflow id.
///
/// Running entries are always kept. Once more than `capacity` runs have
/// finished, the oldest finished entries are dropped.
#[derive(Debug, Clone)]
pub struct RunRegistry {
    runs: Arc<RwLock<Runs>>,
    capacity: usize,
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_FINISHED_RUNS)
    }
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that keeps at most `capacity` finished runs.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            runs: Arc::default(),
            capacity,
        }
    }

    /// Marks `workflow_id` as running.
    ///
    /// Returns `false` without changing anything if a run with that id is
    /// still in flight. Finished runs are replaced.
    pub async fn try_begin(&self, workflow_id: &str) -> bool {
        let mut runs = self.runs.write().await;
        if runs
            .statuses
            .get(workflow_id)
            .is_some_and(RunStatus::is_running)
        {
            return false;
        }
        runs.forget_finished(workflow_id);
        runs.statuses.insert(workflow_id.to_string(), RunStatus::Running);
        true
    }

    /// Records the final status of a run, evicting the oldest finished runs
    /// past capacity.
    pub async fn finish(&self, workflow_id: &str, status: RunStatus) {
        let mut runs = self.runs.write().await;
        runs.forget_finished(workflow_id);
        runs.statuses.insert(workflow_id.to_string(), status);
        runs.finished.push_back(workflow_id.to_string());

        while runs.finished.len() > self.capacity {
            if let Some(evicted) = runs.finished.pop_front() {
                runs.statuses.remove(&evicted);
            }
        }
    }

    pub async fn get(&self, workflow_id: &str) -> Option<RunStatus> {
        self.runs.read().await.statuses.get(workflow_id).cloned()
    }
}
