//! Bounded in-memory history of finished tasks

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;

use hangar_core::types::AgentExecutionResult;

/// Maximum number of task results kept (least recently used are evicted)
pub const MAX_TASK_HISTORY: usize = 1000;

/// Task results keyed by task id
#[derive(Clone)]
pub struct TaskHistory {
    tasks: Arc<Mutex<LruCache<String, AgentExecutionResult>>>,
}

impl TaskHistory {
    pub fn new() -> Self {
        Self::with_capacity(NonZeroUsize::MIN.saturating_add(MAX_TASK_HISTORY - 1))
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub async fn record(&self, result: AgentExecutionResult) {
        self.tasks.lock().await.put(result.task_id.clone(), result);
    }

    pub async fn get(&self, task_id: &str) -> Option<AgentExecutionResult> {
        self.tasks.lock().await.get(task_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }
}

impl Default for TaskHistory {
    fn default() -> Self {
        Self::new()
    }
}
