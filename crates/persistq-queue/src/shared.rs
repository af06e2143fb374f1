//! Process-wide default queue.
//!
//! Prefer constructing and passing [`JobQueue`] instances explicitly; the shared
//! instance exists for applications that want a single queue without plumbing.

use tokio::sync::OnceCell;
use tracing::info;

use persistq_config::Config;
use persistq_protocols::QueueError;

use crate::queue::JobQueue;

static SHARED: OnceCell<JobQueue> = OnceCell::const_new();

impl JobQueue {
    /// The shared queue, opened with the default configuration on first use.
    pub async fn shared() -> Result<&'static JobQueue, QueueError> {
        Self::shared_with(&Config::default()).await
    }

    /// The shared queue, opened with `config` if it does not exist yet.
    ///
    /// Once initialized, later calls return the existing queue and ignore
    /// their configuration.
    pub async fn shared_with(config: &Config) -> Result<&'static JobQueue, QueueError> {
        SHARED
            .get_or_try_init(|| async {
                info!("Initializing shared job queue");
                JobQueue::open(config).await
            })
            .await
    }
}
