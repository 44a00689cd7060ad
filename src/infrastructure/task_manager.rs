use tokio::task::JoinHandle;

/// Tracks background tasks spawned on behalf of a client
pub struct TaskManager {
    handles: Vec<JoinHandle<()>>,
}

impl TaskManager {
    /// Create a new empty task manager
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Spawn a task and track it
    pub fn spawn<F>(&mut self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.handles.push(handle);
    }

    /// Wait for every tracked task to finish on its own. Returns how many
    /// tasks panicked.
    pub async fn join_all(&mut self) -> usize {
        let mut panicked = 0;
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await
                && e.is_panic()
            {
                tracing::error!("Background task panicked: {}", e);
                panicked += 1;
            }
        }
        panicked
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
