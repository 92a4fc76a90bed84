use tokio::task::{JoinError, JoinSet};

/// Join barrier over independent tasks: every task is awaited, and one
/// failing or panicking task never cancels the others.
pub struct TaskManager<R: Send + 'static> {
    tasks: JoinSet<R>,
}

impl<R: Send + 'static> Default for TaskManager<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Send + 'static> TaskManager<R> {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
        }
    }

    pub fn spawn<F>(&mut self, future: F)
    where
        F: std::future::Future<Output = R> + Send + 'static,
    {
        self.tasks.spawn(future);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Results in completion order.
    pub async fn settle(mut self) -> Vec<Result<R, JoinError>> {
        let mut results = Vec::with_capacity(self.tasks.len());
        while let Some(res) = self.tasks.join_next().await {
            results.push(res);
        }
        results
    }
}
