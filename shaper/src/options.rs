/// Limits applied by the engine to every attached device.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// The maximum number of shapers in a single `set` batch, or handles in a `delete` batch.
    pub max_batch_size: usize,
    /// The maximum number of detached groups a device may hold at once.
    pub max_detached_groups: usize,
}

impl EngineOptions {
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn with_max_detached_groups(mut self, max_detached_groups: usize) -> Self {
        self.max_detached_groups = max_detached_groups;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { max_batch_size: 1024, max_detached_groups: 64 }
    }
}
