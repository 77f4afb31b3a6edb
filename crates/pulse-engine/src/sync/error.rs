/// Failure reported by the fence synchronizer.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A finite wait elapsed before the GPU reached the target value.
    #[error("timed out waiting for fence value {target} (completed: {completed})")]
    Timeout { target: u64, completed: u64 },

    /// The backend failed to enqueue a signal or to wait on the device.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
