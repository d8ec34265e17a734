use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transport/auth failure in the post source. Recovered per-source by the
    /// orchestrator and surfaced only in that source's report entry.
    #[error("post source error: {0}")]
    Source(String),

    /// Storage failure. Fatal to the current run; retry policy belongs to the
    /// external scheduler.
    #[error("store error: {0}")]
    Store(String),
}
