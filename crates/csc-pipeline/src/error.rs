use thiserror::Error;

/// Error surfaced by the [`crate::connection::Connection`] collaborator.
///
/// The pipeline does not attempt to interpret these beyond recognizing
/// disconnection; wire-level detail belongs to the connection implementation.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The connection is no longer usable.
    #[error("connection disconnected")]
    Disconnected,

    /// The server replied with an error frame.
    #[error("server error: {0}")]
    Server(String),

    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors the pipeline can surface to a caller of [`crate::pipeline::InvalidationPipeline::execute_command`]
/// or [`crate::pipeline::InvalidationPipeline::start`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The connection failed; the attempted cache insert, if any, was skipped.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The pipeline's configuration is incompatible with the connection,
    /// e.g. caching was requested over a connection that has not
    /// negotiated RESP3.
    #[error(transparent)]
    Configuration(#[from] csc_store::ConfigurationError),
}

impl PipelineError {
    /// Whether this error represents a disconnection.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, PipelineError::Connection(ConnectionError::Disconnected))
    }
}
