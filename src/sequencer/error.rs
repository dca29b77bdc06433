#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("sequence has no steps")]
    EmptySequence,

    #[error("grid has no tracks")]
    NoTracks,

    #[error("track {0} has no sample bound")]
    UnboundTrack(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("invalid grid state: {0}")]
    InvalidGridState(#[from] GridError),

    #[error("could not spawn scheduler thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// A single `play` call that the sample player could not accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("audio command queue is full")]
    QueueFull,

    #[error("audio engine is not running")]
    Disconnected,
}
