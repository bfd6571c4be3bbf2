//! Error types for the polling engine

/// Errors surfaced by poll operations
///
/// Fetch and merge failures reach registered listeners through
/// `on_error`. Sync failures are logged and swallowed (the sync engine
/// has no listener interface); see [`crate::Poll::sync_with_remote`].
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The strategy's fetch returned an error
    #[error("fetch failed")]
    Fetch {
        #[source]
        source: anyhow::Error,
    },

    /// The strategy's merge returned an error
    ///
    /// A merge failure supersedes the fetch outcome: the fetched items
    /// never reach the store.
    #[error("merge failed")]
    Merge {
        #[source]
        source: anyhow::Error,
    },

    /// A step of the remote sync failed
    #[error("sync failed")]
    Sync {
        #[source]
        source: anyhow::Error,
    },

    /// An optional strategy capability was not provided
    #[error("{what} is not implemented")]
    NotImplemented { what: &'static str },
}
