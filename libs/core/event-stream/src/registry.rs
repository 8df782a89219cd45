//! Stream definitions.

/// Trait for domain-specific stream definitions.
///
/// Producers are built from a `StreamDef` so the stream name and trim length
/// live in one place.
///
/// ```rust,ignore
/// pub struct UserEventStream;
///
/// impl StreamDef for UserEventStream {
///     const STREAM_NAME: &'static str = "user-events-topic";
/// }
/// ```
pub trait StreamDef: Send + Sync {
    /// The Redis stream name.
    const STREAM_NAME: &'static str;

    /// Approximate maximum stream length (`MAXLEN ~`).
    const MAX_LENGTH: i64 = 100_000;
}
