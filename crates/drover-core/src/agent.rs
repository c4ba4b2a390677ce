//! Connection contract for remote agents.

/// An established, ready-to-use connection to one remote agent.
///
/// The gathering core treats connections as opaque: it never opens, closes,
/// or reconfigures them. Lifecycle belongs to the embedding application,
/// which hands connections to the pool and gets them back implicitly when
/// their outcomes have been emitted.
///
/// A single connection value is only ever used by one worker at a time, but
/// different connections are gathered concurrently, so implementations must
/// be `Send + Sync`.
pub trait AgentConnection: Send + Sync {
    /// Stable host identifier for this agent.
    ///
    /// Used as the `agent_host` fallback tag on gathered rows and as context
    /// in gather errors, so it should stay stable for the life of the
    /// connection.
    fn host(&self) -> &str;
}
