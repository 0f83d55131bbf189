/// Per-call context forwarded from a generated stub down to the `Channel`.
///
/// The core has no notion of time or cancellation (§5); it only carries
/// these values through so a transport can act on them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RpcContext {
    /// Deadline as nanoseconds since the transport's own epoch, if any.
    pub deadline_ns: Option<u64>,
}

impl RpcContext {
    pub fn new() -> Self {
        RpcContext::default()
    }

    pub fn with_deadline_ns(deadline_ns: u64) -> Self {
        RpcContext {
            deadline_ns: Some(deadline_ns),
        }
    }
}
