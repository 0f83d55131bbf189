use crate::error::RpcError;

/// A transport-level inbound stream of raw, length-delimited message bytes.
pub trait RawRecvStream {
    fn recv(&mut self) -> Result<Option<Vec<u8>>, RpcError>;
}

/// A transport-level outbound stream of raw, length-delimited message bytes.
pub trait RawSendStream {
    fn send(&mut self, value: Vec<u8>) -> Result<(), RpcError>;
    fn close(&mut self) -> Result<(), RpcError>;
}

/// A deferred raw response, as returned by a client-streaming call once the
/// caller has finished sending.
pub struct RawFuture(pub Box<dyn FnOnce() -> Result<Vec<u8>, RpcError> + Send>);

impl RawFuture {
    pub fn new(f: impl FnOnce() -> Result<Vec<u8>, RpcError> + Send + 'static) -> Self {
        RawFuture(Box::new(f))
    }

    pub fn wait(self) -> Result<Vec<u8>, RpcError> {
        (self.0)()
    }
}
