use crate::context::RpcContext;
use crate::descriptor::MethodDescriptor;
use crate::error::RpcError;
use crate::stream::{RawFuture, RawRecvStream, RawSendStream};

/// The one abstraction a transport must implement. Every operation carries
/// raw, already-encoded message bytes — typed encode/decode lives in the
/// generated client stub, not here (§4.6).
pub trait Channel: Send + Sync {
    fn unary_call(&self, method: &MethodDescriptor, ctx: &RpcContext, request: Vec<u8>) -> Result<Vec<u8>, RpcError>;

    fn server_stream_call(
        &self,
        method: &MethodDescriptor,
        ctx: &RpcContext,
        request: Vec<u8>,
    ) -> Result<Box<dyn RawRecvStream>, RpcError>;

    fn client_stream_call(&self, method: &MethodDescriptor, ctx: &RpcContext) -> Result<(Box<dyn RawSendStream>, RawFuture), RpcError>;

    fn bidi_stream_call(
        &self,
        method: &MethodDescriptor,
        ctx: &RpcContext,
    ) -> Result<(Box<dyn RawSendStream>, Box<dyn RawRecvStream>), RpcError>;
}
