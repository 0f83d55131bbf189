use std::marker::PhantomData;

use protokit::Message;

use crate::error::RpcError;
use crate::stream::{RawFuture, RawRecvStream, RawSendStream};

fn decode_response<T: Message + Default>(bytes: &[u8]) -> Result<T, RpcError> {
    T::decode(bytes).map_err(RpcError::from)
}

/// Decodes each item off a [`RawRecvStream`] into `T` — the "typed
/// serialization wrapper" generated client stubs hand back for a
/// server-streaming or bidi call (§4.6).
pub struct TypedRecvStream<T> {
    raw: Box<dyn RawRecvStream>,
    _marker: PhantomData<T>,
}

impl<T: Message + Default> TypedRecvStream<T> {
    pub fn new(raw: Box<dyn RawRecvStream>) -> Self {
        TypedRecvStream { raw, _marker: PhantomData }
    }

    pub fn recv(&mut self) -> Result<Option<T>, RpcError> {
        match self.raw.recv()? {
            Some(bytes) => Ok(Some(decode_response(&bytes)?)),
            None => Ok(None),
        }
    }
}

/// Encodes each item before handing it to a [`RawSendStream`].
pub struct TypedSendStream<T> {
    raw: Box<dyn RawSendStream>,
    _marker: PhantomData<T>,
}

impl<T: Message> TypedSendStream<T> {
    pub fn new(raw: Box<dyn RawSendStream>) -> Self {
        TypedSendStream { raw, _marker: PhantomData }
    }

    pub fn send(&mut self, value: T) -> Result<(), RpcError> {
        self.raw.send(value.encode_to_vec())
    }

    pub fn close(&mut self) -> Result<(), RpcError> {
        self.raw.close()
    }
}

/// A deferred, typed response for a client-streaming call.
pub struct RpcFuture<T> {
    raw: RawFuture,
    _marker: PhantomData<T>,
}

impl<T: Message + Default> RpcFuture<T> {
    pub fn new(raw: RawFuture) -> Self {
        RpcFuture { raw, _marker: PhantomData }
    }

    pub fn wait(self) -> Result<T, RpcError> {
        decode_response(&self.raw.wait()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneShotRecv(Option<Vec<u8>>);
    impl RawRecvStream for OneShotRecv {
        fn recv(&mut self) -> Result<Option<Vec<u8>>, RpcError> {
            Ok(self.0.take())
        }
    }

    struct CollectingSend(Vec<Vec<u8>>, bool);
    impl RawSendStream for CollectingSend {
        fn send(&mut self, value: Vec<u8>) -> Result<(), RpcError> {
            self.0.push(value);
            Ok(())
        }
        fn close(&mut self) -> Result<(), RpcError> {
            self.1 = true;
            Ok(())
        }
    }

    #[derive(Default, Debug, PartialEq)]
    struct Echo(protokit::UnknownFieldSet);
    impl Message for Echo {
        fn encode_raw(&self, buf: &mut impl bytes::BufMut) {
            self.0.encode_raw(buf)
        }
        fn merge_field(
            &mut self,
            tag: u32,
            wire_type: protokit::WireType,
            buf: &mut impl bytes::Buf,
            ctx: protokit::DecodeContext,
        ) -> Result<(), protokit::DecodeError> {
            self.0.merge_field(tag, wire_type, buf, ctx)
        }
        fn encoded_len(&self) -> usize {
            self.0.encoded_len()
        }
        fn clear(&mut self) {
            self.0.clear()
        }
    }

    #[test]
    fn typed_recv_stream_decodes_each_item() {
        let mut recv = TypedRecvStream::<Echo>::new(Box::new(OneShotRecv(Some(Vec::new()))));
        let first = recv.recv().unwrap();
        assert_eq!(first, Some(Echo::default()));
        let second = recv.recv().unwrap();
        assert_eq!(second, None);
    }

    #[test]
    fn typed_send_stream_encodes_and_closes() {
        let mut send = TypedSendStream::<Echo>::new(Box::new(CollectingSend(Vec::new(), false)));
        send.send(Echo::default()).unwrap();
        send.close().unwrap();
    }
}
