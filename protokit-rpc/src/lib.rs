//! Transport-agnostic RPC vocabulary shared by every generated service stub.
//!
//! The core protocol toolkit has no notion of a network; this crate defines
//! the capability set a transport plugs into and generated stubs call
//! through — statuses, errors, a byte-oriented stream/channel abstraction,
//! and the typed wrappers that turn it into `T`-shaped calls.

mod channel;
mod context;
mod descriptor;
mod error;
mod status;
mod stream;
mod typed;

pub use channel::Channel;
pub use context::RpcContext;
pub use descriptor::{MethodDescriptor, ServiceDescriptor};
pub use error::RpcError;
pub use status::{Status, StatusCode};
pub use stream::{RawFuture, RawRecvStream, RawSendStream};
pub use typed::{RpcFuture, TypedRecvStream, TypedSendStream};
