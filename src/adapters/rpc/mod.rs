//! Relational RPC backend: wire protocol, server-side dispatch and the
//! client-side store.

mod client;
mod dispatch;
mod protocol;

pub use client::RpcStore;
pub use dispatch::dispatch;
pub use protocol::{RpcRequest, RpcResponse, RPC_SECRET_HEADER};
