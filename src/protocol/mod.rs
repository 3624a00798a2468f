//! The wire protocol: frame types and their length-prefixed codec.

mod codec;
mod frame;

pub use codec::{
    read_reply, read_request, write_reply, write_request, MAX_FRAME_SIZE,
};
pub use frame::{Action, ErrorCode, Reply, Request};
