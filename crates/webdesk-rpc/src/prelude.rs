//! Prelude module - commonly used types for convenient import.
//!
//! Use `use webdesk_rpc::prelude::*;` to import all essential types.

pub use crate::{FrameError, FrameResult};

pub use crate::{Frame, PROTOCOL_TAG, Reply, Request, Role};

pub use crate::{FrameSender, HostLink, InboundFrame, ProcessChannel, duplex};

pub use crate::{DEFAULT_CALL_TIMEOUT, RpcClient};
