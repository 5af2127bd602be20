//! 网络层模块
//!
//! 以太网/ARP 接口、最长前缀匹配路由器，以及接口向外发帧用的 `OutputPort`。

mod interface;
mod port;
mod router;

pub use interface::{ARP_CACHE_TTL_MS, ARP_REQUEST_TTL_MS, NetworkInterface};
pub use port::{FrameQueue, OutputPort};
pub use router::{RouteEntry, Router};
