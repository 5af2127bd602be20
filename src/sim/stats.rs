//! 统计信息
//!
//! 定义网络仿真统计数据结构。

use serde::Serialize;

/// 网络统计信息
#[derive(Debug, Default, Clone, Serialize)]
pub struct Stats {
    pub frames_delivered: u64,
    pub frame_bytes_delivered: u64,
    pub datagrams_sent: u64,
    pub datagrams_delivered: u64,
}
