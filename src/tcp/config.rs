//! TCP 参数

use serde::{Deserialize, Serialize};

use super::wrap32::Wrap32;

/// 接收窗口通告上限（16 位窗口字段）
pub const MAX_WINDOW_SIZE: u64 = u16::MAX as u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpConfig {
    /// 初始 RTO（毫秒）
    pub rt_timeout_ms: u64,
    /// 单个段的最大载荷（字节）
    pub max_payload_size: u64,
    /// 发送缓冲容量（字节）
    pub send_capacity: u64,
    /// 接收缓冲容量（字节）
    pub recv_capacity: u64,
    /// 固定 ISN；为空时由调用方决定
    pub isn: Option<Wrap32>,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            rt_timeout_ms: 1000,
            max_payload_size: 1000,
            send_capacity: 64_000,
            recv_capacity: 64_000,
            isn: None,
        }
    }
}
