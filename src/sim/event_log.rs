//! 仿真事件记录
//!
//! 结构化的 JSON 事件（而不是解析文本日志），仿真结束后整体写出。

use serde::{Deserialize, Serialize};

/// 帧的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Ipv4,
    Arp,
    Other,
}

impl FrameKind {
    pub fn from_ether_type(ether_type: u16) -> Self {
        match ether_type {
            crate::wire::EthernetHeader::TYPE_IPV4 => FrameKind::Ipv4,
            crate::wire::EthernetHeader::TYPE_ARP => FrameKind::Arp,
            _ => FrameKind::Other,
        }
    }
}

/// 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimEventKind {
    /// 主机发出一个调度好的数据报
    HostSend { host: String, dst: String },
    /// 一帧被交给同一以太网段上的某个接口
    FrameDelivered {
        from: String,
        to: String,
        frame_kind: FrameKind,
        bytes: usize,
        broadcast: bool,
    },
    /// 数据报到达目的主机
    DatagramArrived {
        host: String,
        src: String,
        dst: String,
        ttl: u8,
        bytes: usize,
    },
}

/// 一个可回放的事件（JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimEvent {
    /// 仿真时间（毫秒，和 `SimTime.0` 同口径）
    pub t_ms: u64,
    #[serde(flatten)]
    pub kind: SimEventKind,
}

/// 一个简单的事件收集器（存内存，仿真结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<SimEvent>,
}

impl EventLog {
    pub fn push(&mut self, t_ms: u64, kind: SimEventKind) {
        self.events.push(SimEvent { t_ms, kind });
    }
}
