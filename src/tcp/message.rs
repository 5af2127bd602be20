//! TCP 段的发送方/接收方视图

use serde::{Deserialize, Serialize};

use super::wrap32::Wrap32;

/// 发送方发出的段：序号、SYN、载荷、FIN、RST。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpSenderMessage {
    pub seqno: Wrap32,
    pub syn: bool,
    pub payload: Vec<u8>,
    pub fin: bool,
    pub rst: bool,
}

impl TcpSenderMessage {
    /// 占用的序号个数：SYN + 载荷长度 + FIN
    pub fn sequence_length(&self) -> u64 {
        self.syn as u64 + self.payload.len() as u64 + self.fin as u64
    }
}

/// 接收方回给发送方的反馈：确认号与窗口。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpReceiverMessage {
    /// 收到 SYN 之前为空
    pub ackno: Option<Wrap32>,
    pub window_size: u16,
    pub rst: bool,
}
