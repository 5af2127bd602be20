//! TCP 接收方
//!
//! 把收到的段转换为对重组器的插入，并生成确认号与窗口通告。

use tracing::{debug, trace};

use super::config::MAX_WINDOW_SIZE;
use super::message::{TcpReceiverMessage, TcpSenderMessage};
use super::wrap32::Wrap32;
use crate::stream::{ByteStream, Reader, Reassembler, Writer};

#[derive(Debug)]
pub struct TcpReceiver {
    reassembler: Reassembler,
    /// 第一个 SYN 的序号（ISN）
    zero_point: Option<Wrap32>,
}

impl TcpReceiver {
    pub fn new(reassembler: Reassembler) -> Self {
        Self {
            reassembler,
            zero_point: None,
        }
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self::new(Reassembler::new(ByteStream::new(capacity)))
    }

    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// 输出流（应用从这里读取数据）
    pub fn output(&self) -> &ByteStream {
        self.reassembler.output()
    }

    pub fn reader(&mut self) -> &mut impl Reader {
        self.reassembler.reader()
    }

    pub fn receive(&mut self, msg: TcpSenderMessage) {
        if msg.rst {
            debug!("收到 RST，输出流标记为出错");
            self.reassembler.output_mut().set_error();
            return;
        }
        if msg.syn && self.zero_point.is_none() {
            debug!(isn = %msg.seqno, "收到 SYN，确定序号原点");
            self.zero_point = Some(msg.seqno);
        }
        let Some(zero_point) = self.zero_point else {
            trace!("尚未收到 SYN，丢弃数据段");
            return;
        };

        let checkpoint = self.output().bytes_pushed() + 1;
        let abs_seqno = (msg.seqno + msg.syn as u32).unwrap(zero_point, checkpoint);
        // 绝对序号 0 是 SYN 自身，不可能承载数据
        let Some(stream_index) = abs_seqno.checked_sub(1) else {
            trace!(seqno = %msg.seqno, "数据段落在 SYN 的位置上，丢弃");
            return;
        };
        self.reassembler.insert(stream_index, msg.payload, msg.fin);
    }

    pub fn send(&self) -> TcpReceiverMessage {
        let output = self.output();
        let ackno = self.zero_point.map(|zero_point| {
            Wrap32::wrap(
                output.bytes_pushed() + 1 + output.is_closed() as u64,
                zero_point,
            )
        });
        TcpReceiverMessage {
            ackno,
            window_size: output.available_capacity().min(MAX_WINDOW_SIZE) as u16,
            rst: output.has_error(),
        }
    }
}
