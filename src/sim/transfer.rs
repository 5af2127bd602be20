//! 单向 TCP 传输仿真
//!
//! 一个 `TcpSender` 经由逻辑链路把确定性的字节序列发给 `TcpReceiver`，链路每
//! 隔 N 个段丢一个。确认不丢失。用于观察重传、退避与窗口行为。

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::stream::{Reader, Writer, read};
use crate::tcp::{SenderState, TcpConfig, TcpReceiver, TcpSender, TcpSenderMessage, Wrap32};

/// 配置中没有 ISN 时使用；靠近 2^32，传输会跨过序号回绕。
const FALLBACK_ISN: Wrap32 = Wrap32::new(u32::MAX - 1_000);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOpts {
    /// 应用要发送的字节数
    pub data_bytes: u64,
    pub tcp: TcpConfig,
    /// 每 N 个发出的段丢一个（0 表示不丢）
    pub loss_every: u64,
    pub tick_ms: u64,
    pub until_ms: u64,
}

impl Default for TransferOpts {
    fn default() -> Self {
        Self {
            data_bytes: 100_000,
            tcp: TcpConfig::default(),
            loss_every: 0,
            tick_ms: 10,
            until_ms: 600_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferReport {
    pub data_bytes: u64,
    pub bytes_delivered: u64,
    pub segments_sent: u64,
    pub segments_dropped: u64,
    pub retransmissions: u64,
    pub max_consecutive_retransmissions: u64,
    /// 接收方读到 EOF 且发送方所有序号都已被确认
    pub finished: bool,
    /// 收到的字节与发送的完全一致
    pub data_ok: bool,
    pub elapsed_ms: u64,
}

/// 第 `i` 个字节的内容
fn pattern_byte(i: u64) -> u8 {
    (i % 251) as u8
}

/// 运行一次传输，直到双方完成或到达 `until_ms`。
pub fn run_transfer(opts: &TransferOpts) -> TransferReport {
    let tick_ms = opts.tick_ms.max(1);
    let mut sender = TcpSender::with_config(&opts.tcp, FALLBACK_ISN);
    let mut receiver = TcpReceiver::with_capacity(opts.tcp.recv_capacity);
    info!(
        data_bytes = opts.data_bytes,
        isn = %sender.isn(),
        loss_every = opts.loss_every,
        "▶️  开始 TCP 传输"
    );

    let mut report = TransferReport {
        data_bytes: opts.data_bytes,
        ..TransferReport::default()
    };
    let mut written = 0u64;
    let mut received = Vec::new();
    let mut now = 0u64;
    // 上一轮超时产生的重传段，本轮与新段一起上路
    let mut retransmits: Vec<TcpSenderMessage> = Vec::new();

    loop {
        let writer = sender.writer();
        let room = writer.available_capacity().min(opts.data_bytes - written);
        if room > 0 {
            writer.push((written..written + room).map(pattern_byte).collect::<Vec<u8>>());
            written += room;
        }
        if written == opts.data_bytes && !writer.is_closed() {
            writer.close();
        }

        let mut wire = std::mem::take(&mut retransmits);
        sender.push(|msg| wire.push(msg.clone()));

        for msg in wire {
            report.segments_sent += 1;
            if opts.loss_every > 0 && report.segments_sent % opts.loss_every == 0 {
                debug!(seqno = %msg.seqno, len = msg.sequence_length(), "链路丢弃数据段");
                report.segments_dropped += 1;
                continue;
            }
            receiver.receive(msg);
        }
        sender.receive(&receiver.send());
        read(receiver.reader(), u64::MAX, &mut received);

        let finished = receiver.output().is_finished() && sender.state() == SenderState::Done;
        if finished || now >= opts.until_ms {
            report.finished = finished;
            break;
        }

        sender.tick(tick_ms, |msg| retransmits.push(msg.clone()));
        report.retransmissions += retransmits.len() as u64;
        report.max_consecutive_retransmissions = report
            .max_consecutive_retransmissions
            .max(sender.consecutive_retransmissions());
        now += tick_ms;
    }

    report.elapsed_ms = now;
    report.bytes_delivered = received.len() as u64;
    report.data_ok = received.len() as u64 == opts.data_bytes
        && received
            .iter()
            .enumerate()
            .all(|(i, &b)| b == pattern_byte(i as u64));
    info!(
        bytes_delivered = report.bytes_delivered,
        retransmissions = report.retransmissions,
        finished = report.finished,
        elapsed_ms = report.elapsed_ms,
        "✅ 传输结束"
    );
    report
}
