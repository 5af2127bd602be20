//! TCP 发送方
//!
//! 从输出字节流读取数据，按对端通告的窗口切成段发出；维护未确认段队列与
//! 重传定时器（指数退避）。对端窗口为 0 时按窗口 1 发送探测段，此时超时重传
//! 不计入连续重传次数，也不退避。

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use super::config::TcpConfig;
use super::message::{TcpReceiverMessage, TcpSenderMessage};
use super::timer::RetransmissionTimer;
use super::wrap32::Wrap32;
use crate::stream::{ByteStream, Reader, Writer, read};

/// 由标志位推导出的发送方状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// 尚未发送任何段
    Closed,
    /// 已发送 SYN，尚未发送 FIN
    SynSent,
    /// 已发送 FIN，尚未被完全确认
    FinSent,
    /// FIN 已被确认
    Done,
    /// 收到或发出了 RST
    Error,
}

#[derive(Debug)]
pub struct TcpSender {
    input: ByteStream,
    isn: Wrap32,
    max_payload_size: u64,
    /// 下一个要发送的绝对序号
    next_seqno: u64,
    /// 已被累计确认的绝对序号
    acked_seqno: u64,
    bytes_in_flight: u64,
    outstanding: VecDeque<TcpSenderMessage>,
    window_size: u16,
    consecutive_retransmissions: u64,
    syn_sent: bool,
    fin_sent: bool,
    timer: RetransmissionTimer,
}

impl TcpSender {
    pub fn new(input: ByteStream, isn: Wrap32, initial_rto_ms: u64) -> Self {
        Self {
            input,
            isn,
            max_payload_size: TcpConfig::default().max_payload_size,
            next_seqno: 0,
            acked_seqno: 0,
            bytes_in_flight: 0,
            outstanding: VecDeque::new(),
            window_size: 1,
            consecutive_retransmissions: 0,
            syn_sent: false,
            fin_sent: false,
            timer: RetransmissionTimer::new(initial_rto_ms),
        }
    }

    /// 按配置创建发送方；配置中没有 ISN 时使用 `fallback_isn`。
    pub fn with_config(cfg: &TcpConfig, fallback_isn: Wrap32) -> Self {
        let mut sender = Self::new(
            ByteStream::new(cfg.send_capacity),
            cfg.isn.unwrap_or(fallback_isn),
            cfg.rt_timeout_ms,
        );
        sender.max_payload_size = cfg.max_payload_size.max(1);
        sender
    }

    pub fn writer(&mut self) -> &mut impl Writer {
        self.input.writer()
    }

    pub fn input(&self) -> &ByteStream {
        &self.input
    }

    pub fn isn(&self) -> Wrap32 {
        self.isn
    }

    /// 已发送未确认的序号个数
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.bytes_in_flight
    }

    pub fn consecutive_retransmissions(&self) -> u64 {
        self.consecutive_retransmissions
    }

    /// 当前 RTO（毫秒）
    pub fn current_rto_ms(&self) -> u64 {
        self.timer.rto_ms()
    }

    pub fn state(&self) -> SenderState {
        if self.input.has_error() {
            SenderState::Error
        } else if !self.syn_sent {
            SenderState::Closed
        } else if !self.fin_sent {
            SenderState::SynSent
        } else if self.bytes_in_flight > 0 {
            SenderState::FinSent
        } else {
            SenderState::Done
        }
    }

    /// 在窗口允许的范围内尽可能多地发送新段。
    pub fn push(&mut self, mut transmit: impl FnMut(&TcpSenderMessage)) {
        let window = (self.window_size as u64).max(1);

        while window > self.bytes_in_flight && !self.fin_sent {
            let mut msg = self.make_empty_message();
            if !self.syn_sent {
                msg.syn = true;
                self.syn_sent = true;
            }

            let budget = window - self.bytes_in_flight - msg.syn as u64;
            read(
                &mut self.input,
                self.max_payload_size.min(budget),
                &mut msg.payload,
            );

            // FIN 也要占窗口
            if self.input.is_finished() && self.bytes_in_flight + msg.sequence_length() < window {
                msg.fin = true;
                self.fin_sent = true;
            }

            if msg.sequence_length() == 0 {
                break;
            }

            trace!(
                seqno = %msg.seqno,
                syn = msg.syn,
                len = msg.payload.len(),
                fin = msg.fin,
                "发送数据段"
            );
            transmit(&msg);
            if !self.timer.is_running() {
                self.timer.start();
            }
            self.next_seqno += msg.sequence_length();
            self.bytes_in_flight += msg.sequence_length();
            self.outstanding.push_back(msg);
        }
    }

    /// 一个不占序号的空段（用于纯确认或发送 RST）
    pub fn make_empty_message(&self) -> TcpSenderMessage {
        TcpSenderMessage {
            seqno: Wrap32::wrap(self.next_seqno, self.isn),
            syn: false,
            payload: Vec::new(),
            fin: false,
            rst: self.input.has_error(),
        }
    }

    /// 处理对端的确认与窗口通告。
    pub fn receive(&mut self, msg: &TcpReceiverMessage) {
        self.window_size = msg.window_size;
        if msg.rst {
            warn!("对端发送 RST，输入流标记为出错");
            self.input.set_error();
            return;
        }
        if self.input.has_error() {
            return;
        }
        let Some(ackno) = msg.ackno else {
            return;
        };

        let abs_ackno = ackno.unwrap(self.isn, self.next_seqno);
        if abs_ackno > self.next_seqno {
            debug!(abs_ackno, next_seqno = self.next_seqno, "忽略超前的确认号");
            return;
        }

        let mut newly_acked = false;
        while let Some(front) = self.outstanding.front() {
            let len = front.sequence_length();
            if self.acked_seqno + len > abs_ackno {
                break;
            }
            self.acked_seqno += len;
            self.bytes_in_flight -= len;
            self.outstanding.pop_front();
            newly_acked = true;
        }

        if newly_acked {
            self.timer.reset_rto();
            self.consecutive_retransmissions = 0;
            if self.outstanding.is_empty() {
                self.timer.stop();
            } else {
                self.timer.start();
            }
        }
    }

    /// 推进时间；超时则重传最早的未确认段。
    pub fn tick(&mut self, ms_since_last_tick: u64, mut transmit: impl FnMut(&TcpSenderMessage)) {
        if !self.timer.tick(ms_since_last_tick) {
            return;
        }
        let Some(oldest) = self.outstanding.front() else {
            self.timer.stop();
            return;
        };

        debug!(
            seqno = %oldest.seqno,
            rto_ms = self.timer.rto_ms(),
            window_size = self.window_size,
            "RTO 超时，重传最早的未确认段"
        );
        transmit(oldest);
        if self.window_size != 0 {
            self.consecutive_retransmissions += 1;
            self.timer.back_off();
        }
        self.timer.start();
    }
}
