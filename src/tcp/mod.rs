//! TCP 模块
//!
//! 回绕序号运算、发送方（含重传定时器）与接收方。两端都只通过显式的
//! `push` / `receive` / `tick` 调用驱动，时间是逻辑毫秒。

mod config;
mod message;
mod receiver;
mod sender;
mod timer;
mod wrap32;

pub use config::{MAX_WINDOW_SIZE, TcpConfig};
pub use message::{TcpReceiverMessage, TcpSenderMessage};
pub use receiver::TcpReceiver;
pub use sender::{SenderState, TcpSender};
pub use timer::{RetransmissionTimer, TimerState};
pub use wrap32::Wrap32;
