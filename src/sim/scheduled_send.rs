//! 调度发送
//!
//! 在指定时间由某台主机发出的数据报，按时间优先出队。

use super::id::HostId;
use super::time::SimTime;
use crate::wire::InternetDatagram;
use std::cmp::Ordering;

/// 调度发送，包含执行时间、序列号和数据报。
#[derive(Debug)]
pub struct ScheduledSend {
    pub(crate) at: SimTime,
    pub(crate) seq: u64,
    pub(crate) from: HostId,
    pub(crate) dgram: InternetDatagram,
}

// BinaryHeap 是 max-heap；我们需要最小时间优先，因此反向比较。
impl Ord for ScheduledSend {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.at.cmp(&other.at) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            ord => ord,
        }
        .reverse()
    }
}

impl PartialOrd for ScheduledSend {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledSend {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for ScheduledSend {}
