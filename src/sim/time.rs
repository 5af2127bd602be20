//! 仿真时间类型
//!
//! 逻辑时钟：只随显式的 `tick` 前进，与墙上时间无关。

/// 仿真时间（毫秒）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub fn from_millis(ms: u64) -> SimTime {
        SimTime(ms)
    }
    pub fn from_secs(s: u64) -> SimTime {
        SimTime(s.saturating_mul(1_000))
    }
    pub fn as_millis(self) -> u64 {
        self.0
    }
    pub fn saturating_add_millis(self, ms: u64) -> SimTime {
        SimTime(self.0.saturating_add(ms))
    }
}
