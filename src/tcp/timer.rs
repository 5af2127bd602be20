//! 重传定时器
//!
//! 显式三态：空闲、计时中、已超时（等待发送方重传后重启）。时间只随 `tick` 前进。

/// 定时器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running { elapsed_ms: u64 },
    Expired,
}

#[derive(Debug, Clone)]
pub struct RetransmissionTimer {
    initial_rto_ms: u64,
    rto_ms: u64,
    state: TimerState,
}

impl RetransmissionTimer {
    pub fn new(initial_rto_ms: u64) -> Self {
        Self {
            initial_rto_ms,
            rto_ms: initial_rto_ms,
            state: TimerState::Idle,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// 当前 RTO（毫秒）
    pub fn rto_ms(&self) -> u64 {
        self.rto_ms
    }

    /// 计时中或已超时
    pub fn is_running(&self) -> bool {
        self.state != TimerState::Idle
    }

    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }

    /// 从 0 开始（重新）计时，RTO 不变
    pub fn start(&mut self) {
        self.state = TimerState::Running { elapsed_ms: 0 };
    }

    pub fn stop(&mut self) {
        self.state = TimerState::Idle;
    }

    /// RTO 恢复为初始值
    pub fn reset_rto(&mut self) {
        self.rto_ms = self.initial_rto_ms;
    }

    /// 指数退避：RTO 翻倍
    pub fn back_off(&mut self) {
        self.rto_ms = self.rto_ms.saturating_mul(2);
    }

    /// 推进时间，返回是否处于超时状态
    pub fn tick(&mut self, ms_since_last_tick: u64) -> bool {
        if let TimerState::Running { elapsed_ms } = self.state {
            let elapsed_ms = elapsed_ms.saturating_add(ms_since_last_tick);
            self.state = if elapsed_ms >= self.rto_ms {
                TimerState::Expired
            } else {
                TimerState::Running { elapsed_ms }
            };
        }
        self.is_expired()
    }
}
