//! 32 位回绕序号
//!
//! 线上序号是 `(绝对序号 + ISN) mod 2^32`；`unwrap` 借助一个检查点在所有同余的
//! 绝对序号中选出离检查点最近的那一个。

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

const TWO31: u64 = 1 << 31;
const TWO32: u64 = 1 << 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wrap32(u32);

impl Wrap32 {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// 绝对序号 `n` 相对于 `zero_point` 的线上表示
    pub fn wrap(n: u64, zero_point: Wrap32) -> Wrap32 {
        zero_point + n as u32
    }

    /// 返回与 `self` 同余且离 `checkpoint` 最近的绝对序号。
    ///
    /// 距离恰为 2^31 时取较大者。
    pub fn unwrap(self, zero_point: Wrap32, checkpoint: u64) -> u64 {
        let here = Wrap32::wrap(checkpoint, zero_point);
        let dis = self.0.wrapping_sub(here.0) as u64;
        match checkpoint.checked_add(dis) {
            Some(up) if dis <= TWO31 || checkpoint < TWO32 - dis => up,
            _ => checkpoint - (TWO32 - dis),
        }
    }
}

impl Add<u32> for Wrap32 {
    type Output = Wrap32;

    fn add(self, rhs: u32) -> Wrap32 {
        Wrap32(self.0.wrapping_add(rhs))
    }
}

impl fmt::Display for Wrap32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
