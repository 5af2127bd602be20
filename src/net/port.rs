//! 发送能力（transmit）
//!
//! 网络接口不关心帧如何送上物理链路，只调用注入的 `OutputPort`。

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::wire::EthernetFrame;

/// 接口把帧交给外部的唯一出口；结果不回传（fire-and-forget）。
pub trait OutputPort {
    fn transmit(&mut self, sender: &str, frame: EthernetFrame);
}

/// 把发出的帧攒在一个共享队列里，由驱动方（测试或仿真）取走。
///
/// 克隆出的句柄共享同一个队列。
#[derive(Clone, Default)]
pub struct FrameQueue {
    frames: Rc<RefCell<VecDeque<EthernetFrame>>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&self) -> Option<EthernetFrame> {
        self.frames.borrow_mut().pop_front()
    }

    /// 取走所有已发出的帧（按发送顺序）
    pub fn drain(&self) -> Vec<EthernetFrame> {
        self.frames.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.borrow().is_empty()
    }
}

impl OutputPort for FrameQueue {
    fn transmit(&mut self, _sender: &str, frame: EthernetFrame) {
        self.frames.borrow_mut().push_back(frame);
    }
}

impl fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameQueue").field("len", &self.len()).finish()
    }
}
