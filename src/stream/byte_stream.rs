//! 有界字节流
//!
//! 固定容量的 FIFO 字节缓冲，写端（`Writer`）与读端（`Reader`）是同一个
//! `ByteStream` 上两组互不相交的方法。

use std::collections::VecDeque;

/// 写端能力：只能追加数据或关闭。
pub trait Writer {
    /// 追加数据；超出可用容量的部分被静默截断。
    fn push(&mut self, data: impl Into<Vec<u8>>);
    /// 标记不会再有数据写入（幂等）。
    fn close(&mut self);
    fn is_closed(&self) -> bool;
    /// 当前还能写入多少字节
    fn available_capacity(&self) -> u64;
    /// 累计写入的字节数
    fn bytes_pushed(&self) -> u64;
}

/// 读端能力：只能查看或弹出缓冲中的数据。
pub trait Reader {
    /// 查看下一段连续的缓冲字节；只要缓冲非空，返回值就非空。
    fn peek(&self) -> &[u8];
    /// 从头部移除最多 `len` 字节
    fn pop(&mut self, len: u64);
    /// 已关闭且数据已全部读完
    fn is_finished(&self) -> bool;
    fn bytes_buffered(&self) -> u64;
    /// 累计弹出的字节数
    fn bytes_popped(&self) -> u64;
}

/// 有界字节流
#[derive(Debug, Clone)]
pub struct ByteStream {
    capacity: u64,
    chunks: VecDeque<Vec<u8>>,
    /// 第一个 chunk 中已被弹出的前缀长度
    head_offset: usize,
    bytes_pushed: u64,
    bytes_popped: u64,
    closed: bool,
    error: bool,
}

impl ByteStream {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            chunks: VecDeque::new(),
            head_offset: 0,
            bytes_pushed: 0,
            bytes_popped: 0,
            closed: false,
            error: false,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// 获取写端
    pub fn writer(&mut self) -> &mut impl Writer {
        self
    }

    /// 获取读端
    pub fn reader(&mut self) -> &mut impl Reader {
        self
    }

    /// 标记流出错（用于传播 RST），不可撤销。已缓冲的数据仍然可读。
    pub fn set_error(&mut self) {
        self.error = true;
    }

    pub fn has_error(&self) -> bool {
        self.error
    }
}

impl Writer for ByteStream {
    fn push(&mut self, data: impl Into<Vec<u8>>) {
        let mut data = data.into();
        let avail = self.available_capacity();
        if data.is_empty() || avail == 0 {
            return;
        }
        if (data.len() as u64) > avail {
            data.truncate(avail as usize);
        }
        self.bytes_pushed += data.len() as u64;
        self.chunks.push_back(data);
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn available_capacity(&self) -> u64 {
        self.capacity - self.bytes_buffered()
    }

    fn bytes_pushed(&self) -> u64 {
        self.bytes_pushed
    }
}

impl Reader for ByteStream {
    fn peek(&self) -> &[u8] {
        match self.chunks.front() {
            Some(front) => &front[self.head_offset..],
            None => &[],
        }
    }

    fn pop(&mut self, len: u64) {
        let mut remaining = len.min(self.bytes_buffered());
        self.bytes_popped += remaining;
        while remaining > 0 {
            let Some(front) = self.chunks.front() else {
                break;
            };
            let left_in_front = (front.len() - self.head_offset) as u64;
            if left_in_front > remaining {
                self.head_offset += remaining as usize;
                break;
            }
            remaining -= left_in_front;
            self.chunks.pop_front();
            self.head_offset = 0;
        }
    }

    fn is_finished(&self) -> bool {
        self.closed && self.bytes_buffered() == 0
    }

    fn bytes_buffered(&self) -> u64 {
        self.bytes_pushed - self.bytes_popped
    }

    fn bytes_popped(&self) -> u64 {
        self.bytes_popped
    }
}

/// 从读端读取最多 `len` 字节追加到 `out`。
pub fn read(reader: &mut impl Reader, len: u64, out: &mut Vec<u8>) {
    let mut remaining = len;
    while remaining > 0 {
        let view = reader.peek();
        if view.is_empty() {
            break;
        }
        let n = (view.len() as u64).min(remaining);
        out.extend_from_slice(&view[..n as usize]);
        reader.pop(n);
        remaining -= n;
    }
}
