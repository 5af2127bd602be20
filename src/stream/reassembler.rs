//! 流重组器
//!
//! 接收任意顺序、可能重叠的字节区间（以流内绝对下标标识），把已经连续的
//! 前缀写入输出 `ByteStream`，其余部分暂存在按起始下标排序的区间表中。
//!
//! 区间表中的区间两两不相交且不相邻；暂存字节数与输出流中未读字节数之和
//! 不超过输出流容量。

use std::collections::BTreeMap;

use tracing::trace;

use super::byte_stream::{ByteStream, Reader, Writer};

#[derive(Debug, Clone)]
pub struct Reassembler {
    output: ByteStream,
    /// 起始下标 -> 数据
    pending: BTreeMap<u64, Vec<u8>>,
    pending_bytes: u64,
    /// 流结束位置（最后一个字节之后的下标）
    end_index: Option<u64>,
}

impl Reassembler {
    pub fn new(output: ByteStream) -> Self {
        Self {
            output,
            pending: BTreeMap::new(),
            pending_bytes: 0,
            end_index: None,
        }
    }

    /// 插入一段数据。`first_index` 是 `data` 第一个字节在流中的绝对下标。
    pub fn insert(&mut self, first_index: u64, data: impl Into<Vec<u8>>, is_last_substring: bool) {
        if self.output.is_closed() {
            return;
        }
        let data = data.into();
        let len = data.len() as u64;
        let next_needed = self.output.bytes_pushed();
        let window_end = next_needed + self.output.available_capacity();
        let last_index = first_index.saturating_add(len);

        if len == 0 {
            // 空的结尾标记不受窗口限制
            if is_last_substring {
                self.record_end(first_index);
            }
        } else if first_index >= window_end || last_index <= next_needed {
            trace!(first_index, len, next_needed, window_end, "丢弃窗口外的数据段");
        } else {
            // 按截断前的长度记录结尾位置
            if is_last_substring {
                self.record_end(last_index);
            }
            let start = first_index.max(next_needed);
            let end = last_index.min(window_end);
            let clipped = data[(start - first_index) as usize..(end - first_index) as usize].to_vec();
            self.store(start, clipped);
            self.flush();
        }

        if self.end_index == Some(self.output.bytes_pushed()) {
            self.output.close();
        }
    }

    /// 暂存在重组器内部（尚未写入输出流）的字节数
    pub fn count_bytes_pending(&self) -> u64 {
        self.pending_bytes
    }

    pub fn output(&self) -> &ByteStream {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut ByteStream {
        &mut self.output
    }

    pub fn reader(&mut self) -> &mut impl Reader {
        self.output.reader()
    }

    fn record_end(&mut self, end: u64) {
        self.end_index = Some(self.end_index.map_or(end, |e| e.max(end)));
    }

    /// 将 `[start, start + data.len())` 合并进区间表。
    fn store(&mut self, mut start: u64, mut data: Vec<u8>) {
        // 与前驱区间重叠或相邻：拼接到前驱之后
        let prev = self
            .pending
            .range(..start)
            .next_back()
            .map(|(&s, d)| (s, s + d.len() as u64));
        if let Some((prev_start, prev_end)) = prev {
            if prev_end >= start + data.len() as u64 {
                return;
            }
            if prev_end >= start {
                if let Some(mut merged) = self.pending.remove(&prev_start) {
                    self.pending_bytes -= merged.len() as u64;
                    merged.truncate((start - prev_start) as usize);
                    merged.extend_from_slice(&data);
                    data = merged;
                    start = prev_start;
                }
            }
        }

        // 吸收所有与之重叠或相邻的后继区间
        loop {
            let end = start + data.len() as u64;
            let next = self
                .pending
                .range(start..)
                .next()
                .map(|(&s, _)| s)
                .filter(|&s| s <= end);
            let Some(next_start) = next else {
                break;
            };
            let Some(next_data) = self.pending.remove(&next_start) else {
                break;
            };
            self.pending_bytes -= next_data.len() as u64;
            let overlap = (end - next_start) as usize;
            if overlap < next_data.len() {
                data.extend_from_slice(&next_data[overlap..]);
            }
        }

        self.pending_bytes += data.len() as u64;
        self.pending.insert(start, data);
    }

    /// 把区间表头部与输出流相接的区间写入输出流。
    fn flush(&mut self) {
        while let Some(entry) = self.pending.first_entry() {
            if *entry.key() != self.output.bytes_pushed() {
                break;
            }
            let data = entry.remove();
            self.pending_bytes -= data.len() as u64;
            self.output.push(data);
        }
    }
}
