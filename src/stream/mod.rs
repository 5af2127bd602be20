//! 字节流模块
//!
//! 包含有界字节流（带读/写两端能力）以及把乱序数据段还原为有序字节流的重组器。

mod byte_stream;
mod reassembler;

pub use byte_stream::{ByteStream, Reader, Writer, read};
pub use reassembler::Reassembler;
