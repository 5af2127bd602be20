//! 线上格式
//!
//! 以太网帧、IPv4 数据报与 ARP 报文的编码/解析。网络层只把它们当作不透明的
//! 序列化函数使用，解析失败一律静默丢弃。

mod arp;
mod checksum;
mod error;
mod ethernet;
mod ipv4;

pub use arp::ArpMessage;
pub use checksum::internet_checksum;
pub use error::ParseError;
pub use ethernet::{EthernetAddress, EthernetFrame, EthernetHeader};
pub use ipv4::{DEFAULT_TTL, InternetDatagram, Ipv4Header};
