//! IPv4 数据报（仅支持无选项的 20 字节头部）

use std::net::Ipv4Addr;

use super::checksum::internet_checksum;
use super::error::{ParseError, need};

/// 新建数据报的默认 TTL
pub const DEFAULT_TTL: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub tos: u8,
    /// 头部 + 载荷总长度
    pub len: u16,
    pub id: u16,
    pub df: bool,
    pub mf: bool,
    pub offset: u16,
    pub ttl: u8,
    pub proto: u8,
    pub cksum: u16,
    pub src: u32,
    pub dst: u32,
}

impl Ipv4Header {
    pub const LENGTH: usize = 20;
    pub const PROTO_TCP: u8 = 6;
    pub const PROTO_UDP: u8 = 17;

    /// 构造一个带正确校验和的头部；总长度超出 `u16` 时返回错误。
    pub fn new(
        src: Ipv4Addr,
        dst: Ipv4Addr,
        proto: u8,
        payload_len: usize,
    ) -> Result<Self, ParseError> {
        let len = Self::LENGTH
            .checked_add(payload_len)
            .and_then(|total| u16::try_from(total).ok())
            .ok_or(ParseError::PayloadTooLarge(payload_len))?;
        let mut header = Self {
            tos: 0,
            len,
            id: 0,
            df: true,
            mf: false,
            offset: 0,
            ttl: DEFAULT_TTL,
            proto,
            cksum: 0,
            src: src.into(),
            dst: dst.into(),
        };
        header.compute_checksum();
        Ok(header)
    }

    pub fn src_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.src)
    }

    pub fn dst_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.dst)
    }

    /// 重新计算头部校验和（修改 TTL 等字段后必须调用）
    pub fn compute_checksum(&mut self) {
        self.cksum = 0;
        self.cksum = internet_checksum(&self.to_bytes());
    }

    pub fn to_bytes(&self) -> [u8; Self::LENGTH] {
        let mut out = [0u8; Self::LENGTH];
        out[0] = 0x45;
        out[1] = self.tos;
        out[2..4].copy_from_slice(&self.len.to_be_bytes());
        out[4..6].copy_from_slice(&self.id.to_be_bytes());
        let flags = ((self.df as u16) << 14) | ((self.mf as u16) << 13) | (self.offset & 0x1fff);
        out[6..8].copy_from_slice(&flags.to_be_bytes());
        out[8] = self.ttl;
        out[9] = self.proto;
        out[10..12].copy_from_slice(&self.cksum.to_be_bytes());
        out[12..16].copy_from_slice(&self.src.to_be_bytes());
        out[16..20].copy_from_slice(&self.dst.to_be_bytes());
        out
    }

    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        need(buf, Self::LENGTH)?;
        let version = buf[0] >> 4;
        if version != 4 {
            return Err(ParseError::BadVersion(version));
        }
        let hlen = ((buf[0] & 0x0f) as usize) * 4;
        if hlen != Self::LENGTH {
            return Err(ParseError::BadHeaderLength(hlen));
        }
        if internet_checksum(&buf[..Self::LENGTH]) != 0 {
            return Err(ParseError::BadChecksum);
        }
        let be16 = |i: usize| u16::from_be_bytes([buf[i], buf[i + 1]]);
        let be32 = |i: usize| u32::from_be_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
        let flags = be16(6);
        Ok(Self {
            tos: buf[1],
            len: be16(2),
            id: be16(4),
            df: flags & 0x4000 != 0,
            mf: flags & 0x2000 != 0,
            offset: flags & 0x1fff,
            ttl: buf[8],
            proto: buf[9],
            cksum: be16(10),
            src: be32(12),
            dst: be32(16),
        })
    }
}

/// IPv4 数据报：头部 + 载荷
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternetDatagram {
    pub header: Ipv4Header,
    pub payload: Vec<u8>,
}

impl InternetDatagram {
    pub fn new(
        src: Ipv4Addr,
        dst: Ipv4Addr,
        proto: u8,
        payload: Vec<u8>,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            header: Ipv4Header::new(src, dst, proto, payload.len())?,
            payload,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Ipv4Header::LENGTH + self.payload.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// 解析数据报；载荷按头部的总长度截取。
    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        let header = Ipv4Header::parse(buf)?;
        let total = header.len as usize;
        if total < Ipv4Header::LENGTH {
            return Err(ParseError::BadHeaderLength(total));
        }
        need(buf, total)?;
        Ok(Self {
            header,
            payload: buf[Ipv4Header::LENGTH..total].to_vec(),
        })
    }
}
