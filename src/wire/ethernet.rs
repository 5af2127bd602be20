//! 以太网帧

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ParseError, need};

/// 48 位以太网地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EthernetAddress(pub [u8; 6]);

impl EthernetAddress {
    pub const BROADCAST: EthernetAddress = EthernetAddress([0xff; 6]);

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl fmt::Display for EthernetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for EthernetAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 6];
        let mut parts = s.split(':');
        for byte in out.iter_mut() {
            let part = parts.next().ok_or_else(|| ParseError::BadAddress(s.to_string()))?;
            *byte = u8::from_str_radix(part, 16).map_err(|_| ParseError::BadAddress(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(ParseError::BadAddress(s.to_string()));
        }
        Ok(EthernetAddress(out))
    }
}

impl TryFrom<String> for EthernetAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EthernetAddress> for String {
    fn from(addr: EthernetAddress) -> String {
        addr.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: EthernetAddress,
    pub src: EthernetAddress,
    pub ether_type: u16,
}

impl EthernetHeader {
    pub const LENGTH: usize = 14;
    pub const TYPE_IPV4: u16 = 0x0800;
    pub const TYPE_ARP: u16 = 0x0806;
}

/// 以太网帧：头部 + 不透明载荷
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub header: EthernetHeader,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(EthernetHeader::LENGTH + self.payload.len());
        out.extend_from_slice(&self.header.dst.0);
        out.extend_from_slice(&self.header.src.0);
        out.extend_from_slice(&self.header.ether_type.to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        need(buf, EthernetHeader::LENGTH)?;
        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&buf[0..6]);
        src.copy_from_slice(&buf[6..12]);
        Ok(EthernetFrame {
            header: EthernetHeader {
                dst: EthernetAddress(dst),
                src: EthernetAddress(src),
                ether_type: u16::from_be_bytes([buf[12], buf[13]]),
            },
            payload: buf[EthernetHeader::LENGTH..].to_vec(),
        })
    }
}
