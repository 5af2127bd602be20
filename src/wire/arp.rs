//! ARP 报文（以太网 / IPv4）

use std::net::Ipv4Addr;

use super::error::{ParseError, need};
use super::ethernet::{EthernetAddress, EthernetHeader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpMessage {
    pub opcode: u16,
    pub sender_ethernet_address: EthernetAddress,
    pub sender_ip_address: u32,
    pub target_ethernet_address: EthernetAddress,
    pub target_ip_address: u32,
}

impl ArpMessage {
    pub const LENGTH: usize = 28;
    pub const OPCODE_REQUEST: u16 = 1;
    pub const OPCODE_REPLY: u16 = 2;
    const HTYPE_ETHERNET: u16 = 1;

    pub fn request(sender_eth: EthernetAddress, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self {
            opcode: Self::OPCODE_REQUEST,
            sender_ethernet_address: sender_eth,
            sender_ip_address: sender_ip.into(),
            target_ethernet_address: EthernetAddress::default(),
            target_ip_address: target_ip.into(),
        }
    }

    pub fn is_request(&self) -> bool {
        self.opcode == Self::OPCODE_REQUEST
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LENGTH);
        out.extend_from_slice(&Self::HTYPE_ETHERNET.to_be_bytes());
        out.extend_from_slice(&EthernetHeader::TYPE_IPV4.to_be_bytes());
        out.push(6);
        out.push(4);
        out.extend_from_slice(&self.opcode.to_be_bytes());
        out.extend_from_slice(&self.sender_ethernet_address.0);
        out.extend_from_slice(&self.sender_ip_address.to_be_bytes());
        out.extend_from_slice(&self.target_ethernet_address.0);
        out.extend_from_slice(&self.target_ip_address.to_be_bytes());
        out
    }

    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        need(buf, Self::LENGTH)?;
        let be16 = |i: usize| u16::from_be_bytes([buf[i], buf[i + 1]]);
        let be32 = |i: usize| u32::from_be_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
        let eth = |i: usize| {
            let mut a = [0u8; 6];
            a.copy_from_slice(&buf[i..i + 6]);
            EthernetAddress(a)
        };

        let htype = be16(0);
        if htype != Self::HTYPE_ETHERNET {
            return Err(ParseError::Unsupported {
                what: "ARP hardware type",
                value: htype as u32,
            });
        }
        let ptype = be16(2);
        if ptype != EthernetHeader::TYPE_IPV4 || buf[4] != 6 || buf[5] != 4 {
            return Err(ParseError::Unsupported {
                what: "ARP protocol type",
                value: ptype as u32,
            });
        }
        let opcode = be16(6);
        if opcode != Self::OPCODE_REQUEST && opcode != Self::OPCODE_REPLY {
            return Err(ParseError::Unsupported {
                what: "ARP opcode",
                value: opcode as u32,
            });
        }
        Ok(Self {
            opcode,
            sender_ethernet_address: eth(8),
            sender_ip_address: be32(14),
            target_ethernet_address: eth(18),
            target_ip_address: be32(24),
        })
    }
}
