//! 网络接口（以太网 / ARP 层）
//!
//! 把 IPv4 数据报封装成以太网帧发出：下一跳的以太网地址在 ARP 缓存中时直接
//! 发送，否则广播一次 ARP 请求并把数据报排队，收到应答后一次性发出。
//! 缓存条目与未决请求都只随 `tick` 老化。

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::net::Ipv4Addr;

use tracing::{debug, info, trace};

use super::port::OutputPort;
use crate::wire::{ArpMessage, EthernetAddress, EthernetFrame, EthernetHeader, InternetDatagram};

/// ARP 缓存条目的存活时间（毫秒）
pub const ARP_CACHE_TTL_MS: u64 = 30_000;
/// 未收到应答的 ARP 请求的存活时间（毫秒）
pub const ARP_REQUEST_TTL_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy)]
struct ArpEntry {
    ethernet_address: EthernetAddress,
    age_ms: u64,
}

pub struct NetworkInterface {
    name: String,
    port: Box<dyn OutputPort>,
    ethernet_address: EthernetAddress,
    ip_address: Ipv4Addr,
    /// IP -> (以太网地址, 学到之后经过的时间)
    arp_cache: HashMap<u32, ArpEntry>,
    /// IP -> 请求发出后经过的时间
    pending_arp_requests: HashMap<u32, u64>,
    /// IP -> 等待地址解析的数据报
    queued_datagrams: HashMap<u32, Vec<InternetDatagram>>,
    datagrams_received: VecDeque<InternetDatagram>,
}

impl NetworkInterface {
    pub fn new(
        name: impl Into<String>,
        port: Box<dyn OutputPort>,
        ethernet_address: EthernetAddress,
        ip_address: Ipv4Addr,
    ) -> Self {
        let name = name.into();
        info!(
            interface = %name,
            ethernet_address = %ethernet_address,
            ip_address = %ip_address,
            "创建网络接口"
        );
        Self {
            name,
            port,
            ethernet_address,
            ip_address,
            arp_cache: HashMap::new(),
            pending_arp_requests: HashMap::new(),
            queued_datagrams: HashMap::new(),
            datagrams_received: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ethernet_address(&self) -> EthernetAddress {
        self.ethernet_address
    }

    pub fn ip_address(&self) -> Ipv4Addr {
        self.ip_address
    }

    /// 已收到、等待上层（路由器或主机）取走的数据报
    pub fn datagrams_received(&mut self) -> &mut VecDeque<InternetDatagram> {
        &mut self.datagrams_received
    }

    /// 查询 ARP 缓存
    pub fn cached_ethernet_address(&self, ip: Ipv4Addr) -> Option<EthernetAddress> {
        self.arp_cache.get(&u32::from(ip)).map(|e| e.ethernet_address)
    }

    pub fn has_pending_arp_request(&self, ip: Ipv4Addr) -> bool {
        self.pending_arp_requests.contains_key(&u32::from(ip))
    }

    /// 等待 `ip` 解析的数据报个数
    pub fn queued_datagram_count(&self, ip: Ipv4Addr) -> usize {
        self.queued_datagrams.get(&u32::from(ip)).map_or(0, Vec::len)
    }

    /// 发送数据报到下一跳 `next_hop`（路由器或同网段的目的主机）。
    #[tracing::instrument(skip(self, dgram), fields(interface = %self.name))]
    pub fn send_datagram(&mut self, dgram: InternetDatagram, next_hop: Ipv4Addr) {
        let target_ip = u32::from(next_hop);

        if let Some(entry) = self.arp_cache.get(&target_ip) {
            let dst = entry.ethernet_address;
            trace!(dst = %dst, "ARP 缓存命中，直接发送");
            self.transmit(dst, EthernetHeader::TYPE_IPV4, dgram.to_bytes());
            return;
        }

        if !self.pending_arp_requests.contains_key(&target_ip) {
            debug!("广播 ARP 请求");
            let request = ArpMessage::request(self.ethernet_address, self.ip_address, next_hop);
            self.pending_arp_requests.insert(target_ip, 0);
            self.transmit(EthernetAddress::BROADCAST, EthernetHeader::TYPE_ARP, request.to_bytes());
        }
        self.queued_datagrams.entry(target_ip).or_default().push(dgram);
    }

    /// 处理收到的以太网帧。
    #[tracing::instrument(skip(self, frame), fields(interface = %self.name, src = %frame.header.src))]
    pub fn recv_frame(&mut self, frame: EthernetFrame) {
        let dst = frame.header.dst;
        if dst != self.ethernet_address && !dst.is_broadcast() {
            trace!(dst = %dst, "目的地址不是本接口，丢弃");
            return;
        }

        match frame.header.ether_type {
            EthernetHeader::TYPE_IPV4 => match InternetDatagram::parse(&frame.payload) {
                Ok(dgram) => self.datagrams_received.push_back(dgram),
                Err(err) => debug!(%err, "IPv4 解析失败，丢弃"),
            },
            EthernetHeader::TYPE_ARP => match ArpMessage::parse(&frame.payload) {
                Ok(msg) => self.handle_arp(msg),
                Err(err) => debug!(%err, "ARP 解析失败，丢弃"),
            },
            other => trace!(ether_type = other, "未知以太网类型，丢弃"),
        }
    }

    fn handle_arp(&mut self, msg: ArpMessage) {
        let sender_ip = msg.sender_ip_address;
        let sender_eth = msg.sender_ethernet_address;
        debug!(
            sender_ip = %Ipv4Addr::from(sender_ip),
            sender_eth = %sender_eth,
            "学习 ARP 映射"
        );
        self.arp_cache.insert(
            sender_ip,
            ArpEntry {
                ethernet_address: sender_eth,
                age_ms: 0,
            },
        );

        if msg.is_request() && msg.target_ip_address == u32::from(self.ip_address) {
            let reply = ArpMessage {
                opcode: ArpMessage::OPCODE_REPLY,
                sender_ethernet_address: self.ethernet_address,
                sender_ip_address: self.ip_address.into(),
                target_ethernet_address: sender_eth,
                target_ip_address: sender_ip,
            };
            self.transmit(sender_eth, EthernetHeader::TYPE_ARP, reply.to_bytes());
        }

        self.pending_arp_requests.remove(&sender_ip);
        if let Some(queued) = self.queued_datagrams.remove(&sender_ip) {
            debug!(count = queued.len(), "地址已解析，发出排队的数据报");
            for dgram in queued {
                self.transmit(sender_eth, EthernetHeader::TYPE_IPV4, dgram.to_bytes());
            }
        }
    }

    /// 推进时间：老化 ARP 缓存与未决请求。
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        self.arp_cache.retain(|ip, entry| {
            entry.age_ms = entry.age_ms.saturating_add(ms_since_last_tick);
            let keep = entry.age_ms < ARP_CACHE_TTL_MS;
            if !keep {
                trace!(ip = %Ipv4Addr::from(*ip), "ARP 缓存条目过期");
            }
            keep
        });

        let queued = &mut self.queued_datagrams;
        self.pending_arp_requests.retain(|ip, age_ms| {
            *age_ms = age_ms.saturating_add(ms_since_last_tick);
            if *age_ms < ARP_REQUEST_TTL_MS {
                return true;
            }
            let dropped = queued.remove(ip).map_or(0, |q| q.len());
            debug!(ip = %Ipv4Addr::from(*ip), dropped, "ARP 请求超时，丢弃排队的数据报");
            false
        });
    }

    fn transmit(&mut self, dst: EthernetAddress, ether_type: u16, payload: Vec<u8>) {
        let frame = EthernetFrame {
            header: EthernetHeader {
                dst,
                src: self.ethernet_address,
                ether_type,
            },
            payload,
        };
        self.port.transmit(&self.name, frame);
    }
}

impl fmt::Debug for NetworkInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkInterface")
            .field("name", &self.name)
            .field("ethernet_address", &self.ethernet_address)
            .field("ip_address", &self.ip_address)
            .field("arp_cache_len", &self.arp_cache.len())
            .field("pending_arp_requests", &self.pending_arp_requests.len())
            .finish()
    }
}
