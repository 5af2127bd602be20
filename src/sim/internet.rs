//! 仿真互联网
//!
//! 持有主机、路由器与以太网段，按逻辑时间步进：每一步先把各端口发出的帧交给
//! 同一段上的其他接口，再让路由器转发，最后推进所有接口的时钟。

use std::collections::{BinaryHeap, HashMap};
use std::net::Ipv4Addr;

use tracing::{debug, info, trace};

use super::event_log::{EventLog, FrameKind, SimEventKind};
use super::id::{HostId, PortRef, RouterId, SegmentId};
use super::scheduled_send::ScheduledSend;
use super::stats::Stats;
use super::time::SimTime;
use crate::net::{FrameQueue, NetworkInterface, Router};
use crate::wire::{EthernetAddress, EthernetFrame, InternetDatagram};

/// 主机：一个接口 + 所在子网 + 默认网关
#[derive(Debug)]
pub struct Host {
    name: String,
    interface: NetworkInterface,
    port: FrameQueue,
    network: u32,
    prefix_length: u8,
    gateway: Option<Ipv4Addr>,
    received: Vec<InternetDatagram>,
}

impl Host {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interface(&self) -> &NetworkInterface {
        &self.interface
    }

    pub fn ip_address(&self) -> Ipv4Addr {
        self.interface.ip_address()
    }

    /// 已到达本主机的数据报
    pub fn received(&self) -> &[InternetDatagram] {
        &self.received
    }

    /// 同子网直接发给目的地址，否则交给网关（没有网关时也直接发）
    fn next_hop(&self, dst: Ipv4Addr) -> Ipv4Addr {
        let on_link = mask(u32::from(dst), self.prefix_length) == self.network;
        match self.gateway {
            Some(gw) if !on_link => gw,
            _ => dst,
        }
    }
}

/// 路由器及其各接口的发送队列
#[derive(Debug)]
pub struct SimRouter {
    name: String,
    router: Router,
    ports: Vec<FrameQueue>,
}

impl SimRouter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}

fn mask(addr: u32, prefix_length: u8) -> u32 {
    match prefix_length {
        0 => 0,
        len => addr & (u32::MAX << (32 - len.min(32) as u32)),
    }
}

#[derive(Debug, Default)]
pub struct Internet {
    now: SimTime,
    hosts: Vec<Host>,
    routers: Vec<SimRouter>,
    segments: Vec<Vec<PortRef>>,
    attachments: HashMap<PortRef, SegmentId>,
    sends: BinaryHeap<ScheduledSend>,
    next_seq: u64,
    pub stats: Stats,
    /// 事件记录（为空时不记录）
    pub log: Option<EventLog>,
}

impl Internet {
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 添加主机，`prefix_length` 描述其所在子网
    pub fn add_host(
        &mut self,
        name: impl Into<String>,
        ip: Ipv4Addr,
        prefix_length: u8,
        mac: EthernetAddress,
        gateway: Option<Ipv4Addr>,
    ) -> HostId {
        let name = name.into();
        let port = FrameQueue::new();
        let interface = NetworkInterface::new(name.clone(), Box::new(port.clone()), mac, ip);
        let id = HostId(self.hosts.len());
        self.hosts.push(Host {
            name,
            interface,
            port,
            network: mask(ip.into(), prefix_length),
            prefix_length,
            gateway,
            received: Vec::new(),
        });
        id
    }

    pub fn add_router(&mut self, name: impl Into<String>) -> RouterId {
        let id = RouterId(self.routers.len());
        self.routers.push(SimRouter {
            name: name.into(),
            router: Router::new(),
            ports: Vec::new(),
        });
        id
    }

    /// 给路由器添加一个接口，返回接口下标。接口名为 `<路由器名>:<接口名>`。
    pub fn add_router_interface(
        &mut self,
        router: RouterId,
        name: &str,
        mac: EthernetAddress,
        ip: Ipv4Addr,
    ) -> usize {
        let r = &mut self.routers[router.0];
        let port = FrameQueue::new();
        let full_name = format!("{}:{}", r.name, name);
        let interface = NetworkInterface::new(full_name, Box::new(port.clone()), mac, ip);
        r.ports.push(port);
        r.router.add_interface(interface)
    }

    /// 连接若干端口组成一个以太网段（广播域）
    pub fn add_segment(&mut self, ports: &[PortRef]) -> SegmentId {
        let id = SegmentId(self.segments.len());
        for &p in ports {
            self.attachments.insert(p, id);
        }
        self.segments.push(ports.to_vec());
        id
    }

    pub fn host(&self, id: HostId) -> &Host {
        &self.hosts[id.0]
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn router(&self, id: RouterId) -> &SimRouter {
        &self.routers[id.0]
    }

    /// 用于配置路由表
    pub fn router_mut(&mut self, id: RouterId) -> &mut Router {
        &mut self.routers[id.0].router
    }

    pub fn find_host(&self, name: &str) -> Option<HostId> {
        self.hosts.iter().position(|h| h.name == name).map(HostId)
    }

    pub fn find_router(&self, name: &str) -> Option<RouterId> {
        self.routers.iter().position(|r| r.name == name).map(RouterId)
    }

    /// 主机立即发出一个数据报
    pub fn send(&mut self, from: HostId, dgram: InternetDatagram) {
        let now = self.now.as_millis();
        let host = &mut self.hosts[from.0];
        let dst = dgram.header.dst_addr();
        let next_hop = host.next_hop(dst);
        debug!(host = %host.name, dst = %dst, next_hop = %next_hop, "主机发送数据报");
        if let Some(log) = &mut self.log {
            log.push(
                now,
                SimEventKind::HostSend {
                    host: host.name.clone(),
                    dst: dst.to_string(),
                },
            );
        }
        host.interface.send_datagram(dgram, next_hop);
        self.stats.datagrams_sent += 1;
    }

    /// 在 `at` 时刻由主机发出数据报
    pub fn schedule_send(&mut self, at: SimTime, from: HostId, dgram: InternetDatagram) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.sends.push(ScheduledSend {
            at,
            seq,
            from,
            dgram,
        });
    }

    /// 前进一步（`ms` 毫秒）。
    #[tracing::instrument(skip(self), fields(now = self.now.0))]
    pub fn step(&mut self, ms: u64) {
        while let Some(top) = self.sends.peek() {
            if top.at > self.now {
                break;
            }
            let Some(item) = self.sends.pop() else {
                break;
            };
            self.send(item.from, item.dgram);
        }

        self.exchange_frames();
        self.collect_arrivals();
        for r in &mut self.routers {
            r.router.route();
        }

        for h in &mut self.hosts {
            h.interface.tick(ms);
        }
        for r in &mut self.routers {
            for iface in r.router.interfaces_mut() {
                iface.tick(ms);
            }
        }
        self.now = self.now.saturating_add_millis(ms);
    }

    /// 以 `step_ms` 为步长运行到 `until`（至少一步）。
    pub fn run_until(&mut self, until: SimTime, step_ms: u64) {
        let step_ms = step_ms.max(1);
        info!(until = ?until, step_ms, "▶️  开始运行仿真");
        loop {
            self.step(step_ms);
            if self.now >= until {
                break;
            }
        }
        info!(
            final_time = ?self.now,
            frames_delivered = self.stats.frames_delivered,
            datagrams_delivered = self.stats.datagrams_delivered,
            "✅ 仿真完成"
        );
    }

    fn ports(&self) -> Vec<PortRef> {
        let hosts = (0..self.hosts.len()).map(|i| PortRef::Host(HostId(i)));
        let routers = self.routers.iter().enumerate().flat_map(|(r, sr)| {
            (0..sr.ports.len()).map(move |i| PortRef::Router(RouterId(r), i))
        });
        hosts.chain(routers).collect()
    }

    fn port_queue(&self, p: PortRef) -> &FrameQueue {
        match p {
            PortRef::Host(h) => &self.hosts[h.0].port,
            PortRef::Router(r, i) => &self.routers[r.0].ports[i],
        }
    }

    fn interface_mut(&mut self, p: PortRef) -> Option<&mut NetworkInterface> {
        match p {
            PortRef::Host(h) => self.hosts.get_mut(h.0).map(|h| &mut h.interface),
            PortRef::Router(r, i) => self.routers.get_mut(r.0)?.router.interface_mut(i),
        }
    }

    fn exchange_frames(&mut self) {
        let mut in_flight: Vec<(PortRef, EthernetFrame)> = Vec::new();
        for p in self.ports() {
            in_flight.extend(self.port_queue(p).drain().into_iter().map(|f| (p, f)));
        }

        let now = self.now.as_millis();
        for (from, frame) in in_flight {
            let Some(seg) = self.attachments.get(&from).copied() else {
                trace!(from = ?from, "端口未接入任何以太网段，帧丢失");
                continue;
            };
            let Some(from_name) = self.interface_mut(from).map(|i| i.name().to_string()) else {
                continue;
            };
            for to in self.segments[seg.0].clone() {
                if to == from {
                    continue;
                }
                let Some(iface) = self.interface_mut(to) else {
                    trace!(to = ?to, "以太网段上的端口不存在");
                    continue;
                };
                let dst = frame.header.dst;
                if dst != iface.ethernet_address() && !dst.is_broadcast() {
                    continue;
                }
                let to_name = iface.name().to_string();
                iface.recv_frame(frame.clone());

                self.stats.frames_delivered += 1;
                self.stats.frame_bytes_delivered += frame.payload.len() as u64;
                if let Some(log) = &mut self.log {
                    log.push(
                        now,
                        SimEventKind::FrameDelivered {
                            from: from_name.clone(),
                            to: to_name,
                            frame_kind: FrameKind::from_ether_type(frame.header.ether_type),
                            bytes: frame.payload.len(),
                            broadcast: dst.is_broadcast(),
                        },
                    );
                }
            }
        }
    }

    fn collect_arrivals(&mut self) {
        let now = self.now.as_millis();
        for h in &mut self.hosts {
            let arrived: Vec<_> = h.interface.datagrams_received().drain(..).collect();
            for dgram in arrived {
                debug!(host = %h.name, src = %dgram.header.src_addr(), "数据报到达主机");
                self.stats.datagrams_delivered += 1;
                if let Some(log) = &mut self.log {
                    log.push(
                        now,
                        SimEventKind::DatagramArrived {
                            host: h.name.clone(),
                            src: dgram.header.src_addr().to_string(),
                            dst: dgram.header.dst_addr().to_string(),
                            ttl: dgram.header.ttl,
                            bytes: dgram.payload.len(),
                        },
                    );
                }
                h.received.push(dgram);
            }
        }
    }
}
