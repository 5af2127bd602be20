//! 路由器：最长前缀匹配转发
//!
//! 路由表按前缀长度（0..=32）分组，每组以“目的地址的高 `len` 位”为键。查找时从
//! /32 到 /0 逐组检查，第一个命中的即为最长匹配。

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use tracing::{debug, info, trace, warn};

use super::interface::NetworkInterface;

/// 一条转发规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub interface_index: usize,
    /// 为空表示目的网络直连，下一跳即数据报的目的地址
    pub next_hop: Option<Ipv4Addr>,
}

#[derive(Debug)]
pub struct Router {
    interfaces: Vec<NetworkInterface>,
    /// routing_tables[len]: 前缀高位 -> 规则
    routing_tables: Vec<BTreeMap<u32, RouteEntry>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// 取 `addr` 的高 `prefix_length` 位
fn prefix_key(addr: u32, prefix_length: u8) -> u32 {
    match prefix_length {
        0 => 0,
        len => addr >> (32 - len as u32),
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            interfaces: Vec::new(),
            routing_tables: vec![BTreeMap::new(); 33],
        }
    }

    /// 添加接口，返回其下标
    pub fn add_interface(&mut self, interface: NetworkInterface) -> usize {
        self.interfaces.push(interface);
        self.interfaces.len() - 1
    }

    pub fn interface(&self, index: usize) -> Option<&NetworkInterface> {
        self.interfaces.get(index)
    }

    pub fn interface_mut(&mut self, index: usize) -> Option<&mut NetworkInterface> {
        self.interfaces.get_mut(index)
    }

    pub fn interfaces_mut(&mut self) -> impl Iterator<Item = &mut NetworkInterface> {
        self.interfaces.iter_mut()
    }

    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }

    /// 注册转发规则：`route_prefix` 的高 `prefix_length` 位需与目的地址一致。
    ///
    /// 同一前缀重复添加时保留先添加的规则。`prefix_length` 大于 32 时按 32 处理。
    pub fn add_route(
        &mut self,
        route_prefix: Ipv4Addr,
        prefix_length: u8,
        next_hop: Option<Ipv4Addr>,
        interface_index: usize,
    ) {
        let prefix_length = prefix_length.min(32);
        let via = next_hop.map_or_else(|| "(direct)".to_string(), |h| h.to_string());
        info!(
            prefix = %route_prefix,
            prefix_length,
            next_hop = %via,
            interface_index,
            "添加路由"
        );
        let key = prefix_key(route_prefix.into(), prefix_length);
        let table = &mut self.routing_tables[prefix_length as usize];
        if table.contains_key(&key) {
            warn!(prefix = %route_prefix, prefix_length, "路由已存在，保留原有规则");
            return;
        }
        table.insert(
            key,
            RouteEntry {
                interface_index,
                next_hop,
            },
        );
    }

    /// 最长前缀匹配
    pub fn lookup(&self, dst: Ipv4Addr) -> Option<RouteEntry> {
        let dst = u32::from(dst);
        (0..=32u8)
            .rev()
            .find_map(|len| self.routing_tables[len as usize].get(&prefix_key(dst, len)).copied())
    }

    /// 取出所有接口收到的数据报并转发。
    #[tracing::instrument(skip(self))]
    pub fn route(&mut self) {
        for in_index in 0..self.interfaces.len() {
            let incoming: Vec<_> = self.interfaces[in_index].datagrams_received().drain(..).collect();
            for mut dgram in incoming {
                if dgram.header.ttl <= 1 {
                    debug!(dst = %dgram.header.dst_addr(), ttl = dgram.header.ttl, "TTL 耗尽，丢弃");
                    continue;
                }
                dgram.header.ttl -= 1;
                dgram.header.compute_checksum();

                let dst = dgram.header.dst_addr();
                let Some(route) = self.lookup(dst) else {
                    debug!(dst = %dst, "没有匹配的路由，丢弃");
                    continue;
                };
                let Some(out) = self.interfaces.get_mut(route.interface_index) else {
                    warn!(interface_index = route.interface_index, "路由指向不存在的接口，丢弃");
                    continue;
                };
                let next_hop = route.next_hop.unwrap_or(dst);
                trace!(
                    dst = %dst,
                    from = in_index,
                    to = route.interface_index,
                    next_hop = %next_hop,
                    "转发数据报"
                );
                out.send_datagram(dgram, next_hop);
            }
        }
    }
}
