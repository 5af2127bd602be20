//! 场景描述（JSON）
//!
//! 一个场景列出主机、路由器（含接口与路由表）、以太网段以及定时发送的数据报，
//! 由 `Internet::from_scenario` 构建成可运行的仿真。
//!
//! 以太网段里的端口写作 `"h0"`（主机名）或 `"r0:eth0"`（路由器名:接口名）。

use std::net::Ipv4Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::PortRef;
use super::internet::Internet;
use super::time::SimTime;
use crate::wire::{EthernetAddress, InternetDatagram, Ipv4Header, ParseError};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad CIDR `{0}` (expected a.b.c.d/len)")]
    BadCidr(String),
    #[error("unknown port `{0}`")]
    UnknownPort(String),
    #[error("unknown host `{0}`")]
    UnknownHost(String),
    #[error("router `{router}` has no interface #{index}")]
    BadInterfaceIndex { router: String, index: usize },
    #[error("send from `{from}` has an oversized payload: {source}")]
    BadPayload { from: String, source: ParseError },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub schema_version: u32,
    #[serde(default)]
    pub hosts: Vec<HostSpec>,
    #[serde(default)]
    pub routers: Vec<RouterSpec>,
    #[serde(default)]
    pub segments: Vec<Vec<String>>,
    #[serde(default)]
    pub sends: Vec<SendSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSpec {
    pub name: String,
    /// 地址与子网，例如 `"10.0.0.2/24"`
    pub ip: String,
    pub mac: EthernetAddress,
    #[serde(default)]
    pub gateway: Option<Ipv4Addr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSpec {
    pub name: String,
    #[serde(default)]
    pub interfaces: Vec<RouterInterfaceSpec>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterInterfaceSpec {
    pub name: String,
    pub ip: Ipv4Addr,
    pub mac: EthernetAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    /// 例如 `"10.0.0.0/8"`
    pub prefix: String,
    #[serde(default)]
    pub next_hop: Option<Ipv4Addr>,
    /// 出接口下标（按 `interfaces` 中的顺序）
    pub interface: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendSpec {
    pub at_ms: u64,
    /// 发送主机名
    pub from: String,
    pub to: Ipv4Addr,
    #[serde(default)]
    pub ttl: Option<u8>,
    #[serde(default)]
    pub payload: String,
}

impl Scenario {
    pub fn from_json(s: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

/// 解析 `a.b.c.d/len`
pub fn parse_cidr(s: &str) -> Result<(Ipv4Addr, u8), ScenarioError> {
    let bad = || ScenarioError::BadCidr(s.to_string());
    let (addr, len) = s.split_once('/').ok_or_else(bad)?;
    let addr: Ipv4Addr = addr.trim().parse().map_err(|_| bad())?;
    let len: u8 = len.trim().parse().map_err(|_| bad())?;
    if len > 32 {
        return Err(bad());
    }
    Ok((addr, len))
}

impl Internet {
    /// 按场景构建仿真，并登记所有定时发送。
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, ScenarioError> {
        let mut net = Internet::default();

        for h in &scenario.hosts {
            let (ip, len) = parse_cidr(&h.ip)?;
            net.add_host(h.name.clone(), ip, len, h.mac, h.gateway);
        }

        for r in &scenario.routers {
            let id = net.add_router(r.name.clone());
            for iface in &r.interfaces {
                net.add_router_interface(id, &iface.name, iface.mac, iface.ip);
            }
            for route in &r.routes {
                if route.interface >= r.interfaces.len() {
                    return Err(ScenarioError::BadInterfaceIndex {
                        router: r.name.clone(),
                        index: route.interface,
                    });
                }
                let (prefix, len) = parse_cidr(&route.prefix)?;
                net.router_mut(id)
                    .add_route(prefix, len, route.next_hop, route.interface);
            }
        }

        for seg in &scenario.segments {
            let ports = seg
                .iter()
                .map(|name| resolve_port(scenario, &net, name))
                .collect::<Result<Vec<_>, _>>()?;
            net.add_segment(&ports);
        }

        for s in &scenario.sends {
            let from = net
                .find_host(&s.from)
                .ok_or_else(|| ScenarioError::UnknownHost(s.from.clone()))?;
            let src = net.host(from).ip_address();
            let mut dgram = InternetDatagram::new(
                src,
                s.to,
                Ipv4Header::PROTO_UDP,
                s.payload.as_bytes().to_vec(),
            )
            .map_err(|source| ScenarioError::BadPayload {
                from: s.from.clone(),
                source,
            })?;
            if let Some(ttl) = s.ttl {
                dgram.header.ttl = ttl;
                dgram.header.compute_checksum();
            }
            net.schedule_send(SimTime::from_millis(s.at_ms), from, dgram);
        }

        Ok(net)
    }
}

fn resolve_port(scenario: &Scenario, net: &Internet, name: &str) -> Result<PortRef, ScenarioError> {
    let unknown = || ScenarioError::UnknownPort(name.to_string());
    match name.split_once(':') {
        None => net.find_host(name).map(PortRef::Host).ok_or_else(unknown),
        Some((router, iface)) => {
            let id = net.find_router(router).ok_or_else(unknown)?;
            let index = scenario.routers[id.0]
                .interfaces
                .iter()
                .position(|i| i.name == iface)
                .ok_or_else(unknown)?;
            Ok(PortRef::Router(id, index))
        }
    }
}
