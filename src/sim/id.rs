//! 标识符类型
//!
//! 定义主机、路由器与以太网段的标识符。

/// 主机标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostId(pub usize);

/// 路由器标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouterId(pub usize);

/// 以太网段（广播域）标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(pub usize);

/// 接到以太网段上的一个端口：主机的唯一接口，或路由器的第 n 个接口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortRef {
    Host(HostId),
    Router(RouterId, usize),
}
