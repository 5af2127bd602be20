//! 仿真模块
//!
//! 逻辑时钟驱动的测试台：把主机、路由器与以太网段连成一个小型互联网，按固定
//! 步长推进；以及一个单向 TCP 传输仿真。

mod event_log;
mod id;
mod internet;
mod scenario;
mod scheduled_send;
mod stats;
mod time;
mod transfer;

pub use event_log::{EventLog, FrameKind, SimEvent, SimEventKind};
pub use id::{HostId, PortRef, RouterId, SegmentId};
pub use internet::{Host, Internet, SimRouter};
pub use scenario::{
    HostSpec, RouteSpec, RouterInterfaceSpec, RouterSpec, Scenario, ScenarioError, SendSpec,
    parse_cidr,
};
pub use scheduled_send::ScheduledSend;
pub use stats::Stats;
pub use time::SimTime;
pub use transfer::{TransferOpts, TransferReport, run_transfer};
