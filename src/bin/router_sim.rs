//! 路由仿真
//!
//! 读取场景 JSON，按固定步长运行，打印统计信息，可选写出事件 JSON。

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use ustack_rs::sim::{EventLog, Internet, Scenario, SimTime};

#[derive(Debug, Parser)]
#[command(name = "router-sim", about = "运行以太网 / ARP / IPv4 路由场景")]
struct Args {
    /// 场景文件（JSON）
    #[arg(long)]
    scenario: PathBuf,
    /// 仿真运行到多少毫秒
    #[arg(long, default_value_t = 1_000)]
    until_ms: u64,
    /// 每一步推进的毫秒数
    #[arg(long, default_value_t = 1)]
    step_ms: u64,
    /// 输出事件 JSON 文件
    #[arg(long)]
    events_json: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let scenario = Scenario::load(&args.scenario).expect("load scenario");
    let mut net = Internet::from_scenario(&scenario).expect("build scenario");
    if args.events_json.is_some() {
        net.log = Some(EventLog::default());
    }

    net.run_until(SimTime::from_millis(args.until_ms), args.step_ms);

    println!(
        "done @ {:?}, datagrams_sent={}, datagrams_delivered={}, frames_delivered={}",
        net.now(),
        net.stats.datagrams_sent,
        net.stats.datagrams_delivered,
        net.stats.frames_delivered
    );
    for host in net.hosts() {
        for dgram in host.received() {
            println!(
                "received host={} src={} ttl={} payload={:?}",
                host.name(),
                dgram.header.src_addr(),
                dgram.header.ttl,
                String::from_utf8_lossy(&dgram.payload)
            );
        }
    }
    println!(
        "stats {}",
        serde_json::to_string(&net.stats).expect("serialize stats")
    );

    if let Some(path) = args.events_json {
        if let Some(log) = net.log.take() {
            let json = serde_json::to_string_pretty(&log.events).expect("serialize events");
            fs::write(&path, json).expect("write events json");
            eprintln!("wrote events to {}", path.display());
        }
    }
}
