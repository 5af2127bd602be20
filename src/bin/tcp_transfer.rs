//! TCP 传输仿真
//!
//! 发送方经由会丢包的逻辑链路把数据传给接收方，打印传输报告。

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use ustack_rs::sim::{TransferOpts, run_transfer};
use ustack_rs::tcp::{TcpConfig, Wrap32};

#[derive(Debug, Parser)]
#[command(name = "tcp-transfer", about = "TCP 单向传输仿真：sender -> receiver")]
struct Args {
    #[arg(long, default_value_t = 100_000)]
    data_bytes: u64,
    /// 接收缓冲容量（字节），决定通告窗口
    #[arg(long, default_value_t = 64_000)]
    recv_capacity: u64,
    /// 发送缓冲容量（字节）
    #[arg(long, default_value_t = 64_000)]
    send_capacity: u64,
    #[arg(long, default_value_t = 1_000)]
    max_payload: u64,
    /// 初始 RTO（毫秒）
    #[arg(long, default_value_t = 1_000)]
    rto_ms: u64,
    /// 固定 ISN
    #[arg(long)]
    isn: Option<u32>,
    /// 每 N 个段丢一个（0 表示不丢）
    #[arg(long, default_value_t = 0)]
    loss_every: u64,
    #[arg(long, default_value_t = 10)]
    tick_ms: u64,
    /// 仿真运行到多少毫秒
    #[arg(long, default_value_t = 600_000)]
    until_ms: u64,
    /// 输出报告 JSON 文件
    #[arg(long)]
    json: Option<PathBuf>,
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

    let opts = TransferOpts {
        data_bytes: args.data_bytes,
        tcp: TcpConfig {
            rt_timeout_ms: args.rto_ms,
            max_payload_size: args.max_payload,
            send_capacity: args.send_capacity,
            recv_capacity: args.recv_capacity,
            isn: args.isn.map(Wrap32::new),
        },
        loss_every: args.loss_every,
        tick_ms: args.tick_ms,
        until_ms: args.until_ms,
    };

    let report = run_transfer(&opts);

    println!(
        "done @ {}ms, delivered={}/{}, segments_sent={}, dropped={}, retransmissions={}, finished={}, data_ok={}",
        report.elapsed_ms,
        report.bytes_delivered,
        report.data_bytes,
        report.segments_sent,
        report.segments_dropped,
        report.retransmissions,
        report.finished,
        report.data_ok
    );

    if let Some(path) = args.json {
        let json = serde_json::to_string_pretty(&report).expect("serialize report");
        fs::write(&path, json).expect("write report json");
        eprintln!("wrote report to {}", path.display());
    }
}
