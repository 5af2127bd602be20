use crate::sim::{TransferOpts, run_transfer};
use crate::tcp::{TcpConfig, Wrap32};

#[test]
fn lossless_transfer_completes_without_retransmissions() {
    let opts = TransferOpts {
        data_bytes: 50_000,
        ..TransferOpts::default()
    };
    let report = run_transfer(&opts);
    assert!(report.finished);
    assert!(report.data_ok);
    assert_eq!(report.bytes_delivered, 50_000);
    assert_eq!(report.retransmissions, 0);
    assert_eq!(report.segments_dropped, 0);
}

#[test]
fn lossy_link_recovers_through_retransmission() {
    let opts = TransferOpts {
        data_bytes: 20_000,
        loss_every: 7,
        tcp: TcpConfig {
            rt_timeout_ms: 50,
            max_payload_size: 500,
            ..TcpConfig::default()
        },
        ..TransferOpts::default()
    };
    let report = run_transfer(&opts);
    assert!(report.finished, "{report:?}");
    assert!(report.data_ok);
    assert!(report.segments_dropped > 0);
    assert!(report.retransmissions > 0);
}

#[test]
fn small_receive_window_still_delivers_everything() {
    let opts = TransferOpts {
        data_bytes: 10_000,
        tcp: TcpConfig {
            recv_capacity: 700,
            max_payload_size: 300,
            isn: Some(Wrap32::new(u32::MAX)),
            ..TcpConfig::default()
        },
        ..TransferOpts::default()
    };
    let report = run_transfer(&opts);
    assert!(report.finished, "{report:?}");
    assert!(report.data_ok);
}

#[test]
fn empty_transfer_exchanges_syn_and_fin_only() {
    let opts = TransferOpts {
        data_bytes: 0,
        ..TransferOpts::default()
    };
    let report = run_transfer(&opts);
    assert!(report.finished);
    assert!(report.data_ok);
    assert_eq!(report.segments_sent, 2);
}

#[test]
fn deadline_stops_a_link_that_drops_everything() {
    let opts = TransferOpts {
        data_bytes: 1_000,
        loss_every: 1,
        until_ms: 5_000,
        ..TransferOpts::default()
    };
    let report = run_transfer(&opts);
    assert!(!report.finished);
    assert_eq!(report.bytes_delivered, 0);
    assert_eq!(report.segments_dropped, report.segments_sent);
    assert!(report.max_consecutive_retransmissions >= 2);
}
