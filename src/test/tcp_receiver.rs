use crate::stream::{Reader, Writer, read};
use crate::tcp::{MAX_WINDOW_SIZE, TcpReceiver, TcpSenderMessage, Wrap32};

fn seg(seqno: Wrap32, syn: bool, payload: &str, fin: bool) -> TcpSenderMessage {
    TcpSenderMessage {
        seqno,
        syn,
        payload: payload.as_bytes().to_vec(),
        fin,
        rst: false,
    }
}

fn drain(r: &mut TcpReceiver) -> Vec<u8> {
    let mut out = Vec::new();
    read(r.reader(), u64::MAX, &mut out);
    out
}

#[test]
fn no_ackno_before_syn() {
    let mut r = TcpReceiver::with_capacity(100);
    let msg = r.send();
    assert_eq!(msg.ackno, None);
    assert_eq!(msg.window_size, 100);

    r.receive(seg(Wrap32::new(5), false, "abc", false));
    assert_eq!(r.send().ackno, None);
    assert_eq!(r.output().bytes_pushed(), 0);
}

#[test]
fn syn_sets_origin_and_acks_it() {
    let isn = Wrap32::new(1_000);
    let mut r = TcpReceiver::with_capacity(100);
    r.receive(seg(isn, true, "", false));
    assert_eq!(r.send().ackno, Some(isn + 1));

    r.receive(seg(isn + 1, false, "abc", false));
    assert_eq!(r.send().ackno, Some(isn + 4));
    assert_eq!(r.send().window_size, 97);
    assert_eq!(drain(&mut r), b"abc");
    assert_eq!(r.send().window_size, 100);
}

#[test]
fn syn_may_carry_payload_and_fin() {
    let isn = Wrap32::new(7);
    let mut r = TcpReceiver::with_capacity(100);
    r.receive(seg(isn, true, "hi", true));
    // SYN + 2 字节 + FIN
    assert_eq!(r.send().ackno, Some(isn + 4));
    assert!(r.output().is_closed());
    assert_eq!(drain(&mut r), b"hi");
}

#[test]
fn out_of_order_data_does_not_move_ackno() {
    let isn = Wrap32::new(u32::MAX - 1);
    let mut r = TcpReceiver::with_capacity(100);
    r.receive(seg(isn, true, "", false));
    r.receive(seg(isn + 3, false, "cd", false));
    assert_eq!(r.send().ackno, Some(isn + 1));
    assert_eq!(r.reassembler().count_bytes_pending(), 2);

    r.receive(seg(isn + 1, false, "ab", false));
    assert_eq!(r.send().ackno, Some(isn + 5));
    assert_eq!(drain(&mut r), b"abcd");
}

#[test]
fn fin_consumes_one_sequence_number() {
    let isn = Wrap32::new(0);
    let mut r = TcpReceiver::with_capacity(100);
    r.receive(seg(isn, true, "", false));
    r.receive(seg(isn + 1, false, "ab", true));
    assert_eq!(r.send().ackno, Some(isn + 4));
    assert!(r.output().is_closed());
}

#[test]
fn out_of_order_fin_is_acked_only_once_reached() {
    let isn = Wrap32::new(0);
    let mut r = TcpReceiver::with_capacity(100);
    r.receive(seg(isn, true, "", false));
    r.receive(seg(isn + 3, false, "c", true));
    assert_eq!(r.send().ackno, Some(isn + 1));
    r.receive(seg(isn + 1, false, "ab", false));
    assert_eq!(r.send().ackno, Some(isn + 5));
}

#[test]
fn window_is_capped_at_max_window_size() {
    let mut r = TcpReceiver::with_capacity(1_000_000);
    assert_eq!(r.send().window_size as u64, MAX_WINDOW_SIZE);
    r.receive(seg(Wrap32::new(0), true, "", false));
    assert_eq!(r.send().window_size as u64, MAX_WINDOW_SIZE);
}

#[test]
fn segment_at_syn_position_without_syn_is_dropped() {
    let isn = Wrap32::new(50);
    let mut r = TcpReceiver::with_capacity(100);
    r.receive(seg(isn, true, "", false));
    r.receive(seg(isn, false, "zz", false));
    assert_eq!(r.output().bytes_pushed(), 0);
    assert_eq!(r.send().ackno, Some(isn + 1));
}

#[test]
fn later_syn_does_not_move_origin() {
    let isn = Wrap32::new(50);
    let mut r = TcpReceiver::with_capacity(100);
    r.receive(seg(isn, true, "", false));
    r.receive(seg(Wrap32::new(9_999), true, "", false));
    r.receive(seg(isn + 1, false, "ok", false));
    assert_eq!(r.send().ackno, Some(isn + 3));
}

#[test]
fn rst_marks_stream_error() {
    let mut r = TcpReceiver::with_capacity(100);
    r.receive(seg(Wrap32::new(0), true, "", false));
    let mut rst = seg(Wrap32::new(1), false, "", false);
    rst.rst = true;
    r.receive(rst);
    assert!(r.send().rst);
    assert!(r.output().has_error());
}

#[test]
fn data_beyond_window_is_trimmed() {
    let isn = Wrap32::new(0);
    let mut r = TcpReceiver::with_capacity(4);
    r.receive(seg(isn, true, "abcdef", false));
    assert_eq!(r.send().ackno, Some(isn + 5));
    assert_eq!(r.send().window_size, 0);
    assert_eq!(r.output().bytes_buffered(), 4);
}
