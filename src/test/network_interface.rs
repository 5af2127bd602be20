use std::net::Ipv4Addr;

use crate::net::{ARP_CACHE_TTL_MS, ARP_REQUEST_TTL_MS, FrameQueue, NetworkInterface};
use crate::wire::{
    ArpMessage, EthernetAddress, EthernetFrame, EthernetHeader, InternetDatagram, Ipv4Header,
};

const LOCAL_MAC: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 0, 0x01]);
const LOCAL_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
const PEER_MAC: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 0, 0x02]);
const PEER_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);

fn interface() -> (NetworkInterface, FrameQueue) {
    let port = FrameQueue::new();
    let iface = NetworkInterface::new("eth0", Box::new(port.clone()), LOCAL_MAC, LOCAL_IP);
    (iface, port)
}

fn datagram(dst: Ipv4Addr, payload: &str) -> InternetDatagram {
    InternetDatagram::new(LOCAL_IP, dst, Ipv4Header::PROTO_UDP, payload.as_bytes().to_vec())
        .expect("datagram")
}

fn arp_frame(msg: ArpMessage, dst: EthernetAddress) -> EthernetFrame {
    EthernetFrame {
        header: EthernetHeader {
            dst,
            src: msg.sender_ethernet_address,
            ether_type: EthernetHeader::TYPE_ARP,
        },
        payload: msg.to_bytes(),
    }
}

fn peer_reply() -> EthernetFrame {
    arp_frame(
        ArpMessage {
            opcode: ArpMessage::OPCODE_REPLY,
            sender_ethernet_address: PEER_MAC,
            sender_ip_address: PEER_IP.into(),
            target_ethernet_address: LOCAL_MAC,
            target_ip_address: LOCAL_IP.into(),
        },
        LOCAL_MAC,
    )
}

fn expect_arp(frame: &EthernetFrame) -> ArpMessage {
    assert_eq!(frame.header.ether_type, EthernetHeader::TYPE_ARP);
    ArpMessage::parse(&frame.payload).expect("parse ARP payload")
}

fn expect_ipv4(frame: &EthernetFrame) -> InternetDatagram {
    assert_eq!(frame.header.ether_type, EthernetHeader::TYPE_IPV4);
    InternetDatagram::parse(&frame.payload).expect("parse IPv4 payload")
}

#[test]
fn unknown_next_hop_triggers_single_arp_request() {
    let (mut iface, port) = interface();
    iface.send_datagram(datagram(PEER_IP, "one"), PEER_IP);
    iface.send_datagram(datagram(PEER_IP, "two"), PEER_IP);

    let frames = port.drain();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].header.dst.is_broadcast());
    assert_eq!(frames[0].header.src, LOCAL_MAC);
    let req = expect_arp(&frames[0]);
    assert!(req.is_request());
    assert_eq!(req.sender_ip_address, u32::from(LOCAL_IP));
    assert_eq!(req.target_ip_address, u32::from(PEER_IP));

    assert!(iface.has_pending_arp_request(PEER_IP));
    assert_eq!(iface.queued_datagram_count(PEER_IP), 2);
}

#[test]
fn arp_reply_flushes_queued_datagrams_in_order() {
    let (mut iface, port) = interface();
    iface.send_datagram(datagram(PEER_IP, "one"), PEER_IP);
    iface.send_datagram(datagram(PEER_IP, "two"), PEER_IP);
    port.drain();

    iface.recv_frame(peer_reply());
    let frames = port.drain();
    assert_eq!(frames.len(), 2);
    for f in &frames {
        assert_eq!(f.header.dst, PEER_MAC);
    }
    assert_eq!(expect_ipv4(&frames[0]).payload, b"one");
    assert_eq!(expect_ipv4(&frames[1]).payload, b"two");

    assert_eq!(iface.cached_ethernet_address(PEER_IP), Some(PEER_MAC));
    assert!(!iface.has_pending_arp_request(PEER_IP));
    assert_eq!(iface.queued_datagram_count(PEER_IP), 0);
    // 回复不是发给上层的数据报
    assert!(iface.datagrams_received().is_empty());
}

#[test]
fn cached_mapping_sends_immediately() {
    let (mut iface, port) = interface();
    iface.recv_frame(peer_reply());
    assert!(port.is_empty());

    // 下一跳与目的地址不同：帧发给下一跳
    let far = Ipv4Addr::new(8, 8, 8, 8);
    iface.send_datagram(datagram(far, "x"), PEER_IP);
    let frame = port.pop().expect("one frame");
    assert_eq!(frame.header.dst, PEER_MAC);
    assert_eq!(expect_ipv4(&frame).header.dst_addr(), far);
    assert!(port.is_empty());
}

#[test]
fn cache_entries_expire_after_thirty_seconds() {
    let (mut iface, port) = interface();
    iface.recv_frame(peer_reply());

    iface.tick(ARP_CACHE_TTL_MS - 1);
    assert_eq!(iface.cached_ethernet_address(PEER_IP), Some(PEER_MAC));
    iface.tick(1);
    assert_eq!(iface.cached_ethernet_address(PEER_IP), None);

    iface.send_datagram(datagram(PEER_IP, "again"), PEER_IP);
    let frame = port.pop().expect("ARP request");
    assert!(expect_arp(&frame).is_request());
}

#[test]
fn arp_request_is_not_repeated_within_five_seconds() {
    let (mut iface, port) = interface();
    iface.send_datagram(datagram(PEER_IP, "a"), PEER_IP);
    assert_eq!(port.drain().len(), 1);

    iface.tick(ARP_REQUEST_TTL_MS - 1);
    iface.send_datagram(datagram(PEER_IP, "b"), PEER_IP);
    assert!(port.is_empty());
    assert_eq!(iface.queued_datagram_count(PEER_IP), 2);

    // 请求过期：排队的数据报一并丢弃
    iface.tick(1);
    assert!(!iface.has_pending_arp_request(PEER_IP));
    assert_eq!(iface.queued_datagram_count(PEER_IP), 0);

    iface.send_datagram(datagram(PEER_IP, "c"), PEER_IP);
    let frames = port.drain();
    assert_eq!(frames.len(), 1);
    assert!(expect_arp(&frames[0]).is_request());

    iface.recv_frame(peer_reply());
    let frames = port.drain();
    assert_eq!(frames.len(), 1);
    assert_eq!(expect_ipv4(&frames[0]).payload, b"c");
}

#[test]
fn replies_to_arp_request_for_own_address() {
    let (mut iface, port) = interface();
    let req = ArpMessage::request(PEER_MAC, PEER_IP, LOCAL_IP);
    iface.recv_frame(arp_frame(req, EthernetAddress::BROADCAST));

    let frame = port.pop().expect("ARP reply");
    assert_eq!(frame.header.dst, PEER_MAC);
    let reply = expect_arp(&frame);
    assert_eq!(reply.opcode, ArpMessage::OPCODE_REPLY);
    assert_eq!(reply.sender_ethernet_address, LOCAL_MAC);
    assert_eq!(reply.sender_ip_address, u32::from(LOCAL_IP));
    assert_eq!(reply.target_ethernet_address, PEER_MAC);
    assert_eq!(reply.target_ip_address, u32::from(PEER_IP));

    // 顺便学到了请求方的映射
    assert_eq!(iface.cached_ethernet_address(PEER_IP), Some(PEER_MAC));
}

#[test]
fn learns_from_request_for_other_address_without_replying() {
    let (mut iface, port) = interface();
    let req = ArpMessage::request(PEER_MAC, PEER_IP, Ipv4Addr::new(10, 0, 0, 99));
    iface.recv_frame(arp_frame(req, EthernetAddress::BROADCAST));
    assert!(port.is_empty());
    assert_eq!(iface.cached_ethernet_address(PEER_IP), Some(PEER_MAC));
}

#[test]
fn accepts_ipv4_addressed_to_it_only() {
    let (mut iface, _port) = interface();
    let d = InternetDatagram::new(PEER_IP, LOCAL_IP, Ipv4Header::PROTO_UDP, b"hi".to_vec())
        .expect("datagram");
    let frame = |dst| EthernetFrame {
        header: EthernetHeader {
            dst,
            src: PEER_MAC,
            ether_type: EthernetHeader::TYPE_IPV4,
        },
        payload: d.to_bytes(),
    };

    iface.recv_frame(frame(EthernetAddress([0x02, 0, 0, 0, 0, 0x77])));
    assert!(iface.datagrams_received().is_empty());

    iface.recv_frame(frame(LOCAL_MAC));
    assert_eq!(iface.datagrams_received().pop_front(), Some(d.clone()));
}

#[test]
fn malformed_payloads_are_dropped() {
    let (mut iface, port) = interface();
    let garbage = |ether_type| EthernetFrame {
        header: EthernetHeader {
            dst: LOCAL_MAC,
            src: PEER_MAC,
            ether_type,
        },
        payload: vec![0x45, 0, 0],
    };
    iface.recv_frame(garbage(EthernetHeader::TYPE_IPV4));
    iface.recv_frame(garbage(EthernetHeader::TYPE_ARP));
    iface.recv_frame(garbage(0x86dd));
    assert!(iface.datagrams_received().is_empty());
    assert!(port.is_empty());
    assert_eq!(iface.cached_ethernet_address(PEER_IP), None);
}

#[test]
fn cache_entry_expires_under_one_millisecond_ticks() {
    let (mut iface, _port) = interface();
    iface.recv_frame(peer_reply());
    for _ in 0..ARP_CACHE_TTL_MS - 1 {
        iface.tick(1);
    }
    assert_eq!(iface.cached_ethernet_address(PEER_IP), Some(PEER_MAC));
    iface.tick(1);
    assert_eq!(iface.cached_ethernet_address(PEER_IP), None);
}
