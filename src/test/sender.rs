use crate::net::{Message, Packet, RetransmitCause, Tamper};
use crate::proto::{Protocol, SenderConfig, SenderEndpoint};
use crate::sim::SimTime;

use super::Recorder;

fn sender(protocol: Protocol, window_size: u64, ssthresh: u64) -> SenderEndpoint {
    SenderEndpoint::new(SenderConfig {
        protocol,
        window_size,
        ssthresh,
        timeout: SimTime::from_millis(20),
    })
}

fn send_all(s: &mut SenderEndpoint, rec: &mut Recorder, msgs: &[&str]) {
    for m in msgs {
        s.send(Message::from(*m), rec);
    }
}

#[test]
fn gbn_full_window_queues_then_releases_on_ack() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Gbn, 3, 8);
    send_all(&mut s, &mut rec, &["a", "b", "c", "d"]);

    assert_eq!(rec.seqs(), vec![0, 1, 2]);
    assert_eq!(s.window().pending_len(), 1);
    assert_eq!(s.base(), 0);

    s.on_ack(Packet::ack(1), &mut rec);
    assert_eq!(s.base(), 1);
    assert_eq!(rec.seqs(), vec![0, 1, 2, 3]);
    assert_eq!(rec.payloads().last().map(String::as_str), Some("d"));
    assert_eq!(s.window().pending_len(), 0);
}

#[test]
fn data_packets_mirror_sequence_into_ack_field() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Gbn, 0, 8);
    send_all(&mut s, &mut rec, &["a", "b"]);
    assert_eq!(rec.acks(), rec.seqs());
    assert!(rec.sent.iter().all(Packet::is_intact));
}

#[test]
fn in_flight_never_exceeds_window() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Gbn, 2, 8);
    for i in 0..6 {
        s.send(Message::from(format!("m{i}")), &mut rec);
        assert!(s.window().in_flight() <= 2);
    }
    for ack in 1..=6 {
        s.on_ack(Packet::ack(ack), &mut rec);
        assert!(s.window().in_flight() <= 2);
    }
    assert!(s.is_idle());
    assert_eq!(rec.seqs(), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn one_timer_covers_many_packets() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Gbn, 5, 8);
    send_all(&mut s, &mut rec, &["a", "b", "c"]);
    assert_eq!(rec.arms, 1);
    assert!(s.timer_armed());
}

#[test]
fn repeated_ack_advances_base_once() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Gbn, 4, 8);
    send_all(&mut s, &mut rec, &["a", "b", "c"]);
    for _ in 0..5 {
        s.on_ack(Packet::ack(2), &mut rec);
    }
    assert_eq!(s.base(), 2);
    assert_eq!(s.stats().dup_acks, 4);
}

#[test]
fn stale_ack_never_moves_window_back() {
    for protocol in [Protocol::Gbn, Protocol::Tcp] {
        let mut rec = Recorder::default();
        let mut s = sender(protocol, 4, 8);
        send_all(&mut s, &mut rec, &["a", "b", "c"]);
        s.on_ack(Packet::ack(2), &mut rec);
        s.on_ack(Packet::ack(1), &mut rec);
        s.on_ack(Packet::ack(0), &mut rec);
        assert_eq!(s.base(), 2, "{protocol}");
    }
}

#[test]
fn gbn_has_no_fast_retransmit() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Gbn, 4, 8);
    send_all(&mut s, &mut rec, &["a", "b", "c"]);
    rec.clear_sent();
    for _ in 0..6 {
        s.on_ack(Packet::ack(0), &mut rec);
    }
    assert!(rec.sent.is_empty());
    assert_eq!(s.stats().fast_retransmits, 0);
}

#[test]
fn timer_stops_when_everything_is_acked_and_restarts_otherwise() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Gbn, 4, 8);
    send_all(&mut s, &mut rec, &["a", "b", "c"]);

    s.on_ack(Packet::ack(1), &mut rec);
    assert!(s.timer_armed());
    assert_eq!((rec.arms, rec.cancels), (2, 1));

    s.on_ack(Packet::ack(3), &mut rec);
    assert!(!s.timer_armed());
    assert!(!rec.timer_running);
    assert_eq!(rec.cancels, 2);
}

#[test]
fn gbn_timeout_resends_whole_window_and_rearms() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Gbn, 3, 8);
    send_all(&mut s, &mut rec, &["a", "b", "c", "d", "e"]);
    s.on_ack(Packet::ack(1), &mut rec);
    rec.clear_sent();

    rec.fire_timer();
    s.on_timeout(&mut rec);
    assert_eq!(rec.seqs(), vec![1, 2, 3]);
    assert!(rec
        .retransmits
        .iter()
        .all(|(_, c)| *c == RetransmitCause::Timeout));
    assert!(s.timer_armed());
    assert!(rec.timer_running);
    assert_eq!(s.stats().timeouts, 1);
}

#[test]
fn timeout_only_resends_what_was_actually_sent() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Gbn, 8, 8);
    send_all(&mut s, &mut rec, &["a", "b"]);
    rec.clear_sent();
    rec.fire_timer();
    s.on_timeout(&mut rec);
    assert_eq!(rec.seqs(), vec![0, 1]);
}

#[test]
fn timeout_with_nothing_in_flight_does_nothing() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Gbn, 4, 8);
    s.on_timeout(&mut rec);
    assert!(rec.sent.is_empty());
    assert_eq!(rec.arms, 0);
}

#[test]
fn zero_window_is_unbounded() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Tcp, 0, 8);
    let msgs: Vec<String> = (0..10).map(|i| format!("m{i}")).collect();
    for m in &msgs {
        s.send(Message::from(m.as_str()), &mut rec);
    }
    assert_eq!(rec.sent.len(), 10);

    s.on_ack(Packet::ack(4), &mut rec);
    assert_eq!(s.window_size(), 0, "unbounded window must not grow");

    rec.clear_sent();
    rec.fire_timer();
    s.on_timeout(&mut rec);
    assert_eq!(rec.seqs(), (4..10).collect::<Vec<_>>());
}

#[test]
fn enlarging_the_window_keeps_fifo_order() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Gbn, 1, 8);
    send_all(&mut s, &mut rec, &["a", "b"]);
    assert_eq!(rec.payloads(), vec!["a"]);

    s.set_window_size(3);
    s.send(Message::from("c"), &mut rec);
    assert_eq!(rec.payloads(), vec!["a", "b", "c"]);
}

#[test]
fn tcp_slow_start_doubles_then_grows_linearly() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Tcp, 1, 4);
    let msgs: Vec<String> = (0..10).map(|i| format!("m{i}")).collect();
    for m in &msgs {
        s.send(Message::from(m.as_str()), &mut rec);
    }
    assert_eq!(rec.seqs(), vec![0]);

    s.on_ack(Packet::ack(1), &mut rec);
    assert_eq!(s.window_size(), 2);
    assert_eq!(s.next_seq(), 3);

    s.on_ack(Packet::ack(2), &mut rec);
    assert_eq!(s.window_size(), 4);
    assert_eq!(s.next_seq(), 6);

    s.on_ack(Packet::ack(3), &mut rec);
    assert_eq!(s.window_size(), 5);
    assert_eq!(s.next_seq(), 8);
    assert_eq!(s.ssthresh(), Some(4));
}

#[test]
fn tcp_fourth_identical_ack_triggers_fast_retransmit() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Tcp, 8, 8);
    send_all(&mut s, &mut rec, &["m0", "m1", "m2", "m3", "m4", "m5"]);
    s.on_ack(Packet::ack(5), &mut rec);
    assert_eq!(s.base(), 5);
    let window_before = s.window_size();
    rec.clear_sent();

    s.on_ack(Packet::ack(5), &mut rec);
    s.on_ack(Packet::ack(5), &mut rec);
    assert!(rec.sent.is_empty());
    assert_eq!(s.dup_acks(), 2);

    s.on_ack(Packet::ack(5), &mut rec);
    assert_eq!(rec.seqs(), vec![5]);
    assert_eq!(rec.payloads(), vec!["m5"]);
    assert_eq!(rec.retransmits, vec![(5, RetransmitCause::FastRetransmit)]);
    assert_eq!(s.window_size(), 1);
    assert_eq!(s.ssthresh(), Some((window_before / 2).max(2)));
    assert_eq!(s.dup_acks(), 0);
    assert_eq!(s.stats().fast_retransmits, 1);
    // 没有等定时器
    assert!(s.timer_armed());
    assert_eq!(s.stats().timeouts, 0);
}

#[test]
fn tcp_first_ack_zero_is_not_a_duplicate() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Tcp, 4, 8);
    send_all(&mut s, &mut rec, &["a", "b", "c"]);
    rec.clear_sent();

    for _ in 0..3 {
        s.on_ack(Packet::ack(0), &mut rec);
    }
    assert!(rec.sent.is_empty());
    assert_eq!(s.dup_acks(), 2);
    assert_eq!(s.stats().fast_retransmits, 0);
    assert_eq!(s.window_size(), 4);

    s.on_ack(Packet::ack(0), &mut rec);
    assert_eq!(s.stats().fast_retransmits, 1);
    assert_eq!(rec.seqs(), vec![0]);
    assert_eq!(rec.retransmits, vec![(0, RetransmitCause::FastRetransmit)]);
    assert_eq!(s.window_size(), 1);
}

#[test]
fn tcp_new_ack_resets_duplicate_count() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Tcp, 4, 8);
    send_all(&mut s, &mut rec, &["a", "b", "c"]);
    s.on_ack(Packet::ack(0), &mut rec);
    s.on_ack(Packet::ack(0), &mut rec);
    s.on_ack(Packet::ack(0), &mut rec);
    assert_eq!(s.dup_acks(), 2);
    s.on_ack(Packet::ack(1), &mut rec);
    assert_eq!(s.dup_acks(), 0);
    s.on_ack(Packet::ack(1), &mut rec);
    s.on_ack(Packet::ack(1), &mut rec);
    assert_eq!(s.stats().fast_retransmits, 0);
}

#[test]
fn damaged_acks_are_ignored() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Tcp, 4, 8);
    send_all(&mut s, &mut rec, &["a", "b", "c"]);

    let mut corrupt = Packet::ack(2);
    corrupt.tamper(Tamper::Payload { index: 0 });
    s.on_ack(corrupt, &mut rec);

    let mut bumped = Packet::ack(1);
    bumped.tamper(Tamper::AckBump);
    s.on_ack(bumped, &mut rec);

    assert_eq!(s.base(), 0);
    assert_eq!(s.stats().bad_acks, 2);
    assert_eq!(s.stats().acks_received, 0);
}

#[test]
fn ack_for_unsent_data_is_ignored() {
    let mut rec = Recorder::default();
    let mut s = sender(Protocol::Gbn, 4, 8);
    send_all(&mut s, &mut rec, &["a"]);
    s.on_ack(Packet::ack(7), &mut rec);
    assert_eq!(s.base(), 0);
    assert_eq!(s.stats().stale_acks, 1);
}
