//! End-to-end scenarios exercising the public `RleTransmitter`/`RleReceiver` facade together.

use rle::header::FragmentKind;
use rle::proto_type::PROTO_TYPE_IPV4;
use rle::{Config, Error, RleReceiver, RleTransmitter};

/// Drains every pending PPDU for `frag_id` out of `tx` and feeds each one to `rx`, returning the
/// SDU bytes of the ALPDU once `rx` reports it complete.
fn pump(tx: &mut RleTransmitter, rx: &mut RleReceiver, frag_id: u8) -> heapless::Vec<u8, 4096> {
    loop {
        let mut out = [0u8; 4096];
        let (kind, written) = tx.get_packet(frag_id, &mut out).unwrap();
        if let Some(completed) = rx.process_fragment(&out[..written]).unwrap() {
            return heapless::Vec::from_slice(rx.take_sdu(completed.frag_id)).unwrap();
        }
        if kind.is_last() {
            panic!("last fragment sent but receiver never reported completion");
        }
    }
}

#[test]
fn single_small_sdu_round_trips_as_one_complete_fragment() {
    let conf = Config::new(PROTO_TYPE_IPV4, false, false, true).unwrap();
    let mut tx = RleTransmitter::new(conf);
    let mut rx = RleReceiver::new(conf);

    let sdu = [0xABu8; 102];
    let frag_id = tx.encapsulate(&sdu, PROTO_TYPE_IPV4).unwrap();

    let mut out = [0u8; 4096];
    let (kind, written) = tx.get_packet(frag_id, &mut out).unwrap();
    assert_eq!(kind, FragmentKind::Complete);

    let completed = rx.process_fragment(&out[..written]).unwrap().unwrap();
    assert_eq!(completed.proto_type, PROTO_TYPE_IPV4);
    assert_eq!(rx.take_sdu(completed.frag_id), &sdu[..]);
}

#[test]
fn large_sdu_fragments_across_many_ppdus_at_small_burst_capacity() {
    let conf = Config::new(PROTO_TYPE_IPV4, true, false, false).unwrap();
    let mut tx = RleTransmitter::new(conf);
    let mut rx = RleReceiver::new(conf);

    let mut sdu = [0u8; 2000];
    for (i, b) in sdu.iter_mut().enumerate() {
        *b = (i % 256) as u8;
    }
    let frag_id = tx.encapsulate(&sdu, PROTO_TYPE_IPV4).unwrap();

    let mut kinds = heapless::Vec::<FragmentKind, 64>::new();
    let mut reassembled = None;
    loop {
        let mut out = [0u8; 500];
        let (kind, written) = tx.get_packet(frag_id, &mut out).unwrap();
        kinds.push(kind).unwrap();
        if let Some(completed) = rx.process_fragment(&out[..written]).unwrap() {
            reassembled = Some(heapless::Vec::<u8, 4096>::from_slice(rx.take_sdu(completed.frag_id)).unwrap());
        }
        if kind.is_last() {
            break;
        }
    }

    assert_eq!(kinds.first(), Some(&FragmentKind::Start));
    assert_eq!(kinds.last(), Some(&FragmentKind::End));
    assert!(kinds[1..kinds.len() - 1].iter().all(|k| *k == FragmentKind::Cont));
    assert_eq!(&reassembled.unwrap()[..], &sdu[..]);
}

#[test]
fn corrupted_crc_trailer_is_reported_as_lost() {
    let conf = Config::new(PROTO_TYPE_IPV4, true, false, false).unwrap();
    let mut tx = RleTransmitter::new(conf);
    let mut rx = RleReceiver::new(conf);

    let sdu = [0x42u8; 50];
    let frag_id = tx.encapsulate(&sdu, PROTO_TYPE_IPV4).unwrap();

    loop {
        let mut out = [0u8; 32];
        let (kind, written) = tx.get_packet(frag_id, &mut out).unwrap();
        if kind == FragmentKind::End {
            out[written - 1] ^= 0xFF;
            assert_eq!(rx.process_fragment(&out[..written]), Err(Error::TrailerMismatch));
            break;
        }
        rx.process_fragment(&out[..written]).unwrap();
    }

    let stats = rx.stats(frag_id);
    assert_eq!(stats.counter_lost, 1);
    assert_eq!(stats.counter_dropped, 1);
}

#[test]
fn two_interleaved_flows_reassemble_independently() {
    let conf = Config::new(PROTO_TYPE_IPV4, false, false, true).unwrap();
    let mut tx = RleTransmitter::new(conf);
    let mut rx = RleReceiver::new(conf);

    let sdu_a = [0x11u8; 300];
    let sdu_b = [0x22u8; 300];
    let frag_a = tx.encapsulate(&sdu_a, PROTO_TYPE_IPV4).unwrap();
    let frag_b = tx.encapsulate(&sdu_b, PROTO_TYPE_IPV4).unwrap();
    assert_ne!(frag_a, frag_b);

    let mut done_a = None;
    let mut done_b = None;
    loop {
        if done_a.is_none() {
            let mut out = [0u8; 100];
            let (kind, written) = tx.get_packet(frag_a, &mut out).unwrap();
            if let Some(c) = rx.process_fragment(&out[..written]).unwrap() {
                done_a = Some(heapless::Vec::<u8, 4096>::from_slice(rx.take_sdu(c.frag_id)).unwrap());
            }
            let _ = kind;
        }
        if done_b.is_none() {
            let mut out = [0u8; 100];
            let (kind, written) = tx.get_packet(frag_b, &mut out).unwrap();
            if let Some(c) = rx.process_fragment(&out[..written]).unwrap() {
                done_b = Some(heapless::Vec::<u8, 4096>::from_slice(rx.take_sdu(c.frag_id)).unwrap());
            }
            let _ = kind;
        }
        if done_a.is_some() && done_b.is_some() {
            break;
        }
    }

    assert_eq!(&done_a.unwrap()[..], &sdu_a[..]);
    assert_eq!(&done_b.unwrap()[..], &sdu_b[..]);
}

#[test]
fn stray_continuation_fragment_on_a_free_context_is_rejected() {
    let conf = Config::default();
    let mut rx = RleReceiver::new(conf);
    // S=0,E=0 (CONT), Length=1, LT_T_FID=2 (frag_id), one payload byte.
    let ppdu = [0x00, 0x0A, 0xAA];
    assert_eq!(rx.process_fragment(&ppdu), Err(Error::InvalidTransition));
    assert!(rx.is_free(2));
}

#[test]
fn compressed_protocol_type_round_trips_through_its_one_byte_code() {
    let conf = Config::new(0, false, true, false).unwrap();
    let mut tx = RleTransmitter::new(conf);
    let mut rx = RleReceiver::new(conf);

    let sdu = [0x55u8; 20];
    let frag_id = tx.encapsulate(&sdu, PROTO_TYPE_IPV4).unwrap();
    let sdu_out = pump(&mut tx, &mut rx, frag_id);
    assert_eq!(&sdu_out[..], &sdu[..]);
}
