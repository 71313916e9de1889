//! Randomized robustness tests for the codec and the checksum engine.

use bytes::Bytes;
use rand::Rng;

use msp_gateway::amf::{
    amf0, amf3, decode_envelope, encode_envelope, AmfError, Header, Request, RequestEnvelope,
};
use msp_gateway::{checksum, AmfResult, CallArgument, ChecksumPreset};

fn random_argument(rng: &mut impl Rng, depth: usize) -> CallArgument {
    let kind = if depth == 0 { rng.gen_range(0..6) } else { rng.gen_range(0..8) };
    match kind {
        0 => CallArgument::Null,
        1 => CallArgument::Bool(rng.gen()),
        2 => CallArgument::Integer(rng.gen_range(-1_000_000_000i64..1_000_000_000)),
        3 => CallArgument::Double(rng.gen::<f64>() * 1e6),
        4 => {
            let len = rng.gen_range(0..12);
            CallArgument::Text((0..len).map(|_| rng.gen_range('a'..='z')).collect())
        }
        5 => {
            let len = rng.gen_range(0..64);
            CallArgument::bytes((0..len).map(|_| rng.gen::<u8>()).collect::<Vec<u8>>())
        }
        6 => CallArgument::Sequence((0..rng.gen_range(0..4)).map(|_| random_argument(rng, depth - 1)).collect()),
        _ => CallArgument::Mapping(
            (0..rng.gen_range(0..4))
                .map(|i| (format!("k{}", i + rng.gen_range(0..3)), random_argument(rng, depth - 1)))
                .collect(),
        ),
    }
}

#[test]
fn garbage_bodies_never_panic() {
    let mut rng = rand::thread_rng();
    for _ in 0..2000 {
        let len = rng.gen_range(0..256);
        let mut bogus: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        // keep a plausible version half the time so decoding goes deeper
        if bogus.len() >= 2 && rng.gen() {
            bogus[0] = 0;
            bogus[1] = 3;
        }
        let _ = decode_envelope(&bogus);
        let result = AmfResult::new(Bytes::from(bogus), 200);
        let _ = result.content();
    }
}

#[test]
fn truncated_envelopes_are_errors() {
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let params: Vec<CallArgument> = (0..3).map(|_| random_argument(&mut rng, 3)).collect();
        let envelope = RequestEnvelope::new()
            .header(Header::new("id", "x"))
            .request(Request { target: "M".into(), response: "/1".into(), params });
        let bytes = encode_envelope(&envelope, false).unwrap();
        assert!(decode_envelope(&bytes).is_ok());
        let cut = rng.gen_range(0..bytes.len());
        assert!(decode_envelope(&bytes[..cut]).is_err());
    }
}

#[test]
fn checksum_is_deterministic_over_random_trees() {
    let mut rng = rand::thread_rng();
    let preset = ChecksumPreset::default();
    for _ in 0..500 {
        let params: Vec<CallArgument> = (0..rng.gen_range(0..5)).map(|_| random_argument(&mut rng, 3)).collect();
        let first = checksum(&params, &preset);
        assert_eq!(first, checksum(&params.clone(), &preset));
        assert_eq!(first.len(), 40);
    }
}

/// A `/1/onResult` response whose body nests arrays of back-references: a few
/// hundred bytes that would expand to billions of nodes.
fn reference_bomb(levels: u8) -> Vec<u8> {
    let mut body = vec![amf0::AVMPLUS, amf3::ARRAY, ((levels + 1) << 1) | 1, 0x01];
    body.extend_from_slice(&[amf3::ARRAY, 0x03, 0x01, amf3::INTEGER, 0x01]);
    for level in 1..=levels {
        body.extend_from_slice(&[amf3::ARRAY, 0x81, 0x01, 0x01]);
        for _ in 0..64 {
            body.extend_from_slice(&[amf3::ARRAY, level << 1]);
        }
    }

    let target = b"/1/onResult";
    let mut bytes = vec![0x00, 0x03, 0x00, 0x00, 0x00, 0x01];
    bytes.extend_from_slice(&(target.len() as u16).to_be_bytes());
    bytes.extend_from_slice(target);
    bytes.extend_from_slice(&[0x00, 0x04, b'n', b'u', b'l', b'l']);
    bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&body);
    bytes
}

#[test]
fn reference_bombs_are_rejected() {
    let small = reference_bomb(1);
    assert!(decode_envelope(&small).is_ok());
    assert!(AmfResult::new(Bytes::from(small), 200).content().is_some());

    let bomb = reference_bomb(6);
    assert!(bomb.len() < 1024);
    assert!(matches!(decode_envelope(&bomb), Err(AmfError::TooLarge(_))));
    assert!(AmfResult::new(Bytes::from(bomb), 200).content().is_none());
}
