//! Request integrity checksum (the envelope's `id` header).
//!
//! The gateway recomputes this digest over the decoded call arguments and
//! drops calls whose `id` does not match, so every rule below is part of the
//! wire contract:
//!
//! - leaves render as text: null → "", bools as `True`/`False`, integers in
//!   decimal, strings verbatim; doubles contribute nothing
//! - byte buffers up to 20 bytes are hex encoded; longer ones are sampled down
//!   to 20 bytes at offsets `i * (len / 20)` first
//! - dates render as `<year><month - 1><day>` without padding
//! - sequences visit items in order, mappings visit keys in ascending order;
//!   a mapping or object carrying a `Ticket` entry renders as ""
//! - a mapping key contributes only the first time it is met anywhere in the
//!   tree; later occurrences render as ""
//! - the digest is SHA-1 over `fragments + salt + ticket fragment`, where the
//!   ticket fragment is taken from the first top-level ticket containing a
//!   comma (field 0 plus the last five characters of field 5) or is the
//!   preset's no-ticket value when there is none or it has too few fields

use chrono::Datelike;
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;

use super::{CallArgument, ChecksumPreset};

/// Sampled byte-buffer fingerprint width.
pub const BYTE_SAMPLE_LEN: usize = 20;

const TICKET_KEY: &str = "Ticket";
const TICKET_TAIL_CHARS: usize = 5;

/// Checksum over a call's ordered parameter list.
pub fn checksum(params: &[CallArgument], preset: &ChecksumPreset) -> String {
    let mut traversal = Traversal::default();
    for param in params {
        traversal.visit(param);
    }
    let ticket = ticket_fragment(params);
    digest(traversal.out, preset, ticket)
}

/// Checksum over an arbitrary tree. A sequence root behaves exactly like a
/// parameter list; any other root has no top level to find a ticket in.
pub fn checksum_tree(tree: &CallArgument, preset: &ChecksumPreset) -> String {
    match tree {
        CallArgument::Sequence(items) => checksum(items, preset),
        other => {
            let mut traversal = Traversal::default();
            traversal.visit(other);
            digest(traversal.out, preset, None)
        }
    }
}

fn digest(mut input: String, preset: &ChecksumPreset, ticket: Option<String>) -> String {
    input.push_str(&preset.salt);
    match ticket {
        Some(fragment) => input.push_str(&fragment),
        None => input.push_str(&preset.no_ticket_value),
    }
    hex::encode(Sha1::digest(input.as_bytes()))
}

/// Per-call traversal state: the serialized fragments so far and the mapping
/// keys already hashed. Never outlives one checksum computation.
#[derive(Default)]
struct Traversal<'a> {
    seen: HashSet<&'a str>,
    out: String,
}

impl<'a> Traversal<'a> {
    fn visit(&mut self, node: &'a CallArgument) {
        match node {
            CallArgument::Null | CallArgument::Double(_) | CallArgument::Ticket(_) => {}
            CallArgument::Bool(true) => self.out.push_str("True"),
            CallArgument::Bool(false) => self.out.push_str("False"),
            CallArgument::Integer(n) => {
                let _ = write!(self.out, "{}", n);
            }
            CallArgument::Text(s) => self.out.push_str(s),
            CallArgument::Bytes(bytes) => self.out.push_str(&fingerprint_bytes(bytes)),
            CallArgument::Date(date) => {
                let _ = write!(self.out, "{}{}{}", date.year(), date.month0(), date.day());
            }
            CallArgument::Sequence(items) => {
                for item in items {
                    self.visit(item);
                }
            }
            CallArgument::Mapping(map) => {
                if !map.contains_key(TICKET_KEY) {
                    self.visit_mapping(map);
                }
            }
        }
    }

    fn visit_mapping(&mut self, map: &'a BTreeMap<String, CallArgument>) {
        for (key, value) in map {
            if self.seen.contains(key.as_str()) {
                continue;
            }
            // marked after the value: a nested repeat inside it still counts
            self.visit(value);
            self.seen.insert(key.as_str());
        }
    }
}

/// Hex of the buffer, sampled down to `BYTE_SAMPLE_LEN` bytes when longer.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    if bytes.len() <= BYTE_SAMPLE_LEN {
        return hex::encode(bytes);
    }
    let step = bytes.len() / BYTE_SAMPLE_LEN;
    let sampled: Vec<u8> = (0..BYTE_SAMPLE_LEN).map(|i| bytes[i * step]).collect();
    hex::encode(sampled)
}

/// Only the first comma-bearing ticket is considered; if it is malformed the
/// sentinel applies even when a later ticket would slice.
fn ticket_fragment(params: &[CallArgument]) -> Option<String> {
    params
        .iter()
        .filter_map(|param| match param {
            CallArgument::Ticket(header) => Some(header.value()),
            CallArgument::Mapping(map) => match map.get(TICKET_KEY) {
                Some(CallArgument::Text(ticket)) => Some(ticket.as_str()),
                _ => None,
            },
            _ => None,
        })
        .find(|ticket| ticket.contains(','))
        .and_then(slice_ticket)
}

/// Field 0 of a comma separated ticket plus the last five characters of
/// field 5. `None` when the ticket has fewer than six fields.
pub fn slice_ticket(ticket: &str) -> Option<String> {
    let mut fields = ticket.split(',');
    let session = fields.next()?;
    let marker = fields.nth(4)?;
    let tail_start = marker
        .char_indices()
        .rev()
        .nth(TICKET_TAIL_CHARS - 1)
        .map_or(0, |(i, _)| i);
    Some(format!("{}{}", session, &marker[tail_start..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TicketHeader;

    fn serialize(params: &[CallArgument]) -> String {
        let mut traversal = Traversal::default();
        for param in params {
            traversal.visit(param);
        }
        traversal.out
    }

    #[test]
    fn empty_call_uses_salt_and_sentinel() {
        assert_eq!(
            checksum(&[], &ChecksumPreset::default()),
            "3c9fe399cd60c503f271c0bd8e9956b9bef82e07"
        );
    }

    #[test]
    fn login_style_arguments() {
        let params = vec![
            CallArgument::from("user"),
            CallArgument::from("pass"),
            CallArgument::Sequence(vec![]),
            CallArgument::Null,
            CallArgument::Null,
            CallArgument::from("MSP1-Standalone:XXXXXX"),
        ];
        assert_eq!(serialize(&params), "userpassMSP1-Standalone:XXXXXX");
        assert_eq!(
            checksum(&params, &ChecksumPreset::default()),
            "7721097fc3faca84d34700a9cf4c7b49a300f527"
        );
    }

    #[test]
    fn ticket_header_call() {
        // ticket + md5("1") + hex("1")
        let header = TicketHeader::new(
            "A,123,B,C,D,EFGHIJc4ca4238a0b923820dcc509a6f75849b31".to_string(),
            1,
        );
        let params = vec![
            CallArgument::Ticket(header),
            CallArgument::from("gift"),
            CallArgument::from(123i64),
        ];
        assert_eq!(serialize(&params), "gift123");
        assert_eq!(
            checksum(&params, &ChecksumPreset::default()),
            "29c23f894a24bf871030ff2b49960ea3b033803f"
        );
    }

    #[test]
    fn ticket_slicing() {
        assert_eq!(slice_ticket("A,123,B,C,D,EFGHIJ").as_deref(), Some("AFGHIJ"));
        assert_eq!(slice_ticket("A,1,B,C,D,XY,Z").as_deref(), Some("AXY"));
        assert_eq!(slice_ticket("A,1,B,C,D"), None);
        assert_eq!(slice_ticket("no-commas"), None);

        let params = vec![CallArgument::mapping([("Ticket", "A,123,B,C,D,EFGHIJ")])];
        assert_eq!(
            checksum(&params, &ChecksumPreset::default()),
            "e0f64518f54c6e10b4cbeb30bb4488e61e3cb031"
        );
    }

    #[test]
    fn malformed_ticket_falls_back_to_sentinel() {
        let preset = ChecksumPreset::default();
        let short = vec![CallArgument::Ticket(TicketHeader::new("A,1,B".to_string(), 1))];
        assert_eq!(checksum(&short, &preset), checksum(&[], &preset));
    }

    #[test]
    fn first_comma_bearing_ticket_decides() {
        let preset = ChecksumPreset::default();
        let valid = CallArgument::mapping([("Ticket", "A,123,B,C,D,EFGHIJ")]);

        // a short ticket first wins over a well-formed one after it
        let params = vec![
            CallArgument::Ticket(TicketHeader::new("A,1,B".to_string(), 1)),
            valid.clone(),
        ];
        assert_eq!(checksum(&params, &preset), checksum(&[], &preset));

        // comma-free tickets are passed over
        let params = vec![CallArgument::mapping([("Ticket", "nocommas")]), valid.clone()];
        assert_eq!(checksum(&params, &preset), checksum(&[valid], &preset));
    }

    #[test]
    fn only_top_level_tickets_count() {
        let preset = ChecksumPreset::default();
        let nested = vec![CallArgument::Sequence(vec![CallArgument::Ticket(TicketHeader::new(
            "A,123,B,C,D,EFGHIJ".to_string(),
            1,
        ))])];
        assert_eq!(checksum(&nested, &preset), checksum(&[], &preset));
    }

    #[test]
    fn leaves_render_canonically() {
        let params = vec![
            CallArgument::Bool(true),
            CallArgument::Bool(false),
            CallArgument::Integer(-42),
            CallArgument::Double(1.5),
            CallArgument::Double(3.0),
            CallArgument::Double(f64::NEG_INFINITY),
        ];
        assert_eq!(serialize(&params), "TrueFalse-42");
    }

    #[test]
    fn doubles_contribute_nothing() {
        let preset = ChecksumPreset::default();
        let with_double = vec![CallArgument::from("a"), CallArgument::Double(1.5)];
        assert_eq!(checksum(&with_double, &preset), checksum(&[CallArgument::from("a")], &preset));
        assert_ne!(
            checksum(&with_double, &preset),
            checksum(&[CallArgument::from("a"), CallArgument::from("1.5")], &preset)
        );
        let in_mapping = CallArgument::mapping([("score", CallArgument::Double(2.25))]);
        assert_eq!(serialize(&[in_mapping]), "");
    }

    #[test]
    fn date_encoding_uses_zero_based_month() {
        let date = CallArgument::date(2024, 3, 15).unwrap();
        assert_eq!(serialize(&[date]), "2024215");
        let january = CallArgument::date(2023, 1, 5).unwrap();
        assert_eq!(serialize(&[january]), "202305");
    }

    #[test]
    fn short_byte_buffers_hash_raw() {
        let data: Vec<u8> = (0u8..20).collect();
        assert_eq!(fingerprint_bytes(&data), hex::encode(&data));
        assert_eq!(fingerprint_bytes(&[]), "");
    }

    #[test]
    fn long_byte_buffers_are_sampled() {
        let data: Vec<u8> = (0u8..40).collect();
        let evens: Vec<u8> = data.iter().step_by(2).copied().collect();
        assert_eq!(fingerprint_bytes(&data), hex::encode(&evens));

        let preset = ChecksumPreset::default();
        assert_eq!(
            checksum(&[CallArgument::bytes(data.clone())], &preset),
            checksum(&[CallArgument::Text(hex::encode(&evens))], &preset)
        );

        // odd offsets never reach the fingerprint
        let mut tweaked = data.clone();
        tweaked[1] ^= 0xff;
        assert_eq!(fingerprint_bytes(&tweaked), fingerprint_bytes(&data));

        // 41 bytes still step by 2 and never read past the end
        let data: Vec<u8> = (0u8..41).collect();
        assert_eq!(fingerprint_bytes(&data).len(), BYTE_SAMPLE_LEN * 2);
    }

    #[test]
    fn mapping_keys_visit_in_sorted_order() {
        let map = CallArgument::mapping([("b", "2"), ("a", "1"), ("c", "3")]);
        assert_eq!(serialize(&[map]), "123");
    }

    #[test]
    fn repeated_keys_only_hash_once() {
        let preset = ChecksumPreset::default();
        let tree = |first: &str, second: &str| {
            vec![
                CallArgument::mapping([("foo", first), ("bar", "x")]),
                CallArgument::Sequence(vec![CallArgument::mapping([("foo", second)])]),
            ]
        };
        assert_eq!(serialize(&tree("one", "two")), "xone");
        // second occurrence is invisible
        assert_eq!(checksum(&tree("one", "two"), &preset), checksum(&tree("one", ""), &preset));
        // first occurrence is not
        assert_ne!(checksum(&tree("one", "two"), &preset), checksum(&tree("uno", "two"), &preset));
    }

    #[test]
    fn nested_repeat_inside_first_occurrence_still_hashes() {
        let inner = CallArgument::mapping([("foo", "in")]);
        let outer = CallArgument::mapping([("foo", inner)]);
        assert_eq!(serialize(&[outer]), "in");
        let outer = CallArgument::mapping([("foo", CallArgument::mapping([("foo", "a"), ("zed", "b")]))]);
        assert_eq!(serialize(&[outer]), "ab");
    }

    #[test]
    fn dedup_does_not_leak_between_calls() {
        let preset = ChecksumPreset::default();
        let params = vec![CallArgument::mapping([("foo", "v")])];
        let first = checksum(&params, &preset);
        assert_eq!(checksum(&params, &preset), first);
        assert_eq!(serialize(&params), "v");
    }

    #[test]
    fn ticket_carrying_mapping_renders_empty() {
        let map = CallArgument::mapping([("Ticket", "t"), ("other", "x")]);
        assert_eq!(serialize(&[map.clone()]), "");
        assert_eq!(serialize(&[CallArgument::Sequence(vec![map])]), "");
    }

    #[test]
    fn single_leaf_changes_alter_digest() {
        let preset = ChecksumPreset::default();
        let base = vec![
            CallArgument::from("alpha"),
            CallArgument::from(7i64),
            CallArgument::mapping([("k", CallArgument::from(true))]),
            CallArgument::bytes(vec![1u8, 2, 3]),
        ];
        let reference = checksum(&base, &preset);
        let mutations = vec![
            (0, CallArgument::from("alphb")),
            (1, CallArgument::from(8i64)),
            (2, CallArgument::mapping([("k", CallArgument::from(false))])),
            (3, CallArgument::bytes(vec![1u8, 2, 4])),
        ];
        for (index, replacement) in mutations {
            let mut mutated = base.clone();
            mutated[index] = replacement;
            assert_ne!(checksum(&mutated, &preset), reference, "mutation at {}", index);
        }
    }

    #[test]
    fn digest_is_lowercase_sha1_hex() {
        let digest = checksum(&[CallArgument::from("x")], &ChecksumPreset::default());
        assert_eq!(digest.len(), 40);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn preset_changes_digest() {
        let params = vec![CallArgument::from("x")];
        assert_ne!(
            checksum(&params, &ChecksumPreset::default()),
            checksum(&params, &ChecksumPreset::new("other", "sentinel"))
        );
    }

    #[test]
    fn tree_root_variants() {
        let preset = ChecksumPreset::default();
        let params = vec![CallArgument::from("a"), CallArgument::from(1i64)];
        assert_eq!(
            checksum_tree(&CallArgument::Sequence(params.clone()), &preset),
            checksum(&params, &preset)
        );
        assert_eq!(
            checksum_tree(&CallArgument::from("a1"), &preset),
            checksum(&[CallArgument::from("a1")], &preset)
        );
    }
}
