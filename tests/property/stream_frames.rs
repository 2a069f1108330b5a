//! Framing laws: a receiver that retains the last full term per stream
//! reconstructs every emitted term exactly.

use std::io::Read;
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;

use proptest::prelude::*;

use ftgs_rs::stream::{TAG_INT_DELTA, TAG_INT_FULL, TAG_STR_DELTA, TAG_STR_FULL};
use ftgs_rs::{OutputStream, Term};

fn term_strategy() -> impl Strategy<Value = Term> {
    prop_oneof![
        any::<i64>().prop_map(Term::Int),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Term::Str),
    ]
}

fn read_varint(bytes: &[u8]) -> (u64, &[u8]) {
    let mut value = 0u64;
    let mut shift = 0;
    for (idx, &byte) in bytes.iter().enumerate() {
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return (value, &bytes[idx + 1..]);
        }
        shift += 7;
    }
    panic!("truncated varint");
}

fn unzigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Reference receiver: retains the last full term to resolve delta frames.
fn decode(mut bytes: &[u8]) -> Vec<Term> {
    let mut out = Vec::new();
    let mut prev: Option<Term> = None;
    while !bytes.is_empty() {
        let tag = bytes[0];
        bytes = &bytes[1..];
        let term = match tag {
            TAG_INT_FULL => {
                let (raw, rest) = read_varint(bytes);
                bytes = rest;
                Term::Int(unzigzag(raw))
            }
            TAG_INT_DELTA => {
                let (raw, rest) = read_varint(bytes);
                bytes = rest;
                let base = match &prev {
                    Some(Term::Int(value)) => *value,
                    other => panic!("int delta without int predecessor: {other:?}"),
                };
                Term::Int(base.wrapping_add(unzigzag(raw)))
            }
            TAG_STR_FULL => {
                let (len, rest) = read_varint(bytes);
                let len = len as usize;
                let term = Term::Str(rest[..len].to_vec());
                bytes = &rest[len..];
                term
            }
            TAG_STR_DELTA => {
                let (prefix, rest) = read_varint(bytes);
                let (suffix_len, rest) = read_varint(rest);
                let suffix_len = suffix_len as usize;
                let mut contents = match &prev {
                    Some(Term::Str(prev_bytes)) => prev_bytes[..prefix as usize].to_vec(),
                    other => panic!("str delta without str predecessor: {other:?}"),
                };
                contents.extend_from_slice(&rest[..suffix_len]);
                bytes = &rest[suffix_len..];
                Term::Str(contents)
            }
            other => panic!("unknown frame tag {other:#04x}"),
        };
        prev = Some(term.clone());
        out.push(term);
    }
    out
}

proptest! {
    #[test]
    fn frames_reconstruct_exactly(terms in prop::collection::vec(term_strategy(), 1..40)) {
        let (writer, mut reader) = UnixStream::pair().unwrap();
        let mut stream = OutputStream::open(writer.as_raw_fd());
        for term in &terms {
            stream.write_term(term.as_term_ref());
        }
        stream.flush();
        prop_assert!(stream.last_error().is_none());
        drop(stream);
        drop(writer);

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).unwrap();
        prop_assert_eq!(decode(&bytes), terms);
    }
}
