//! Content fingerprints
//!
//! A fingerprint is a digest over a canonical byte encoding of a [`Value`],
//! so equal content always yields the same hex string, across runs and
//! across distinct-but-equal instances.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use xxhash_rust::xxh3::xxh3_64;

use crate::core::value::Value;

/// Hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// 40 hex characters
    #[default]
    Sha1,
    /// 16 hex characters; shorter filenames, weaker collision resistance
    Xxh3,
}

impl std::str::FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "xxh3" => Ok(HashAlgorithm::Xxh3),
            _ => Err(format!("Unknown hash algorithm: {}", s)),
        }
    }
}

/// Compute hash of bytes
pub fn hash_bytes(data: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Xxh3 => format!("{:016x}", xxh3_64(data)),
        HashAlgorithm::Sha1 => {
            let mut hasher = Sha1::new();
            hasher.update(data);
            format!("{:x}", hasher.finalize())
        }
    }
}

/// Fingerprint of a value's content
pub fn fingerprint(value: &Value, algorithm: HashAlgorithm) -> String {
    let mut buf = Vec::new();
    encode_canonical(value, &mut buf);
    hash_bytes(&buf, algorithm)
}

// Type tags; lists and tuples are distinct.
const TAG_NONE: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_STR: u8 = 4;
const TAG_LIST: u8 = 5;
const TAG_TUPLE: u8 = 6;
const TAG_DICT: u8 = 7;
const TAG_ARRAY: u8 = 8;

fn push_len(out: &mut Vec<u8>, len: usize) {
    out.extend((len as u64).to_le_bytes());
}

fn push_str(out: &mut Vec<u8>, s: &str) {
    push_len(out, s.len());
    out.extend_from_slice(s.as_bytes());
}

/// Append the canonical encoding of `value` to `out`
pub fn encode_canonical(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::None => out.push(TAG_NONE),
        Value::Bool(b) => {
            out.push(TAG_BOOL);
            out.push(*b as u8);
        }
        Value::Int(i) => {
            out.push(TAG_INT);
            out.extend(i.to_le_bytes());
        }
        Value::Float(f) => {
            out.push(TAG_FLOAT);
            // One bit pattern for every NaN
            let bits = if f.is_nan() { f64::NAN.to_bits() } else { f.to_bits() };
            out.extend(bits.to_le_bytes());
        }
        Value::Str(s) => {
            out.push(TAG_STR);
            push_str(out, s);
        }
        Value::List(items) | Value::Tuple(items) => {
            out.push(if matches!(value, Value::List(_)) {
                TAG_LIST
            } else {
                TAG_TUPLE
            });
            push_len(out, items.len());
            for item in items {
                encode_canonical(item, out);
            }
        }
        Value::Dict(map) => {
            out.push(TAG_DICT);
            push_len(out, map.len());
            // BTreeMap iterates in key order
            for (key, item) in map {
                push_str(out, key);
                encode_canonical(item, out);
            }
        }
        Value::Array(array) => {
            out.push(TAG_ARRAY);
            push_str(out, array.dtype().descr());
            push_len(out, array.ndim());
            for dim in array.shape() {
                push_len(out, *dim);
            }
            out.extend(array.data().to_le_bytes());
        }
    }
}
