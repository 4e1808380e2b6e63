//! Consensus-rules serialization.
//!
//! The Dash P2P wire format: little-endian integers, compact-size prefixed
//! collections, fixed-width bitsets. Decoding untrusted bytes must never
//! panic or over-allocate.

pub mod encode;

pub use encode::{
    deserialize, read_compact_size, read_fixed_bitset, serialize, write_compact_size,
    write_fixed_bitset, Decodable, Encodable, VarInt,
};
