//! A concrete opaque-fallback codec for `graphser`, built on `serde` +
//! `bincode`.
//!
//! Any type that implements
//! [`serde::Serialize`]/[`serde::de::DeserializeOwned`] can be bound to a
//! [`graphser::Registry`] through [`BincodeCodec`] and will then round-trip
//! through [`graphser::Value::Opaque`] like any other built-in value.
mod codec;
mod de;
mod ser;

pub use self::codec::{register, BincodeCodec};
