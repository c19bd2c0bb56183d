//! Kafka wire protocol: fixed-width primitives, per-API codecs, and the
//! `ApiKey`/`ApiVersion` tags that select between them.

pub mod api_key;
pub mod api_version;
pub mod error_code;
pub mod messages;
pub mod primitives;
pub mod traits;
