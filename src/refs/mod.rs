//! # Reference Resolver
//!
//! Resolution of reference leaves against an [`ObjectRepository`](crate::repository::ObjectRepository).
//!
//! - `resolve`: expand/collapse of one reference field
//! - `naming`: deterministic dependent names
//! - `codec`: storage encoding of referenced values (Secret base64)

mod codec;
mod naming;
mod resolve;

pub use codec::{CodecError, ValueCodec};
pub use naming::dependent_name;
pub use resolve::Reference;
