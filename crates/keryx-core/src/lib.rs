//! # Keryx Core
//!
//! Core types for the Keryx microservice toolkit.
//!
//! This crate provides the foundational types used throughout Keryx:
//!
//! - [`CallContext`] - Per-call context carrying method, deadline, trace id, and attributes
//! - [`MetaMap`] - Case-insensitive metadata carrier mirroring transport headers
//! - [`KeryxError`] - Standard error taxonomy with stable machine-readable kinds
//! - [`Validator`] - Structural request validation primitives

#![doc(html_root_url = "https://docs.rs/keryx-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod meta;
mod validate;

pub use context::{AttrValue, CallContext};
pub use error::{ErrorKind, FieldErrors, KeryxError, KeryxResult};
pub use meta::{keys, MetaMap};
pub use validate::{AcceptAll, FieldLookup, RequiredFields, Validator};
