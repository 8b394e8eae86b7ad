//! `spendlens-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod date;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;

pub use entity::{index_by_id, Entity};
pub use error::{DomainError, DomainResult};
pub use id::{InvoiceId, LineItemId, VendorId};
pub use money::Money;
