//! Data structures for card catalogs.
//!
//! Pure data types deserialized from RON documents. Validation into
//! [`CardTemplate`](crate::cards::CardTemplate) happens in
//! [`Catalog`](crate::catalog::Catalog).
//!
//! **Note:** This module contains no IO - it only defines data types.
//! Callers read the document and hand over the text.

mod card_data;

pub use card_data::{CardData, DEFAULT_BUILDING_WORKERS};
