//! Keyed dictionary used to index suffix rules.
//!
//! ## Example
//!
//! ```
//! use psl_engine_r::dict::DictStore;
//!
//! let mut store = DictStore::with_seed(7).unwrap();
//! store.set("co.uk", 2usize).unwrap();
//!
//! assert_eq!(*store.get_nocase("CO.UK").unwrap(), 2);
//! assert!(!store.has_key("uk"));
//! ```

pub mod hasher;
mod store;

pub use hasher::{SlotPermutation, TABLE_SIZE};
pub use store::{DictStore, Iter};
