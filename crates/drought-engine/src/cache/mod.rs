//! Cache implementations for drought analysis.

mod result_cache;

pub use result_cache::{hash_key, ResultCache};
