//! Where index stacks come from.
//!
//! The engine never reads files itself; a [`StackSource`] hands it an
//! [`ArrayStack`] for an index and time window.

use std::collections::HashMap;

use drip_common::{DripError, DripResult, TimeRange};

use crate::types::ArrayStack;

/// Provider of drought index stacks.
pub trait StackSource: Send + Sync {
    /// Load the stack for `index`, restricted to `window`.
    fn load(&self, index: &str, window: &TimeRange) -> DripResult<ArrayStack>;

    /// Identifiers this source can load.
    fn indices(&self) -> Vec<String>;
}

/// Stacks held in memory, keyed by lowercase index identifier.
#[derive(Debug, Default, Clone)]
pub struct MemoryStackSource {
    stacks: HashMap<String, ArrayStack>,
}

impl MemoryStackSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the stack for `index`.
    pub fn insert(&mut self, index: impl AsRef<str>, stack: ArrayStack) {
        self.stacks.insert(index.as_ref().to_lowercase(), stack);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_stack(mut self, index: impl AsRef<str>, stack: ArrayStack) -> Self {
        self.insert(index, stack);
        self
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}

impl StackSource for MemoryStackSource {
    fn load(&self, index: &str, window: &TimeRange) -> DripResult<ArrayStack> {
        let stack = self
            .stacks
            .get(&index.to_lowercase())
            .ok_or_else(|| DripError::no_data(format!("index '{}'", index)))?;
        Ok(stack.slice_time(window))
    }

    fn indices(&self) -> Vec<String> {
        let mut indices: Vec<String> = self.stacks.keys().cloned().collect();
        indices.sort();
        indices
    }
}
