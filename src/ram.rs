//! Sparse paged memory. Pages are allocated on first write; unallocated pages read as zero.

use std::collections::HashMap;

use num::Zero;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::Fault;
use crate::types::{Memory, Value};

/// Sparse memory keyed by page index. Programs legitimately touch addresses far beyond
/// their initial length, so nothing is sized up front.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseMemory {
    pages: HashMap<u64, Vec<Value>>,
    extent: u64,
}

impl SparseMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `program` at addresses `0..program.len()`.
    #[must_use]
    pub fn from_program(program: &[Value]) -> Self {
        program.iter().cloned().collect()
    }

    /// Number of pages currently backed by storage.
    #[must_use]
    pub fn allocated_pages(&self) -> usize {
        self.pages.len()
    }

    fn get_page_index(&self, address: u64) -> u64 {
        address / config::PAGE_SIZE
    }

    fn get_page_offset(&self, address: u64) -> usize {
        (address % config::PAGE_SIZE) as usize
    }

    fn get_or_create_page(&mut self, page_index: u64) -> &mut Vec<Value> {
        self.pages
            .entry(page_index)
            .or_insert_with(|| vec![Value::zero(); config::PAGE_SIZE as usize])
    }

    /// Every `u64` address has a page, so storing never fails.
    fn store(&mut self, address: u64, value: Value) {
        let page_index = self.get_page_index(address);
        let offset = self.get_page_offset(address);
        self.get_or_create_page(page_index)[offset] = value;
        self.extent = self.extent.max(address.saturating_add(1));
    }
}

impl Memory for SparseMemory {
    fn read(&self, address: u64) -> Value {
        let page_index = self.get_page_index(address);
        let offset = self.get_page_offset(address);
        self.pages
            .get(&page_index)
            .map_or_else(Value::zero, |page| page[offset].clone())
    }

    fn write(&mut self, address: u64, value: Value) -> Result<(), Fault> {
        self.store(address, value);
        Ok(())
    }

    fn extent(&self) -> u64 {
        self.extent
    }

    fn nonzero_cells(&self) -> Vec<(u64, Value)> {
        let mut page_indices: Vec<u64> = self.pages.keys().copied().collect();
        page_indices.sort_unstable();
        let mut cells = Vec::new();
        for page_index in page_indices {
            let base = page_index * config::PAGE_SIZE;
            for (offset, value) in self.pages[&page_index].iter().enumerate() {
                if !value.is_zero() {
                    cells.push((base + offset as u64, value.clone()));
                }
            }
        }
        cells
    }
}

impl FromIterator<Value> for SparseMemory {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut memory = Self::new();
        for (address, value) in iter.into_iter().enumerate() {
            memory.store(address as u64, value);
        }
        memory
    }
}
