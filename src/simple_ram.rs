//! Flat memory: one contiguous vector, resized on write.
//! Cheaper than `SparseMemory` for programs that stay close to their initial length.
//! Addresses at or past `FLAT_MEMORY_LIMIT` are rejected on write.

use num::Zero;
use serde::{Deserialize, Serialize};

use crate::config::FLAT_MEMORY_LIMIT;
use crate::error::Fault;
use crate::types::{Memory, Value};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatMemory {
    memory: Vec<Value>,
}

impl FlatMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_program(program: &[Value]) -> Self {
        Self {
            memory: program.to_vec(),
        }
    }

    fn ensure_memory_size(&mut self, required_size: usize) {
        if self.memory.len() < required_size {
            self.memory.resize(required_size, Value::zero());
        }
    }
}

impl Memory for FlatMemory {
    fn read(&self, address: u64) -> Value {
        usize::try_from(address)
            .ok()
            .and_then(|index| self.memory.get(index))
            .cloned()
            .unwrap_or_else(Value::zero)
    }

    /// Grows the vector up to `address`, which must be below `FLAT_MEMORY_LIMIT`.
    fn write(&mut self, address: u64, value: Value) -> Result<(), Fault> {
        let out_of_range = || Fault::InvalidAddress {
            address: Value::from(address),
        };
        if address >= FLAT_MEMORY_LIMIT {
            return Err(out_of_range());
        }
        let index = usize::try_from(address).map_err(|_| out_of_range())?;
        self.ensure_memory_size(index + 1);
        self.memory[index] = value;
        Ok(())
    }

    fn extent(&self) -> u64 {
        self.memory.len() as u64
    }

    fn to_vec(&self) -> Vec<Value> {
        self.memory.clone()
    }

    fn nonzero_cells(&self) -> Vec<(u64, Value)> {
        self.memory
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_zero())
            .map(|(index, value)| (index as u64, value.clone()))
            .collect()
    }
}

impl FromIterator<Value> for FlatMemory {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            memory: iter.into_iter().collect(),
        }
    }
}
