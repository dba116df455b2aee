//! Instruction registry: opcode → handler.

use crate::config::OPCODE_DIVISOR;
use crate::instructions::base::InstructionHandler;

/// Handlers indexed directly by opcode. Decoded opcodes are always below `OPCODE_DIVISOR`,
/// so the table is dense and lookups never hash.
pub struct InstructionRegistry {
    handlers: Vec<Option<Box<dyn InstructionHandler>>>,
}

impl InstructionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: (0..OPCODE_DIVISOR).map(|_| None).collect(),
        }
    }

    /// Install `handler` under its opcode, replacing any previous handler.
    pub fn register(&mut self, handler: Box<dyn InstructionHandler>) {
        let slot = usize::from(handler.opcode());
        if let Some(entry) = self.handlers.get_mut(slot) {
            *entry = Some(handler);
        }
    }

    #[must_use]
    pub fn get_handler(&self, opcode: u8) -> Option<&dyn InstructionHandler> {
        self.handlers
            .get(usize::from(opcode))
            .and_then(|entry| entry.as_deref())
    }

    #[must_use]
    pub fn has_handler(&self, opcode: u8) -> bool {
        self.get_handler(opcode).is_some()
    }

    /// Registered opcodes in ascending order.
    #[must_use]
    pub fn registered_opcodes(&self) -> Vec<u8> {
        self.handlers
            .iter()
            .filter_map(|entry| entry.as_ref().map(|handler| handler.opcode()))
            .collect()
    }
}

impl Default for InstructionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
