//! Reference tables and the decode budget shared by the AMF0 and AMF3 readers.

use super::{AmfError, AmfValue, MAX_DECODED_BYTES};

/// Flat cost charged for every decoded value and table entry.
pub(crate) const NODE_COST: usize = 32;

/// Running estimate of the bytes a decode has materialised.
#[derive(Debug, Default)]
pub(crate) struct DecodeBudget {
    used: usize,
}

impl DecodeBudget {
    pub(crate) fn charge(&mut self, n: usize) -> Result<(), AmfError> {
        self.used = self.used.saturating_add(n);
        if self.used > MAX_DECODED_BYTES {
            return Err(AmfError::TooLarge(MAX_DECODED_BYTES));
        }
        Ok(())
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }
}

/// A reserved table entry whose container is still being read.
pub(crate) struct Slot {
    index: usize,
    start: usize,
}

/// Object reference table. Each entry remembers the expanded size of its
/// value so a back-reference costs as much as decoding it inline would.
#[derive(Debug, Default)]
pub(crate) struct RefTable {
    entries: Vec<(AmfValue, usize)>,
}

impl RefTable {
    /// Registers a placeholder that reads back as `Null` until settled.
    pub(crate) fn reserve(&mut self, budget: &DecodeBudget) -> Slot {
        self.entries.push((AmfValue::Null, NODE_COST));
        Slot { index: self.entries.len() - 1, start: budget.used() }
    }

    pub(crate) fn settle(&mut self, slot: Slot, value: AmfValue, budget: &DecodeBudget) -> AmfValue {
        let size = budget.used().saturating_sub(slot.start).saturating_add(NODE_COST);
        self.entries[slot.index] = (value.clone(), size);
        value
    }

    /// Records a value decoded without members; `size` is its payload cost.
    pub(crate) fn push(&mut self, value: AmfValue, size: usize) -> AmfValue {
        self.entries.push((value.clone(), size.saturating_add(NODE_COST)));
        value
    }

    pub(crate) fn resolve(
        &self,
        index: usize,
        kind: &'static str,
        budget: &mut DecodeBudget,
    ) -> Result<AmfValue, AmfError> {
        let (value, size) = self
            .entries
            .get(index)
            .ok_or(AmfError::BadReference { kind, index })?;
        budget.charge(*size)?;
        Ok(value.clone())
    }
}
