//! Call-scoped slot carrying a failure category from the verifier to the
//! bearer middleware.
//!
//! The middleware creates one channel per authentication attempt and lends
//! it to the verifier, so concurrent requests never share a slot.

use super::category::FailureCategory;

#[derive(Debug, Default)]
pub struct FailureChannel {
    slot: Option<FailureCategory>,
}

impl FailureChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, category: FailureCategory) {
        self.slot = Some(category);
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Read the category and leave the slot empty.
    pub fn take(&mut self) -> Option<FailureCategory> {
        self.slot.take()
    }

    pub fn peek(&self) -> Option<FailureCategory> {
        self.slot
    }
}
