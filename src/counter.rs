use crate::error::{Error, Result};

/// Number of replies the caller is still owed.
///
/// An array header of N elements counts as one owed reply until it is read,
/// then as N: the header completes one reply and adds N nested ones, each of
/// which completes as it is decoded. A fully decoded top-level reply therefore
/// always nets exactly one decrement.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PendingReplies(usize);

impl PendingReplies {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn get(&self) -> usize {
        self.0
    }

    /// Record `n` commands written to the transport.
    pub fn add(&mut self, n: usize) {
        self.0 += n;
    }

    /// One reply, top-level or nested, has been read. Never drops below zero.
    pub fn complete(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }

    /// An array header announced `n` nested replies. The total may not
    /// exceed `i64::MAX`, the largest count RESP can express.
    pub fn expand(&mut self, n: usize) -> Result<()> {
        self.0 = self
            .0
            .checked_add(n)
            .filter(|&total| total <= i64::MAX as usize)
            .ok_or_else(|| {
                Error::Protocol("array length overflows pending count".to_string())
            })?;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}
