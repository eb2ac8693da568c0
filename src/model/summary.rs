use serde::Serialize;

/// Result of evaluating one archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Already in the seen-set; the archive was not opened
    AlreadySeen,
    /// Archive already carries a descriptor entry
    AlreadyTagged,
    /// Descriptor entry was written
    Tagged,
}

impl Outcome {
    pub fn mutated(self) -> bool {
        matches!(self, Outcome::Tagged)
    }
}

/// Counters for one scan pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Archives found under the root
    pub candidates: u64,
    /// Archives skipped because the seen-set already had them
    pub skipped: u64,
    /// Archives checked without error (tagged or already tagged)
    pub processed: u64,
    /// Archives that gained a descriptor
    pub mutated: u64,
    /// Archives or directory entries that could not be read
    pub errors: u64,
}

impl ScanSummary {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::AlreadySeen => self.skipped += 1,
            Outcome::AlreadyTagged => self.processed += 1,
            Outcome::Tagged => {
                self.processed += 1;
                self.mutated += 1;
            }
        }
    }
}
