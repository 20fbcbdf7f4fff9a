use std::fmt;

/// Final accounting for a run.
///
/// Once [`ProcessEvent::Complete`](super::ProcessEvent::Complete) has been
/// emitted, `eligible == batch_renamed + retry_renamed + failed` holds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    /// Files discovered by the scan.
    pub eligible: u64,
    /// Files renamed by the batch tier.
    pub batch_renamed: u64,
    /// Files renamed by single-file recovery.
    pub retry_renamed: u64,
    /// Files that kept their original name (or were stranded).
    pub failed: u64,
    /// The subset of `failed` left under a temporary name.
    pub stranded: u64,
}

impl Tally {
    pub fn new(eligible: u64) -> Self {
        Self { eligible, ..Self::default() }
    }

    pub fn renamed(&self) -> u64 {
        self.batch_renamed + self.retry_renamed
    }

    pub fn is_balanced(&self) -> bool {
        self.eligible == self.renamed() + self.failed && self.stranded <= self.failed
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} eligible, {} renamed ({} batch, {} retry), {} untouched",
            self.eligible,
            self.renamed(),
            self.batch_renamed,
            self.retry_renamed,
            self.failed,
        )?;
        if self.stranded > 0 {
            write!(f, ", {} stranded under a temporary name", self.stranded)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced() {
        let tally = Tally { eligible: 12, batch_renamed: 10, retry_renamed: 1, failed: 1, stranded: 0 };
        assert!(tally.is_balanced());
        assert_eq!(tally.renamed(), 11);
        assert!(!Tally { failed: 0, ..tally }.is_balanced());
        assert!(Tally::new(0).is_balanced());
    }

    #[test]
    fn test_display() {
        let tally = Tally { eligible: 3, batch_renamed: 1, retry_renamed: 1, failed: 1, stranded: 1 };
        assert_eq!(
            tally.to_string(),
            "3 eligible, 2 renamed (1 batch, 1 retry), 1 untouched, 1 stranded under a temporary name"
        );
    }
}
