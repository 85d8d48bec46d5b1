//! Aggregated outcome of a case's checks.

/// Checks run for one case and the ones that failed
#[derive(Debug, Clone, Default)]
pub struct VerificationResult {
    checks: usize,
    failures: Vec<String>,
}

impl VerificationResult {
    /// Nothing checked yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every check passed
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of checks run
    pub fn checks(&self) -> usize {
        self.checks
    }

    /// Failure messages in the order they were found
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Record one check; `describe` only runs when it failed
    pub fn check(&mut self, ok: bool, describe: impl FnOnce() -> String) {
        self.checks += 1;
        if !ok {
            self.failures.push(describe());
        }
    }

    /// Record a failure that is not tied to a comparison
    pub fn fail(&mut self, message: String) {
        self.checks += 1;
        self.failures.push(message);
    }

    /// Merge another result
    pub fn merge(&mut self, other: Self) {
        self.checks += other.checks;
        self.failures.extend(other.failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_and_merge() {
        let mut first = VerificationResult::new();
        first.check(true, || "unused".to_owned());
        assert!(first.passed());

        let mut second = VerificationResult::new();
        second.check(false, || "status 500".to_owned());
        second.fail("step 2: boom".to_owned());

        first.merge(second);
        assert!(!first.passed());
        assert_eq!(first.checks(), 3);
        assert_eq!(first.failures(), ["status 500", "step 2: boom"]);
    }
}
