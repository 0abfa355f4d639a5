//! Progress reporting port
//!
//! Observers only see the fold; they can never change its outcome.

/// Snapshot of a running consumption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub messages_received: u64,
    /// Human readable summary, e.g. `Collecting 1,204 records`
    pub description: String,
}

pub trait ProgressObserver {
    /// Called after every folded `message` event
    fn on_message(&mut self, progress: &Progress);

    /// Called once when the stream reaches a terminal state
    fn on_complete(&mut self, _progress: &Progress, _success: bool) {}
}

/// Observer that reports nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_message(&mut self, _progress: &Progress) {}
}

/// `1234567` -> `1,234,567`
pub fn with_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_thousands() {
        assert_eq!(with_thousands(0), "0");
        assert_eq!(with_thousands(999), "999");
        assert_eq!(with_thousands(1000), "1,000");
        assert_eq!(with_thousands(1234567), "1,234,567");
    }
}
