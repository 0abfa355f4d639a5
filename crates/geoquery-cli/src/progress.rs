use geoquery_stream::{Progress, ProgressObserver};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.blue} {msg} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✗ {}", message));
}

/// Spinner fed by the result stream consumer
pub struct SpinnerObserver {
    spinner: ProgressBar,
}

impl SpinnerObserver {
    pub fn new(message: &str) -> Self {
        Self {
            spinner: create_spinner(message),
        }
    }
}

impl ProgressObserver for SpinnerObserver {
    fn on_message(&mut self, progress: &Progress) {
        self.spinner.set_message(progress.description.clone());
    }

    fn on_complete(&mut self, progress: &Progress, success: bool) {
        if success {
            finish_success(&self.spinner, &progress.description);
        } else {
            finish_error(&self.spinner, &progress.description);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_observer_finishes() {
        let mut observer = SpinnerObserver::new("Waiting for results");
        let progress = Progress {
            messages_received: 2,
            description: "Collecting 12 records".to_string(),
        };

        observer.on_message(&progress);
        assert_eq!(observer.spinner.message(), "Collecting 12 records");

        observer.on_complete(&progress, true);
        assert!(observer.spinner.is_finished());
        assert_eq!(observer.spinner.message(), "✓ Collecting 12 records");
    }
}
