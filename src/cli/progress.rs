use std::time::Instant;

pub struct ProgressIndicator {
    total: usize,
    completed: usize,
    failed: usize,
    start_time: Instant,
}

impl ProgressIndicator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            failed: 0,
            start_time: Instant::now(),
        }
    }

    pub fn start_item(&self, name: &str) {
        println!(
            "Splitting: {} ({}/{})",
            name,
            self.completed + self.failed + 1,
            self.total
        );
    }

    pub fn complete_item(&mut self, name: &str, success: bool) {
        if success {
            self.completed += 1;
        } else {
            self.failed += 1;
            tracing::debug!(response = %name, "response could not be split");
        }
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn finish(&self) {
        let elapsed = self.start_time.elapsed();
        println!("\n{}", "=".repeat(60));
        println!("Summary:");
        println!("  Total:     {}", self.total);
        println!("  Succeeded: {}", self.completed);
        println!("  Failed:    {}", self.failed);
        println!("  Duration:  {:.2}s", elapsed.as_secs_f64());
        println!("{}", "=".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_outcomes() {
        let mut progress = ProgressIndicator::new(3);
        progress.complete_item("a", true);
        progress.complete_item("b", false);
        progress.complete_item("c", true);
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.failed(), 1);
    }
}
