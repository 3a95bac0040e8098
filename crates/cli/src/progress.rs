//! Progress reporting and summaries for the CLI

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over the files being checked
pub struct ProgressReporter {
    bar: ProgressBar,
    start_time: Instant,
}

impl ProgressReporter {
    /// Create a reporter for `total_files` files; hidden when `quiet`
    pub fn new(total_files: u64, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total_files)
        };
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {human_pos}/{human_len} files {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░-");
        bar.set_style(style);

        Self {
            bar,
            start_time: Instant::now(),
        }
    }

    /// Record one finished file and the running violation count
    pub fn file_done(&self, violations: usize) {
        self.bar.inc(1);
        if violations > 0 {
            self.bar
                .set_message(format!("| {} violations", Self::format_number(violations)));
        }
    }

    /// Finish progress reporting
    pub fn finish(&self) -> Duration {
        self.bar.finish_and_clear();
        self.start_time.elapsed()
    }

    /// Format large numbers with a K/M suffix
    fn format_number(n: usize) -> String {
        if n >= 1_000_000 {
            format!("{:.1}M", n as f64 / 1_000_000.0)
        } else if n >= 1_000 {
            format!("{:.1}K", n as f64 / 1_000.0)
        } else {
            n.to_string()
        }
    }
}

/// Totals for one `check` run
#[derive(Debug, Clone, Default)]
pub struct CheckSummary {
    pub files_checked: usize,
    pub files_with_violations: usize,
    pub duplicated_keys: usize,
    pub unreadable_files: usize,
    pub elapsed: Duration,
}

impl CheckSummary {
    pub fn total_violations(&self) -> usize {
        self.duplicated_keys + self.unreadable_files
    }
}

/// Print a formatted summary report
pub fn print_summary_report(summary: &CheckSummary) {
    println!("\n{}", "═".repeat(60));
    println!("Duplicate Key Check Complete");
    println!("{}", "═".repeat(60));
    println!("Files checked:      {}", format_with_commas(summary.files_checked));

    if summary.files_with_violations > 0 {
        println!(
            "Files with issues:  {} ({:.1}%)",
            format_with_commas(summary.files_with_violations),
            (summary.files_with_violations as f64 / summary.files_checked as f64) * 100.0
        );
    }

    println!("Duplicated keys:    {}", format_with_commas(summary.duplicated_keys));

    if summary.unreadable_files > 0 {
        println!("Unreadable files:   {}", format_with_commas(summary.unreadable_files));
    }

    println!("Elapsed:            {:.2?}", summary.elapsed);
    println!("{}", "═".repeat(60));
}

/// Format number with thousand separators
fn format_with_commas(n: usize) -> String {
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
