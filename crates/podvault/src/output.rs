//! Terminal output utilities

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use podvault_core::Progress;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-")
}

/// Create a spinner
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Render engine progress until the channel closes.
///
/// Events with a total drive a bar; the rest update a spinner line. With
/// `quiet` the events are drained without drawing anything.
pub fn render_progress(mut rx: mpsc::Receiver<Progress>, quiet: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        if quiet {
            while rx.recv().await.is_some() {}
            return;
        }

        let pb = spinner("Starting...");
        let mut bar = false;

        while let Some(event) = rx.recv().await {
            if event.has_total() {
                if !bar {
                    pb.set_style(bar_style());
                    bar = true;
                }
                pb.set_length(event.total as u64);
                pb.set_position(event.current.max(0) as u64);
            }
            pb.set_message(event.message);
        }

        pb.finish_and_clear();
    })
}
