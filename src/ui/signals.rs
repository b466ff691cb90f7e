use crate::error::{NewsCrawlError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Ctrl+C state shared between the signal handler and the crawl loop.
///
/// The first interrupt only flips the flag; the crawl loop looks at it between
/// intervals. A second interrupt exits the process.
#[derive(Clone)]
pub struct GracefulShutdown {
    running: Arc<AtomicBool>,
    interrupted: Arc<AtomicBool>,
}

impl GracefulShutdown {
    pub fn new() -> Result<Self> {
        let shutdown = Self::new_for_test();

        let running = shutdown.running.clone();
        let interrupted = shutdown.interrupted.clone();

        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);

            if !interrupted.swap(true, Ordering::SeqCst) {
                eprintln!("\n🛑 Stopping after the current interval... (press Ctrl+C again to force exit)");
            } else {
                eprintln!("\n💀 Force stopping...");
                std::process::exit(130);
            }
        })
        .map_err(|e| NewsCrawlError::Config {
            message: format!("Failed to set signal handler: {}", e),
        })?;

        Ok(shutdown)
    }

    /// No signal handler is installed.
    pub fn new_for_test() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn check_shutdown(&self) -> Result<()> {
        if !self.is_running() {
            return Err(NewsCrawlError::Cancelled);
        }
        Ok(())
    }

    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
