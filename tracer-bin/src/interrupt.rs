use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Installs the Ctrl+C handler. The first press asks the transfer to stop so
/// the partial trace can still be reported; the second exits immediately.
pub fn register() -> Result<Interrupted, ctrlc::Error> {
    let interrupted = Interrupted::default();
    let flag = interrupted.flag.clone();
    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            eprintln!("User requested abort (Ctrl+C twice)");
            std::process::exit(1);
        }
        eprintln!("Stopping transfer, reporting what was received (Ctrl+C again to abort)...");
    })?;
    Ok(interrupted)
}

#[derive(Clone, Default)]
pub struct Interrupted {
    flag: Arc<AtomicBool>,
}

impl Interrupted {
    pub fn interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}
