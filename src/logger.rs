// Receives the warnings a run produces before skipping or failing.
pub trait Logger {
    fn warning(&self, message: &str);
}

impl<T: Logger + ?Sized> Logger for &T {
    fn warning(&self, message: &str) {
        (**self).warning(message)
    }
}

// Forwards to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLogger;

impl Logger for LogLogger {
    fn warning(&self, message: &str) {
        log::warn!("{}", message);
    }
}
