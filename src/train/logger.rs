/// Sink for the progress and failure messages emitted by `Model::fit`.
pub trait TrainingLogger {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards training messages to the `log` facade under the `nnml::train`
/// target. The binary installs `env_logger`; library users pick their own
/// backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TrainingLogger for LogSink {
    fn info(&self, message: &str) {
        log::info!(target: "nnml::train", "{message}");
    }

    fn warning(&self, message: &str) {
        log::warn!(target: "nnml::train", "{message}");
    }

    fn error(&self, message: &str) {
        log::error!(target: "nnml::train", "{message}");
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentLogger;

impl TrainingLogger for SilentLogger {
    fn info(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}
