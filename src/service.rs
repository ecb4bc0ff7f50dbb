use std::io;
use std::process::Command;
use tracing::debug;

/// Start/stop signaling for the downstream consumer service. The controller
/// only signals; it never supervises the consumer's lifecycle beyond that.
pub trait ServiceControl {
    /// Returns whether the service manager reported success. "Already
    /// stopped" is a success at this level.
    fn stop(&self, unit: &str) -> io::Result<bool>;
    fn start(&self, unit: &str) -> io::Result<bool>;
}

pub struct Systemctl;

impl ServiceControl for Systemctl {
    fn stop(&self, unit: &str) -> io::Result<bool> {
        run("stop", unit)
    }

    fn start(&self, unit: &str) -> io::Result<bool> {
        run("start", unit)
    }
}

fn run(verb: &str, unit: &str) -> io::Result<bool> {
    let status = Command::new("systemctl").arg(verb).arg(unit).status()?;
    debug!(verb, unit, code = status.code(), "systemctl finished");
    Ok(status.success())
}
