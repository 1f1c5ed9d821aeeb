use std::{
    sync::Arc,
    thread::JoinHandle,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

use crate::{builder::BuildError, reporter::SematextReporter};

#[derive(Default)]
struct Shutdown {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl Shutdown {
    fn signal(&self) {
        *self.stopped.lock() = true;
        self.condvar.notify_all();
    }

    /// Waits until `deadline`, or until shutdown is signalled.
    ///
    /// Without a deadline, waits for shutdown alone. Returns `true` if shutdown was signalled.
    fn wait_until(&self, deadline: Option<Instant>) -> bool {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            match deadline {
                Some(deadline) => {
                    if self.condvar.wait_until(&mut stopped, deadline).timed_out() {
                        break;
                    }
                }
                None => self.condvar.wait(&mut stopped),
            }
        }
        *stopped
    }
}

/// Handle to a reporter running on a background thread.
///
/// Dropping the handle stops the reporter, the same as calling [`stop`][Self::stop].
pub struct ReporterHandle {
    shutdown: Arc<Shutdown>,
    thread: Option<JoinHandle<()>>,
}

impl ReporterHandle {
    /// Stops the reporter.
    ///
    /// Blocks until the final report has been sent and the background thread has exited.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        self.shutdown.signal();
        if thread.join().is_err() {
            error!("Reporter thread panicked.");
        }
    }
}

impl Drop for ReporterHandle {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

pub(crate) fn spawn(reporter: SematextReporter, interval: Duration) -> Result<ReporterHandle, BuildError> {
    if interval.is_zero() {
        return Err(BuildError::InvalidInterval);
    }

    let shutdown = Arc::new(Shutdown::default());
    let thread_shutdown = Arc::clone(&shutdown);

    let thread = std::thread::Builder::new()
        .name("metrics-exporter-sematext-reporter".to_string())
        .spawn(move || run(&reporter, interval, &thread_shutdown))
        .map_err(|_| BuildError::Backend)?;

    Ok(ReporterHandle { shutdown, thread: Some(thread) })
}

fn run(reporter: &SematextReporter, interval: Duration, shutdown: &Shutdown) {
    // An interval too large to represent as a deadline never elapses.
    let mut next_report = Instant::now().checked_add(interval);
    loop {
        let stopped = shutdown.wait_until(next_report);

        // If the previous report took longer than the interval, the next one starts right away.
        next_report = Instant::now().checked_add(interval);
        reporter.report();

        if stopped {
            debug!("Reporter stopped after final report.");
            return;
        }
    }
}
