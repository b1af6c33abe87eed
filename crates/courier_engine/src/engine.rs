use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use courier_logging::{courier_error, courier_info, courier_warn};

use crate::profile::SurfaceProfile;
use crate::report::ReportWriter;
use crate::runner::{run_dispatch, ChannelEventSink, DispatchPlan, EventSink};
use crate::settings::PacingSettings;
use crate::signal::{wait_until, RunSignal, Waited};
use crate::surface::{locate_now, Surface, SurfaceError};
use crate::types::{EngineEvent, RunSummary};

/// Control-plane handle for one dispatch run.
///
/// A single background worker owns the automation session and executes every
/// surface call sequentially; the handle communicates with it only through
/// the shared [`RunSignal`] and the one-way event channel.
pub struct DispatchHandle {
    signal: Arc<RunSignal>,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl DispatchHandle {
    /// Start a run. `open_session` is called on the worker thread; a failure
    /// to open (or later to close) the session is fatal to the run and is
    /// surfaced through a `Log` followed by `Finished`.
    pub fn start<F>(
        open_session: F,
        plan: DispatchPlan,
        pacing: PacingSettings,
        profile: SurfaceProfile,
        report_dir: PathBuf,
    ) -> Self
    where
        F: FnOnce() -> Result<Box<dyn Surface>, SurfaceError> + Send + 'static,
    {
        let signal = Arc::new(RunSignal::new());
        let (event_tx, event_rx) = mpsc::channel();
        let worker_signal = signal.clone();

        let worker = thread::spawn(move || {
            let sink = ChannelEventSink::new(event_tx);
            run_worker(
                open_session,
                plan,
                pacing,
                profile,
                report_dir,
                &worker_signal,
                &sink,
            );
        });

        Self {
            signal,
            event_rx,
            worker: Some(worker),
        }
    }

    pub fn pause(&self) {
        self.signal.pause();
    }

    pub fn resume(&self) {
        self.signal.resume();
    }

    pub fn stop(&self) {
        self.signal.request_stop();
    }

    /// Non-blocking event drain.
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocking drain with a bound, for control loops that also watch other
    /// inputs. `None` on timeout or when the worker is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Wait for the worker to finish. Events still queued remain readable.
    pub fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for DispatchHandle {
    fn drop(&mut self) {
        // Dropping the handle abandons the run; tell the worker to wind down.
        self.signal.request_stop();
    }
}

/// Owns the session for the run and releases it on every exit route,
/// including unwinding.
struct SessionGuard {
    surface: Box<dyn Surface>,
}

impl SessionGuard {
    fn new(surface: Box<dyn Surface>) -> Self {
        Self { surface }
    }

    fn surface(&mut self) -> &mut dyn Surface {
        self.surface.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Err(err) = self.surface.close() {
            courier_warn!("failed to release the automation session: {err}");
        }
    }
}

fn run_worker<F>(
    open_session: F,
    plan: DispatchPlan,
    pacing: PacingSettings,
    profile: SurfaceProfile,
    report_dir: PathBuf,
    signal: &RunSignal,
    sink: &dyn EventSink,
) where
    F: FnOnce() -> Result<Box<dyn Surface>, SurfaceError>,
{
    let total = plan.contacts.len();
    let abort = |sink: &dyn EventSink, message: String| {
        courier_error!("{message}");
        sink.emit(EngineEvent::Log(message));
        sink.emit(EngineEvent::Finished {
            summary: RunSummary {
                total,
                ..RunSummary::default()
            },
        });
    };

    courier_info!("opening automation session");
    let mut session = match open_session() {
        Ok(surface) => SessionGuard::new(surface),
        Err(err) => {
            abort(sink, format!("failed to open the automation session: {err}"));
            return;
        }
    };

    if let Err(err) = prepare_surface(session.surface(), &profile, &pacing, signal, sink) {
        abort(sink, format!("messaging surface never became ready: {err}"));
        return;
    }

    let mut report = match ReportWriter::create(&report_dir) {
        Ok(report) => report,
        Err(err) => {
            abort(sink, format!("could not create the report file: {err}"));
            return;
        }
    };
    sink.emit(EngineEvent::Log(format!(
        "writing report to {}",
        report.path().display()
    )));

    let summary = run_dispatch(
        session.surface(),
        &plan,
        &pacing,
        &profile,
        signal,
        sink,
        &mut report,
    );

    // Release the session before announcing the end so `Finished` really
    // means the surface is free again.
    drop(session);
    courier_info!(
        "run finished: {} sent, {} failed of {}",
        summary.sent,
        summary.failed,
        summary.total
    );
    sink.emit(EngineEvent::Finished { summary });
}

/// Navigate to the surface and wait for its main UI. The session must be
/// authenticated already; this only waits for rendering.
fn prepare_surface(
    surface: &mut dyn Surface,
    profile: &SurfaceProfile,
    pacing: &PacingSettings,
    signal: &RunSignal,
    sink: &dyn EventSink,
) -> Result<(), SurfaceError> {
    surface.navigate(&profile.base_url)?;
    sink.emit(EngineEvent::Log(
        "waiting for the messaging surface to load".to_string(),
    ));
    let waited = wait_until(signal, pacing.main_ready_timeout, pacing.poll_tick, || {
        locate_now(surface, &profile.main_ready)
    })?;
    match waited {
        Waited::Ready(_) => {
            sink.emit(EngineEvent::Log("surface ready, session active".to_string()));
            Ok(())
        }
        Waited::TimedOut => Err(SurfaceError::Fault(
            "main surface did not render in time".to_string(),
        )),
        // Stop already requested; let the loop exit cleanly on its first check.
        Waited::Interrupted => Ok(()),
    }
}
