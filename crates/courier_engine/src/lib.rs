//! Courier engine: drives the bulk-dispatch workflow against an automation
//! surface through the [`Surface`] capability interface.
mod engine;
mod profile;
mod report;
mod runner;
mod sender;
mod settings;
mod signal;
mod sim;
mod surface;
mod types;

pub use engine::DispatchHandle;
pub use profile::{labels, SelectorSet, SurfaceProfile};
pub use report::{ReportError, ReportWriter, REPORT_HEADER};
pub use runner::{run_dispatch, run_dispatch_with_rng, ChannelEventSink, DispatchPlan, EventSink};
pub use sender::{Delivery, DeliveryError, MessageSender, TriggerMethod};
pub use settings::PacingSettings;
pub use signal::{interruptible_sleep, wait_until, RunSignal, Waited};
pub use sim::{ContactScript, SimAction, SimulatedSurface};
pub use surface::{locate_now, ControlKey, ElementHandle, KeyInput, Surface, SurfaceError};
pub use types::{
    EngineEvent, MessageJob, Outcome, OutcomeRecord, ProgressUpdate, RunSummary,
};
