use std::sync::mpsc;

use chrono::Local;
use courier_core::{normalize, resolve_template_with, Contact, RegionDefaults};
use courier_logging::{courier_error, courier_info, courier_warn};
use rand::RngCore;

use crate::profile::SurfaceProfile;
use crate::report::ReportWriter;
use crate::sender::{Delivery, DeliveryError, MessageSender};
use crate::settings::{sample_range, PacingSettings};
use crate::signal::{interruptible_sleep, RunSignal};
use crate::surface::Surface;
use crate::types::{
    EngineEvent, MessageJob, Outcome, OutcomeRecord, ProgressUpdate, RunSummary,
};

/// One run's worth of input: who, what, and how to complete addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    pub contacts: Vec<Contact>,
    pub template: String,
    pub region: RegionDefaults,
}

/// One-way event stream from the worker to the control plane.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Drive every contact of the plan through the send/verify workflow, in
/// list order, honoring pause/stop and the pacing policy.
pub fn run_dispatch(
    surface: &mut dyn Surface,
    plan: &DispatchPlan,
    pacing: &PacingSettings,
    profile: &SurfaceProfile,
    signal: &RunSignal,
    sink: &dyn EventSink,
    report: &mut ReportWriter,
) -> RunSummary {
    run_dispatch_with_rng(
        surface,
        plan,
        pacing,
        profile,
        signal,
        sink,
        report,
        &mut rand::thread_rng(),
    )
}

/// [`run_dispatch`] with a caller-supplied RNG so tests can pin pacing draws
/// and template variants.
#[allow(clippy::too_many_arguments)]
pub fn run_dispatch_with_rng(
    surface: &mut dyn Surface,
    plan: &DispatchPlan,
    pacing: &PacingSettings,
    profile: &SurfaceProfile,
    signal: &RunSignal,
    sink: &dyn EventSink,
    report: &mut ReportWriter,
    rng: &mut dyn RngCore,
) -> RunSummary {
    let total = plan.contacts.len();
    let mut summary = RunSummary {
        total,
        ..RunSummary::default()
    };
    // The cold-session composer allowance applies to the first contact that
    // actually touches the surface, not blindly to index zero.
    let mut cold_session = true;

    for (index, contact) in plan.contacts.iter().enumerate() {
        if !gate_on_signals(signal, pacing, sink) {
            summary.stopped_early = true;
            break;
        }

        sink.emit(EngineEvent::Log(format!(
            "({}/{total}) dispatching to {}",
            index + 1,
            describe(contact)
        )));

        let record = match normalize(&contact.raw_address, &plan.region) {
            Err(err) => {
                courier_warn!("skipping {}: {err}", describe(contact));
                OutcomeRecord {
                    address: contact.raw_address.clone(),
                    name: contact.display_name.clone(),
                    outcome: Outcome::NormalizationFailed,
                    detail: err.to_string(),
                    timestamp: Local::now(),
                }
            }
            Ok(address) => {
                // Resolved once; retries reuse the exact same text.
                let resolved_text =
                    resolve_template_with(&plan.template, &contact.display_name, rng);
                let job = MessageJob {
                    contact: contact.clone(),
                    address,
                    resolved_text,
                };
                let mut sender =
                    MessageSender::new(surface, profile, pacing, &plan.region, signal, rng);
                let result = sender.deliver(&job, cold_session);
                cold_session = false;
                job_record(&job, result)
            }
        };

        if record.outcome.is_sent() {
            summary.sent += 1;
        } else {
            summary.failed += 1;
        }
        courier_info!(
            "{}: {} ({})",
            record.address,
            record.outcome,
            record.detail
        );

        // Row and progress both land before the next contact starts, so any
        // prefix of the run is a consistent report.
        if let Err(err) = report.append(&record) {
            courier_error!("report write failed: {err}");
            sink.emit(EngineEvent::Log(format!(
                "report write failed, halting run: {err}"
            )));
            summary.stopped_early = true;
            sink.emit(EngineEvent::ContactCompleted { index, record });
            break;
        }
        sink.emit(EngineEvent::ContactCompleted {
            index,
            record: record.clone(),
        });
        let processed = index + 1;
        sink.emit(EngineEvent::Progress(ProgressUpdate {
            processed,
            total,
            status: record.outcome.to_string(),
        }));

        if processed == total {
            break;
        }
        if !pace_between_contacts(processed, total, pacing, signal, sink, rng) {
            summary.stopped_early = true;
            break;
        }
    }

    summary
}

/// Stop/pause checkpoint before each job. Returns false when the run should
/// halt. While paused the worker blocks here, re-checking every poll tick.
fn gate_on_signals(signal: &RunSignal, pacing: &PacingSettings, sink: &dyn EventSink) -> bool {
    if signal.stop_requested() {
        sink.emit(EngineEvent::Log("stop requested; halting run".to_string()));
        return false;
    }
    let mut announced = false;
    while signal.is_paused() {
        if signal.stop_requested() {
            sink.emit(EngineEvent::Log("stop requested; halting run".to_string()));
            return false;
        }
        if !announced {
            sink.emit(EngineEvent::Log("paused".to_string()));
            announced = true;
        }
        std::thread::sleep(pacing.poll_tick);
    }
    if announced {
        sink.emit(EngineEvent::Log("resumed".to_string()));
    }
    true
}

/// Ordinary inter-contact delay, with an extended cooldown after every
/// `cooldown_every`th contact. Both waits re-check stop every tick; returns
/// false when stop cut the wait short.
fn pace_between_contacts(
    processed: usize,
    total: usize,
    pacing: &PacingSettings,
    signal: &RunSignal,
    sink: &dyn EventSink,
    rng: &mut dyn RngCore,
) -> bool {
    if pacing.cooldown_every > 0 && processed % pacing.cooldown_every == 0 {
        let cooldown = sample_range(rng, pacing.cooldown);
        sink.emit(EngineEvent::Log(format!(
            "safety cooldown for {}s",
            cooldown.as_secs()
        )));
        sink.emit(EngineEvent::Progress(ProgressUpdate {
            processed,
            total,
            status: format!("cooling down ({}s)", cooldown.as_secs()),
        }));
        // Polled once a second, never slept as one atomic block.
        return interruptible_sleep(signal, cooldown, std::time::Duration::from_secs(1));
    }

    let delay = sample_range(rng, pacing.contact_delay);
    if !delay.is_zero() {
        sink.emit(EngineEvent::Log(format!(
            "waiting {:.1}s before the next contact",
            delay.as_secs_f32()
        )));
    }
    interruptible_sleep(signal, delay, pacing.poll_tick)
}

fn job_record(job: &MessageJob, result: Result<Delivery, DeliveryError>) -> OutcomeRecord {
    let (outcome, detail) = match result {
        Ok(delivery) => (
            Outcome::Sent,
            format!(
                "delivered via {} on attempt {}",
                delivery.trigger, delivery.attempts
            ),
        ),
        Err(DeliveryError::InvalidAddress) => {
            (Outcome::InvalidAddress, DeliveryError::InvalidAddress.to_string())
        }
        Err(err @ DeliveryError::ConversationUnreachable(_)) => {
            (Outcome::ConversationUnreachable, err.to_string())
        }
        Err(err @ DeliveryError::ComposerNotFound) => (Outcome::ComposerNotFound, err.to_string()),
        Err(err @ DeliveryError::SendNotConfirmed { .. }) => {
            (Outcome::SendNotConfirmed, err.to_string())
        }
        // Unclassified fault: abort this contact only, never the run.
        Err(DeliveryError::Surface(err)) => (Outcome::SurfaceFault, err.to_string()),
    };
    OutcomeRecord {
        address: job.address.as_str().to_string(),
        name: job.contact.display_name.clone(),
        outcome,
        detail,
        timestamp: Local::now(),
    }
}

fn describe(contact: &Contact) -> String {
    if contact.display_name.is_empty() {
        contact.raw_address.clone()
    } else {
        format!("{} ({})", contact.raw_address, contact.display_name)
    }
}
