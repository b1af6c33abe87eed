use std::fmt;
use std::time::Duration;

use courier_core::{CanonicalAddress, RegionDefaults};
use courier_logging::{courier_debug, courier_warn};
use rand::RngCore;
use thiserror::Error;

use crate::profile::SurfaceProfile;
use crate::settings::{sample_range, PacingSettings};
use crate::signal::{interruptible_sleep, wait_until, RunSignal, Waited};
use crate::surface::{locate_now, ControlKey, ElementHandle, KeyInput, Surface, SurfaceError};
use crate::types::MessageJob;

/// Delivery trigger methods, in fixed priority order. Exactly one successful
/// trigger fires per pass; stacking methods would double-submit the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMethod {
    SendButton,
    Enter,
    ConfirmChord,
}

impl fmt::Display for TriggerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerMethod::SendButton => write!(f, "send button"),
            TriggerMethod::Enter => write!(f, "enter"),
            TriggerMethod::ConfirmChord => write!(f, "confirm chord"),
        }
    }
}

/// How a confirmed delivery went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub trigger: TriggerMethod,
    pub attempts: u32,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("surface reported the address as invalid")]
    InvalidAddress,
    #[error("could not resolve a conversation: {0}")]
    ConversationUnreachable(String),
    #[error("composer did not become ready in time")]
    ComposerNotFound,
    #[error("delivery not confirmed after {attempts} attempts")]
    SendNotConfirmed { attempts: u32 },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Pre-send view of the conversation's outbound side, used by the hybrid
/// confirmation check.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OutboundSnapshot {
    count: usize,
    last_signature: Option<String>,
}

enum LinkProbe {
    Invalid,
    Conversation,
}

/// Per-contact send/verify workflow: resolve conversation, ready the
/// composer, inject content, trigger, confirm, retry.
pub struct MessageSender<'a> {
    surface: &'a mut dyn Surface,
    profile: &'a SurfaceProfile,
    pacing: &'a PacingSettings,
    region: &'a RegionDefaults,
    signal: &'a RunSignal,
    rng: &'a mut dyn RngCore,
}

impl<'a> MessageSender<'a> {
    pub fn new(
        surface: &'a mut dyn Surface,
        profile: &'a SurfaceProfile,
        pacing: &'a PacingSettings,
        region: &'a RegionDefaults,
        signal: &'a RunSignal,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self {
            surface,
            profile,
            pacing,
            region,
            signal,
            rng,
        }
    }

    /// Run one job to completion. `cold_session` widens the composer wait on
    /// the first surface interaction of a run; a slow first render is not a
    /// retryable failure.
    pub fn deliver(
        &mut self,
        job: &MessageJob,
        cold_session: bool,
    ) -> Result<Delivery, DeliveryError> {
        self.resolve_conversation(&job.address)?;
        let composer = self.await_composer(cold_session)?;
        self.pause_for(self.pacing.chat_settle);

        let before = self.snapshot_outbound()?;
        let max_attempts = self.pacing.retries + 1;
        let mut attempts = 0;
        while attempts < max_attempts {
            attempts += 1;
            self.inject_content(composer, &job.resolved_text)?;
            let trigger = match self.trigger_send(composer)? {
                Some(trigger) => trigger,
                None => {
                    courier_warn!(
                        "no delivery trigger accepted for {} (attempt {attempts})",
                        job.address
                    );
                    continue;
                }
            };
            courier_debug!("triggered send for {} via {trigger}", job.address);
            if self.verify_delivery(composer, &before)? {
                return Ok(Delivery { trigger, attempts });
            }
            // An empty composer without a confirmation usually means the send
            // slipped through undetected; one extra check before retrying
            // avoids pasting the same message twice.
            if self.surface.text(composer)?.trim().is_empty()
                && self.check_delivered(composer, &before)?
            {
                return Ok(Delivery { trigger, attempts });
            }
        }
        Err(DeliveryError::SendNotConfirmed {
            attempts: max_attempts,
        })
    }

    fn resolve_conversation(&mut self, address: &CanonicalAddress) -> Result<(), DeliveryError> {
        match self.open_via_search(address) {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(err) => {
                // Search problems are recoverable; the link fallback still runs.
                courier_debug!("search lookup failed for {address}: {err}");
            }
        }
        self.open_via_link(address)
    }

    /// In-app search lookup, tried first to avoid a full page reload. People
    /// save numbers with and without the country prefix, so each form is
    /// queried in turn.
    fn open_via_search(&mut self, address: &CanonicalAddress) -> Result<bool, SurfaceError> {
        let search = match locate_now(self.surface, &self.profile.search_input)? {
            Some(handle) => handle,
            None => return Ok(false),
        };

        let mut variants = vec![address.as_str().to_string(), format!("+{address}")];
        if let Some(local) = address.without_country_code(self.region) {
            variants.push(local.to_string());
        }

        for query in &variants {
            self.clear_input(search)?;
            self.surface.click(search)?;
            self.surface.clipboard_paste(search, query)?;

            let signal = self.signal;
            let waited = wait_until(
                signal,
                self.pacing.search_timeout,
                self.pacing.probe_interval,
                || self.probe_search_results(),
            )?;
            let result = match waited {
                Waited::Ready(handle) => handle,
                Waited::TimedOut => continue,
                Waited::Interrupted => break,
            };
            if self.surface.click(result).is_err() {
                continue;
            }
            if self.composer_present_within(self.pacing.search_timeout)? {
                return Ok(true);
            }
        }

        // Leave the search bar clean for the next contact.
        let _ = self.clear_input(search);
        Ok(false)
    }

    /// Direct-navigation fallback. The invalid-address notice is cheaper to
    /// detect than waiting out the timeout, so every tick checks it before
    /// probing for the composer.
    fn open_via_link(&mut self, address: &CanonicalAddress) -> Result<(), DeliveryError> {
        let url = self.profile.send_url(address.as_str());
        self.surface.navigate(&url)?;

        let signal = self.signal;
        let waited = wait_until(
            signal,
            self.pacing.link_timeout,
            self.pacing.probe_interval,
            || self.probe_link_outcome(),
        )?;
        match waited {
            Waited::Ready(LinkProbe::Invalid) => Err(DeliveryError::InvalidAddress),
            Waited::Ready(LinkProbe::Conversation) => Ok(()),
            Waited::TimedOut => Err(DeliveryError::ConversationUnreachable(
                "no conversation within the navigation timeout".to_string(),
            )),
            Waited::Interrupted => Err(DeliveryError::ConversationUnreachable(
                "stop requested while opening the conversation".to_string(),
            )),
        }
    }

    fn await_composer(&mut self, cold_session: bool) -> Result<ElementHandle, DeliveryError> {
        let timeout = if cold_session {
            self.pacing.composer_timeout_first
        } else {
            self.pacing.composer_timeout
        };
        let signal = self.signal;
        let waited = wait_until(signal, timeout, self.pacing.probe_interval, || {
            self.probe_ready_composer()
        })?;
        match waited {
            Waited::Ready(handle) => Ok(handle),
            Waited::TimedOut | Waited::Interrupted => Err(DeliveryError::ComposerNotFound),
        }
    }

    fn inject_content(&mut self, composer: ElementHandle, text: &str) -> Result<(), SurfaceError> {
        // Leftover text from a failed attempt would corrupt the paste.
        if !self.surface.text(composer)?.trim().is_empty() {
            self.clear_input(composer)?;
        }
        self.surface.click(composer)?;
        self.surface.clipboard_paste(composer, text)?;
        self.pause_for(self.pacing.paste_settle);
        Ok(())
    }

    fn trigger_send(
        &mut self,
        composer: ElementHandle,
    ) -> Result<Option<TriggerMethod>, SurfaceError> {
        if let Some(button) = locate_now(self.surface, &self.profile.send_button)? {
            if self.surface.click(button).is_ok() {
                return Ok(Some(TriggerMethod::SendButton));
            }
        }
        if self
            .surface
            .send_keys(composer, KeyInput::Control(ControlKey::Enter))
            .is_ok()
        {
            return Ok(Some(TriggerMethod::Enter));
        }
        if self
            .surface
            .send_keys(composer, KeyInput::Control(ControlKey::ConfirmChord))
            .is_ok()
        {
            return Ok(Some(TriggerMethod::ConfirmChord));
        }
        Ok(None)
    }

    fn verify_delivery(
        &mut self,
        composer: ElementHandle,
        before: &OutboundSnapshot,
    ) -> Result<bool, SurfaceError> {
        let signal = self.signal;
        let waited = wait_until(
            signal,
            self.pacing.verify_timeout,
            self.pacing.verify_interval,
            || {
                Ok(self
                    .check_delivered(composer, before)?
                    .then_some(()))
            },
        )?;
        Ok(matches!(waited, Waited::Ready(())))
    }

    /// Hybrid confirmation. Count-increase catches appending surfaces; the
    /// signature path catches surfaces that replace the last bubble instead.
    fn check_delivered(
        &mut self,
        composer: ElementHandle,
        before: &OutboundSnapshot,
    ) -> Result<bool, SurfaceError> {
        let now = self.snapshot_outbound()?;
        if now.count > before.count {
            return Ok(true);
        }
        if now.last_signature == before.last_signature {
            return Ok(false);
        }
        Ok(self.surface.text(composer)?.trim().is_empty())
    }

    fn snapshot_outbound(&mut self) -> Result<OutboundSnapshot, SurfaceError> {
        let bubbles = self.surface.locate_all(&self.profile.outbound_messages)?;
        let last_signature = match bubbles.last() {
            Some(&bubble) => Some(signature(&self.surface.text(bubble)?)),
            None => None,
        };
        Ok(OutboundSnapshot {
            count: bubbles.len(),
            last_signature,
        })
    }

    fn probe_search_results(&mut self) -> Result<Option<ElementHandle>, SurfaceError> {
        locate_now(self.surface, &self.profile.search_results)
    }

    fn probe_ready_composer(&mut self) -> Result<Option<ElementHandle>, SurfaceError> {
        let handle = match locate_now(self.surface, &self.profile.composer)? {
            Some(handle) => handle,
            None => return Ok(None),
        };
        Ok(self.surface.is_ready(handle)?.then_some(handle))
    }

    fn probe_link_outcome(&mut self) -> Result<Option<LinkProbe>, SurfaceError> {
        for snippet in &self.profile.invalid_address_snippets {
            if self.surface.page_contains(snippet)? {
                return Ok(Some(LinkProbe::Invalid));
            }
        }
        Ok(locate_now(self.surface, &self.profile.composer)?.map(|_| LinkProbe::Conversation))
    }

    fn composer_present_within(&mut self, timeout: Duration) -> Result<bool, SurfaceError> {
        let signal = self.signal;
        let waited = wait_until(signal, timeout, self.pacing.probe_interval, || {
            locate_now(self.surface, &self.profile.composer)
        })?;
        Ok(matches!(waited, Waited::Ready(_)))
    }

    fn clear_input(&mut self, element: ElementHandle) -> Result<(), SurfaceError> {
        self.surface
            .send_keys(element, KeyInput::Control(ControlKey::SelectAll))?;
        self.surface
            .send_keys(element, KeyInput::Control(ControlKey::Delete))
    }

    fn pause_for(&mut self, range: (Duration, Duration)) {
        let wait = sample_range(self.rng, range);
        if !wait.is_zero() {
            let _ = interruptible_sleep(self.signal, wait, self.pacing.poll_tick);
        }
    }
}

const SIGNATURE_LEN: usize = 24;

/// Whitespace-normalized, truncated text; enough to tell the last outbound
/// bubble changed without holding the full message.
fn signature(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(SIGNATURE_LEN)
        .collect()
}
