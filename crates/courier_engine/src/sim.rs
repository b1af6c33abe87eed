use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::profile::{labels, SelectorSet, SurfaceProfile};
use crate::surface::{ControlKey, ElementHandle, KeyInput, Surface, SurfaceError};

/// Scripted behavior for one address. The default script is the happy path:
/// not in the saved-contact search, reachable through direct navigation,
/// every trigger lands and the bubble appears on the first check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactScript {
    /// Address turns up as a search result.
    pub in_search: bool,
    /// Direct navigation opens a conversation. When false and `invalid` is
    /// also false, navigation leads nowhere and the caller times out.
    pub link_reachable: bool,
    /// Direct navigation shows the invalid-address notice.
    pub invalid: bool,
    /// First N triggers are accepted but leave the composer untouched.
    pub swallow_triggers: u32,
    /// Triggers clear the composer without ever producing a bubble.
    pub drop_messages: bool,
    /// Bubble becomes visible on the Nth outbound listing after the trigger;
    /// 0 means immediately.
    pub confirm_after_checks: u32,
    /// New sends overwrite the last bubble instead of appending.
    pub replace_last_bubble: bool,
    pub send_button_missing: bool,
    /// The Enter key errors instead of sending.
    pub enter_rejected: bool,
    /// Composer is present but not interactable for the first N readiness
    /// checks, like a chat panel that is still rendering.
    pub composer_blocked_checks: u32,
    /// Leftover draft already sitting in the composer when the chat opens.
    pub preloaded_composer: Option<String>,
    /// Bubbles already in the conversation when it opens.
    pub existing_bubbles: Vec<String>,
}

impl Default for ContactScript {
    fn default() -> Self {
        Self {
            in_search: false,
            link_reachable: true,
            invalid: false,
            swallow_triggers: 0,
            drop_messages: false,
            confirm_after_checks: 0,
            replace_last_bubble: false,
            send_button_missing: false,
            enter_rejected: false,
            composer_blocked_checks: 0,
            preloaded_composer: None,
            existing_bubbles: Vec::new(),
        }
    }
}

/// Externally observable interactions, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimAction {
    Navigated(String),
    Clicked(String),
    Pasted { label: String, text: String },
    Keyed { label: String, key: ControlKey },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TargetKind {
    Panel(String),
    SearchResult(String),
    Bubble(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Session,
    Conversation(u64),
}

#[derive(Debug, Clone)]
struct Target {
    kind: TargetKind,
    scope: Scope,
}

struct Conversation {
    script: ContactScript,
    composer: String,
    bubbles: Vec<String>,
    /// Sent text waiting to become visible, with listings left until then.
    pending: Option<(String, u32)>,
    swallow_left: u32,
    blocked_checks_left: u32,
}

/// Deterministic in-memory rendition of the messaging surface, driven by
/// per-address [`ContactScript`]s. Backs the test suite and the rehearsal
/// mode, so a run can be exercised end to end without a browser.
pub struct SimulatedSurface {
    profile: SurfaceProfile,
    scripts: HashMap<String, ContactScript>,
    main_loaded: bool,
    banner: Option<String>,
    conversation: Option<Conversation>,
    conversation_gen: u64,
    search_text: String,
    armed_select: Option<u64>,
    next_handle: u64,
    targets: HashMap<u64, Target>,
    actions: Arc<Mutex<Vec<SimAction>>>,
    closed: Arc<AtomicBool>,
}

impl SimulatedSurface {
    pub fn new(profile: SurfaceProfile) -> Self {
        Self {
            profile,
            scripts: HashMap::new(),
            main_loaded: false,
            banner: None,
            conversation: None,
            conversation_gen: 0,
            search_text: String::new(),
            armed_select: None,
            next_handle: 0,
            targets: HashMap::new(),
            actions: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Script the behavior for one canonical address.
    pub fn script(&mut self, address: &str, script: ContactScript) {
        self.scripts.insert(address.to_string(), script);
    }

    /// Shared view of the interaction log; clones survive moving the surface
    /// into a worker.
    pub fn actions(&self) -> Arc<Mutex<Vec<SimAction>>> {
        Arc::clone(&self.actions)
    }

    /// Flips to true when the session is released.
    pub fn close_witness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    fn record(&self, action: SimAction) {
        if let Ok(mut log) = self.actions.lock() {
            log.push(action);
        }
    }

    fn script_for(&self, address: &str) -> ContactScript {
        self.scripts.get(address).cloned().unwrap_or_default()
    }

    fn open_conversation(&mut self, address: &str) {
        let script = self.script_for(address);
        self.conversation_gen += 1;
        self.conversation = Some(Conversation {
            composer: script.preloaded_composer.clone().unwrap_or_default(),
            bubbles: script.existing_bubbles.clone(),
            pending: None,
            swallow_left: script.swallow_triggers,
            blocked_checks_left: script.composer_blocked_checks,
            script,
        });
    }

    fn issue(&mut self, kind: TargetKind, scope: Scope) -> ElementHandle {
        self.next_handle += 1;
        self.targets.insert(self.next_handle, Target { kind, scope });
        ElementHandle(self.next_handle)
    }

    fn target(&self, element: ElementHandle) -> Result<Target, SurfaceError> {
        let target = self
            .targets
            .get(&element.0)
            .ok_or(SurfaceError::NotFound)?;
        let live = match target.scope {
            Scope::Session => self.main_loaded,
            Scope::Conversation(gen) => {
                self.conversation.is_some() && gen == self.conversation_gen
            }
        };
        if !live {
            return Err(SurfaceError::NotFound);
        }
        if let TargetKind::Bubble(index) = target.kind {
            let in_range = self
                .conversation
                .as_ref()
                .is_some_and(|conv| index < conv.bubbles.len());
            if !in_range {
                return Err(SurfaceError::NotFound);
            }
        }
        Ok(target.clone())
    }

    fn matching_search_address(&self) -> Option<String> {
        let digits: String = self
            .search_text
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if digits.is_empty() {
            return None;
        }
        self.scripts
            .iter()
            .find(|(address, script)| {
                script.in_search && (**address == digits || address.ends_with(&digits))
            })
            .map(|(address, _)| address.clone())
    }

    fn resolve(&mut self, label: &str) -> Option<ElementHandle> {
        match label {
            labels::MAIN_READY if self.main_loaded => {
                Some(self.issue(TargetKind::Panel(label.to_string()), Scope::Session))
            }
            labels::SEARCH_INPUT if self.main_loaded => {
                Some(self.issue(TargetKind::Panel(label.to_string()), Scope::Session))
            }
            labels::SEARCH_RESULTS => {
                let address = self.matching_search_address()?;
                Some(self.issue(TargetKind::SearchResult(address), Scope::Session))
            }
            labels::COMPOSER if self.conversation.is_some() => Some(self.issue(
                TargetKind::Panel(label.to_string()),
                Scope::Conversation(self.conversation_gen),
            )),
            labels::SEND_BUTTON => {
                let present = self
                    .conversation
                    .as_ref()
                    .is_some_and(|conv| !conv.script.send_button_missing);
                present.then(|| {
                    self.issue(
                        TargetKind::Panel(label.to_string()),
                        Scope::Conversation(self.conversation_gen),
                    )
                })
            }
            _ => None,
        }
    }

    fn fire_trigger(&mut self) -> Result<(), SurfaceError> {
        let conv = self.conversation.as_mut().ok_or(SurfaceError::NotFound)?;
        if conv.composer.trim().is_empty() {
            return Ok(());
        }
        if conv.swallow_left > 0 {
            conv.swallow_left -= 1;
            return Ok(());
        }
        let text = std::mem::take(&mut conv.composer);
        if conv.script.drop_messages {
            return Ok(());
        }
        if conv.script.confirm_after_checks == 0 {
            materialize(conv, text);
        } else {
            conv.pending = Some((text, conv.script.confirm_after_checks));
        }
        Ok(())
    }

    fn advance_pending(&mut self) {
        if let Some(conv) = self.conversation.as_mut() {
            if let Some((text, left)) = conv.pending.take() {
                if left <= 1 {
                    materialize(conv, text);
                } else {
                    conv.pending = Some((text, left - 1));
                }
            }
        }
    }

    fn address_in_url(url: &str) -> Option<String> {
        let start = url.find("phone=")? + "phone=".len();
        let digits: String = url[start..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        (!digits.is_empty()).then_some(digits)
    }

    fn label_of(kind: &TargetKind) -> String {
        match kind {
            TargetKind::Panel(label) => label.clone(),
            TargetKind::SearchResult(_) => "search-result".to_string(),
            TargetKind::Bubble(_) => labels::OUTBOUND_MESSAGES.to_string(),
        }
    }
}

fn materialize(conv: &mut Conversation, text: String) {
    if conv.script.replace_last_bubble {
        if let Some(last) = conv.bubbles.last_mut() {
            *last = text;
            return;
        }
    }
    conv.bubbles.push(text);
}

impl Surface for SimulatedSurface {
    fn navigate(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.record(SimAction::Navigated(url.to_string()));
        self.main_loaded = true;
        self.banner = None;
        self.conversation = None;
        if let Some(address) = Self::address_in_url(url) {
            let script = self.script_for(&address);
            if script.invalid {
                self.banner = self
                    .profile
                    .invalid_address_snippets
                    .first()
                    .cloned()
                    .or_else(|| Some("invalid phone".to_string()));
            } else if script.link_reachable {
                self.open_conversation(&address);
            }
        }
        Ok(())
    }

    fn locate(
        &mut self,
        selectors: &SelectorSet,
        _timeout: Duration,
    ) -> Result<ElementHandle, SurfaceError> {
        self.resolve(&selectors.label).ok_or(SurfaceError::NotFound)
    }

    fn locate_all(&mut self, selectors: &SelectorSet) -> Result<Vec<ElementHandle>, SurfaceError> {
        if selectors.label == labels::OUTBOUND_MESSAGES {
            self.advance_pending();
            let count = self
                .conversation
                .as_ref()
                .map_or(0, |conv| conv.bubbles.len());
            let gen = self.conversation_gen;
            return Ok((0..count)
                .map(|index| self.issue(TargetKind::Bubble(index), Scope::Conversation(gen)))
                .collect());
        }
        Ok(self.resolve(&selectors.label).into_iter().collect())
    }

    fn click(&mut self, element: ElementHandle) -> Result<(), SurfaceError> {
        let target = self.target(element)?;
        self.record(SimAction::Clicked(Self::label_of(&target.kind)));
        match target.kind {
            TargetKind::SearchResult(address) => {
                self.open_conversation(&address);
                Ok(())
            }
            TargetKind::Panel(label) if label == labels::SEND_BUTTON => self.fire_trigger(),
            _ => Ok(()),
        }
    }

    fn send_keys(
        &mut self,
        element: ElementHandle,
        input: KeyInput<'_>,
    ) -> Result<(), SurfaceError> {
        let target = self.target(element)?;
        let label = Self::label_of(&target.kind);
        let is_composer = label == labels::COMPOSER;
        let is_search = label == labels::SEARCH_INPUT;
        match input {
            KeyInput::Text(text) => {
                self.record(SimAction::Pasted {
                    label,
                    text: text.to_string(),
                });
                if is_composer {
                    if let Some(conv) = self.conversation.as_mut() {
                        conv.composer.push_str(text);
                    }
                } else if is_search {
                    self.search_text.push_str(text);
                }
                Ok(())
            }
            KeyInput::Control(key) => {
                self.record(SimAction::Keyed { label, key });
                match key {
                    ControlKey::SelectAll => {
                        self.armed_select = Some(element.0);
                        Ok(())
                    }
                    ControlKey::Delete => {
                        if self.armed_select.take() == Some(element.0) {
                            if is_composer {
                                if let Some(conv) = self.conversation.as_mut() {
                                    conv.composer.clear();
                                }
                            } else if is_search {
                                self.search_text.clear();
                            }
                        }
                        Ok(())
                    }
                    ControlKey::Enter if is_composer => {
                        let rejected = self
                            .conversation
                            .as_ref()
                            .is_some_and(|conv| conv.script.enter_rejected);
                        if rejected {
                            return Err(SurfaceError::Fault("enter not accepted".to_string()));
                        }
                        self.fire_trigger()
                    }
                    ControlKey::ConfirmChord if is_composer => self.fire_trigger(),
                    ControlKey::Enter | ControlKey::ConfirmChord => Ok(()),
                }
            }
        }
    }

    fn text(&mut self, element: ElementHandle) -> Result<String, SurfaceError> {
        let target = self.target(element)?;
        let text = match target.kind {
            TargetKind::Panel(label) if label == labels::COMPOSER => self
                .conversation
                .as_ref()
                .map_or_else(String::new, |conv| conv.composer.clone()),
            TargetKind::Panel(label) if label == labels::SEARCH_INPUT => self.search_text.clone(),
            TargetKind::Bubble(index) => self
                .conversation
                .as_ref()
                .and_then(|conv| conv.bubbles.get(index).cloned())
                .unwrap_or_default(),
            _ => String::new(),
        };
        Ok(text)
    }

    fn is_ready(&mut self, element: ElementHandle) -> Result<bool, SurfaceError> {
        let target = self.target(element)?;
        if let TargetKind::Panel(label) = &target.kind {
            if label == labels::COMPOSER {
                if let Some(conv) = self.conversation.as_mut() {
                    if conv.blocked_checks_left > 0 {
                        conv.blocked_checks_left -= 1;
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }

    fn clipboard_paste(
        &mut self,
        element: ElementHandle,
        text: &str,
    ) -> Result<(), SurfaceError> {
        let target = self.target(element)?;
        let label = Self::label_of(&target.kind);
        self.record(SimAction::Pasted {
            label: label.clone(),
            text: text.to_string(),
        });
        if label == labels::COMPOSER {
            if let Some(conv) = self.conversation.as_mut() {
                conv.composer.push_str(text);
            }
        } else if label == labels::SEARCH_INPUT {
            self.search_text.push_str(text);
        }
        Ok(())
    }

    fn page_contains(&mut self, snippet: &str) -> Result<bool, SurfaceError> {
        let needle = snippet.to_lowercase();
        Ok(self
            .banner
            .as_ref()
            .is_some_and(|banner| banner.to_lowercase().contains(&needle)))
    }

    fn close(&mut self) -> Result<(), SurfaceError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
