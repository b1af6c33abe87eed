use serde::{Deserialize, Serialize};

/// Stable labels for the selector sets the engine asks for. Adapters and the
/// simulated surface key their behavior off these, so selector candidates can
/// drift freely without touching engine logic.
pub mod labels {
    pub const MAIN_READY: &str = "main-ready";
    pub const SEARCH_INPUT: &str = "search-input";
    pub const SEARCH_RESULTS: &str = "search-results";
    pub const COMPOSER: &str = "composer";
    pub const SEND_BUTTON: &str = "send-button";
    pub const OUTBOUND_MESSAGES: &str = "outbound-messages";
}

/// Ordered list of matcher strategies, tried in sequence until one succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    pub label: String,
    pub candidates: Vec<String>,
}

impl SelectorSet {
    pub fn new(label: &str, candidates: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            candidates: candidates.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Everything deployment-specific about the rendered surface: where it lives,
/// how to find its elements, and how it words an invalid-address notice.
/// Serde-derived so surface-drift fixes ship as configuration, not code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceProfile {
    pub base_url: String,
    /// Direct-navigation conversation URL; `{address}` is replaced with the
    /// canonical address.
    pub send_url_template: String,
    pub main_ready: SelectorSet,
    pub search_input: SelectorSet,
    pub search_results: SelectorSet,
    pub composer: SelectorSet,
    pub send_button: SelectorSet,
    pub outbound_messages: SelectorSet,
    /// Lowercase snippets whose presence marks the address as invalid.
    pub invalid_address_snippets: Vec<String>,
}

impl SurfaceProfile {
    pub fn send_url(&self, address: &str) -> String {
        self.send_url_template.replace("{address}", address)
    }
}

impl Default for SurfaceProfile {
    /// The WhatsApp Web deployment this tool was built for. The DOM shifts
    /// between sessions; candidates are ordered newest first.
    fn default() -> Self {
        Self {
            base_url: "https://web.whatsapp.com".to_string(),
            send_url_template: "https://web.whatsapp.com/send?phone={address}&app_absent=0"
                .to_string(),
            main_ready: SelectorSet::new(
                labels::MAIN_READY,
                &["[data-testid='chat-list-search']", "div[role='grid']"],
            ),
            search_input: SelectorSet::new(
                labels::SEARCH_INPUT,
                &["[data-testid='chat-list-search']"],
            ),
            search_results: SelectorSet::new(
                labels::SEARCH_RESULTS,
                &[
                    "div[role='listitem']",
                    "[data-testid='cell-frame-container']",
                ],
            ),
            composer: SelectorSet::new(
                labels::COMPOSER,
                &[
                    "div[contenteditable='true'][data-tab='10']",
                    "div[contenteditable='true'][data-tab='6']",
                    "div[contenteditable='true']",
                ],
            ),
            send_button: SelectorSet::new(
                labels::SEND_BUTTON,
                &[
                    "[data-testid='compose-btn-send']",
                    "button[aria-label='Enviar']",
                    "span[data-icon='send']",
                ],
            ),
            outbound_messages: SelectorSet::new(
                labels::OUTBOUND_MESSAGES,
                &[
                    "div.message-out",
                    "div[data-testid='msg-balloon']",
                    "div[data-testid='msg-container']",
                ],
            ),
            invalid_address_snippets: vec![
                "número de telefone compartilhado via url é inválido".to_string(),
                "número de telefone compartilhado através de url é inválido".to_string(),
                "phone number shared via url is invalid".to_string(),
                "número de telefone não é válido".to_string(),
                "não está no whatsapp".to_string(),
                "invalid phone".to_string(),
            ],
        }
    }
}
