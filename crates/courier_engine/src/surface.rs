use std::time::Duration;

use thiserror::Error;

use crate::profile::SelectorSet;

/// Opaque handle to a located element. Handles can go stale when the surface
/// re-renders; using a stale handle surfaces as [`SurfaceError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// Control chords the engine sends; the adapter maps them to the platform's
/// actual key sequences (e.g. Cmd vs Ctrl).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKey {
    Enter,
    /// Modifier + Enter, the secondary delivery trigger.
    ConfirmChord,
    SelectAll,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput<'a> {
    Text(&'a str),
    Control(ControlKey),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("element not found")]
    NotFound,
    #[error("automation session lost: {0}")]
    SessionLost(String),
    #[error("surface fault: {0}")]
    Fault(String),
}

/// Capability interface over the automation surface.
///
/// The engine consumes this interface and never talks to a browser directly;
/// a WebDriver-backed adapter implements it out of tree, the in-tree
/// [`crate::SimulatedSurface`] implements it for tests and rehearsals. All
/// calls run sequentially on the single worker thread; implementations do
/// not need interior synchronization.
pub trait Surface: Send {
    fn navigate(&mut self, url: &str) -> Result<(), SurfaceError>;

    /// Try each candidate selector in order; first match wins. `NotFound`
    /// when no candidate matched within `timeout`.
    fn locate(
        &mut self,
        selectors: &SelectorSet,
        timeout: Duration,
    ) -> Result<ElementHandle, SurfaceError>;

    /// All current matches for the set, in render order. An empty vec is not
    /// an error.
    fn locate_all(&mut self, selectors: &SelectorSet) -> Result<Vec<ElementHandle>, SurfaceError>;

    fn click(&mut self, element: ElementHandle) -> Result<(), SurfaceError>;

    fn send_keys(&mut self, element: ElementHandle, input: KeyInput<'_>)
        -> Result<(), SurfaceError>;

    fn text(&mut self, element: ElementHandle) -> Result<String, SurfaceError>;

    /// Visible and enabled, i.e. safe to interact with.
    fn is_ready(&mut self, element: ElementHandle) -> Result<bool, SurfaceError>;

    /// Inject `text` into `element` via the clipboard in one operation.
    fn clipboard_paste(&mut self, element: ElementHandle, text: &str)
        -> Result<(), SurfaceError>;

    /// Case-insensitive substring check against the rendered page.
    fn page_contains(&mut self, snippet: &str) -> Result<bool, SurfaceError>;

    /// Release the underlying session. Called exactly once at run end.
    fn close(&mut self) -> Result<(), SurfaceError>;
}

/// Single-shot locate: `Ok(None)` on a miss instead of an error, so polling
/// loops can keep probing.
pub fn locate_now(
    surface: &mut dyn Surface,
    selectors: &SelectorSet,
) -> Result<Option<ElementHandle>, SurfaceError> {
    match surface.locate(selectors, Duration::ZERO) {
        Ok(handle) => Ok(Some(handle)),
        Err(SurfaceError::NotFound) => Ok(None),
        Err(err) => Err(err),
    }
}
