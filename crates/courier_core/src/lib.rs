//! Courier core: pure dispatch-preparation logic.
//!
//! Everything in this crate is side-effect free: message template resolution,
//! phone address normalization, and contact list parsing. The engine crate
//! layers surface interaction and pacing on top of these.
mod address;
mod contacts;
mod template;

pub use address::{normalize, CanonicalAddress, NormalizeError, RegionDefaults};
pub use contacts::{parse_contacts, Contact};
pub use template::{resolve_template, resolve_template_with, NAME_PLACEHOLDER};
