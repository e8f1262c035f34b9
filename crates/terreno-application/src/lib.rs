//! Application layer: use-case orchestration over the Terreno core.
//!
//! Wires the session state machine, auto-save debouncing, location
//! resolution and the delivery-evidence flow together for the screens.

pub mod autosave;
pub mod location;
pub mod visit_usecase;

pub use autosave::AutoSaveCoordinator;
pub use location::{LocationResolver, ResolvedLocation, UNAVAILABLE_LABEL};
pub use visit_usecase::{DeliveryOutcome, VisitUseCase};
