//! Page resolution and request-safety logic for slugpress.
//!
//! This crate turns a slug into a render-ready page (or a 404/500 outcome),
//! gates requests during maintenance, and vets caller-supplied redirect
//! targets.

pub mod maintenance;
pub mod meta;
pub mod redirect;
pub mod resolver;

pub use maintenance::{DEFAULT_MAINTENANCE_MESSAGE, GateDecision, MaintenanceGate};
pub use redirect::{clean_redirect_target, validate_redirect};
pub use resolver::{Outcome, PageResolver};
