//! Maintenance-mode gate, evaluated before any page is resolved.

use slugpress_shared::{CallerContext, SettingsProvider, keys};

/// Shown when no `maintenance_message` setting exists.
pub const DEFAULT_MAINTENANCE_MESSAGE: &str =
    "We are performing scheduled maintenance. Please check back soon.";

/// What the gate decided for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Resolve the page normally.
    Open,
    /// Skip resolution and show the maintenance view.
    Maintenance { message: String },
}

/// Reads the maintenance flag from site settings.
pub struct MaintenanceGate;

impl MaintenanceGate {
    /// Maintenance applies only when the flag is on and the caller is not privileged.
    pub fn evaluate(settings: &dyn SettingsProvider, caller: &CallerContext) -> GateDecision {
        if !settings.flag(keys::MAINTENANCE_MODE) || caller.privileged {
            return GateDecision::Open;
        }

        let message = settings.get(keys::MAINTENANCE_MESSAGE, DEFAULT_MAINTENANCE_MESSAGE);
        let message = if message.trim().is_empty() {
            DEFAULT_MAINTENANCE_MESSAGE.to_string()
        } else {
            message
        };
        GateDecision::Maintenance { message }
    }
}
