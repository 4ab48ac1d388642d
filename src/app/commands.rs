//! Inbound commands to the AR session.
//!
//! These represent actions requested by the outside world (touch input,
//! platform location services, UI buttons) that the
//! [`ArSession`](super::service::ArSession) interprets and acts upon.

use crate::config::ToyConfig;
use crate::model::{Coordinate, TapInput};
use crate::presence::Authorization;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// The user tapped the AR view.
    Tap(TapInput),

    /// Feed button pressed.
    Feed,

    /// Top up the niboshi bag.
    RefillNiboshi,

    /// Save the current frame.
    Capture,

    /// Leave the AR view: cancel everything and clear the scene.
    Teardown,

    /// A new position fix from location services.
    PositionUpdated(Coordinate),

    /// Location permission changed.
    AuthorizationChanged(Authorization),

    /// Hot-reload configuration.  Rejected if it fails validation.
    UpdateConfig(ToyConfig),
}
