//! Player properties carried by change notifications

use serde::{Deserialize, Serialize};

use super::Mode;

/// A single property write on a player
///
/// The same value is used to apply the write and to notify observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerProperty {
    Name(String),
    CurrentTitle(String),
    Mode(Mode),
    Power(bool),
    SignalStrength(i64),
    Volume(i64),
}

impl PlayerProperty {
    /// Get the property key for this change
    pub fn key(&self) -> &'static str {
        match self {
            PlayerProperty::Name(_) => "name",
            PlayerProperty::CurrentTitle(_) => "current_title",
            PlayerProperty::Mode(_) => "mode",
            PlayerProperty::Power(_) => "power",
            PlayerProperty::SignalStrength(_) => "signalstrength",
            PlayerProperty::Volume(_) => "volume",
        }
    }
}
