//! Player state and reconciliation rules

use lms_protocol::PlayerId;
use serde::{Deserialize, Serialize};

use super::{Mode, PlayerProperty};
use crate::error::{Result, StateError};

const MIXER_VOLUME: &str = "mixer volume";

/// How a `mixer volume` payload changes the stored volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeUpdate {
    /// Replace the current volume
    Absolute(i64),
    /// Add to the current volume
    Relative(i64),
}

impl VolumeUpdate {
    /// Parse a volume payload
    ///
    /// A leading `+` or `-` makes the update relative; anything else is an
    /// absolute value.
    pub fn parse(payload: &str) -> Result<Self> {
        let payload = payload.trim();
        let value: i64 = payload.parse().map_err(|_| StateError::InvalidPayload {
            keyword: MIXER_VOLUME,
            payload: payload.to_string(),
            reason: "expected an integer".to_string(),
        })?;

        if payload.starts_with('+') || payload.starts_with('-') {
            Ok(VolumeUpdate::Relative(value))
        } else {
            Ok(VolumeUpdate::Absolute(value))
        }
    }
}

/// Outcome of handing unrecognized text to a player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Forwarded {
    /// The player understood the text and changed a property
    Property(PlayerProperty),
    /// Generic named event for observers
    Event { name: String, args: Vec<String> },
}

/// A single player known to the server
///
/// Created once per discovered address. Callers only ever see clones, so
/// every field is read through an accessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    index: usize,
    name: Option<String>,
    current_title: Option<String>,
    mode: Mode,
    power: Option<bool>,
    signal_strength: Option<i64>,
    volume: i64,
}

impl Player {
    /// Create a player as reported by `player id <index> <id>`
    pub fn new(id: PlayerId, index: usize) -> Self {
        Self {
            id,
            index,
            name: None,
            current_title: None,
            mode: Mode::Unknown,
            power: None,
            signal_strength: None,
            volume: 0,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// Ordinal reported during discovery
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn current_title(&self) -> Option<&str> {
        self.current_title.as_deref()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// `None` until the server first reports power
    pub fn power(&self) -> Option<bool> {
        self.power
    }

    pub fn signal_strength(&self) -> Option<i64> {
        self.signal_strength
    }

    /// Accumulated volume; not clamped to any range
    pub fn volume(&self) -> i64 {
        self.volume
    }

    /// Volume as heard: zero while stopped, paused, off or powered down
    pub fn noise_level(&self) -> i64 {
        if self.mode.is_silent() || self.power == Some(false) {
            0
        } else {
            self.volume
        }
    }

    /// Write a property unconditionally
    ///
    /// Returns the notification to publish. Writing the current value still
    /// produces a notification.
    pub fn set_property(&mut self, property: PlayerProperty) -> PlayerProperty {
        match &property {
            PlayerProperty::Name(name) => self.name = Some(name.clone()),
            PlayerProperty::CurrentTitle(title) => self.current_title = Some(title.clone()),
            PlayerProperty::Mode(mode) => self.mode = *mode,
            PlayerProperty::Power(on) => self.power = Some(*on),
            PlayerProperty::SignalStrength(strength) => self.signal_strength = Some(*strength),
            PlayerProperty::Volume(volume) => self.volume = *volume,
        }
        property
    }

    /// Apply an absolute or relative volume update
    pub fn apply_volume(&mut self, update: VolumeUpdate) -> PlayerProperty {
        let volume = match update {
            VolumeUpdate::Absolute(value) => value,
            VolumeUpdate::Relative(delta) => self.volume.saturating_add(delta),
        };
        self.set_property(PlayerProperty::Volume(volume))
    }

    /// Handle device-scoped text no dispatcher keyword claimed
    ///
    /// `mixer volume <payload>` updates the volume. Anything else becomes a
    /// named event: the first token is the name, the rest are arguments.
    pub fn handle_forwarded(&mut self, text: &str) -> Result<Forwarded> {
        if let Some(payload) = text
            .strip_prefix(MIXER_VOLUME)
            .and_then(|rest| rest.strip_prefix(' '))
        {
            let update = VolumeUpdate::parse(payload)?;
            return Ok(Forwarded::Property(self.apply_volume(update)));
        }

        let mut tokens = text.split(' ').filter(|t| !t.is_empty());
        let name = tokens.next().unwrap_or_default().to_string();
        let args = tokens.map(str::to_string).collect();

        Ok(Forwarded::Event { name, args })
    }
}
