//! Digital trigger inputs.
//!
//! Each trigger watches one active-high pin and turns level changes into
//! action requests: a rising edge asks for the trigger's action, a falling
//! edge asks to undo it. The first evaluation only records the level.

use heapless::Vec;

use crate::action::{ActionRequest, Origin};
use crate::config::Millis;
use crate::gpio::{GpioSource, Pin, PinMap};
use crate::ui::{PanelName, ThemeName};

/// Upper bound on requests produced by one poll (one per trigger).
pub const MAX_TRIGGERS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerId {
    KeyPresent,
    KeyAbsent,
    Lock,
    Lights,
}

impl TriggerId {
    /// Registration order; also the evaluation order.
    pub const ALL: [TriggerId; MAX_TRIGGERS] = [
        TriggerId::KeyPresent,
        TriggerId::KeyAbsent,
        TriggerId::Lock,
        TriggerId::Lights,
    ];

    pub const fn priority(self) -> TriggerPriority {
        match self {
            TriggerId::KeyPresent | TriggerId::KeyAbsent => TriggerPriority::Critical,
            TriggerId::Lock => TriggerPriority::Important,
            TriggerId::Lights => TriggerPriority::Normal,
        }
    }

    /// Request emitted when the input becomes active.
    pub const fn action(self) -> ActionRequest {
        let origin = Origin::Trigger(self);
        match self {
            TriggerId::KeyPresent | TriggerId::KeyAbsent => {
                ActionRequest::LoadPanel(PanelName::Key, origin)
            }
            TriggerId::Lock => ActionRequest::LoadPanel(PanelName::Lock, origin),
            TriggerId::Lights => ActionRequest::SetTheme(ThemeName::Night, origin),
        }
    }

    /// Panel this trigger puts on screen. Triggers sharing a panel hand it
    /// over to each other instead of restoring.
    pub const fn panel(self) -> Option<PanelName> {
        match self {
            TriggerId::KeyPresent | TriggerId::KeyAbsent => Some(PanelName::Key),
            TriggerId::Lock => Some(PanelName::Lock),
            TriggerId::Lights => None,
        }
    }

    /// Request emitted when the input goes inactive again.
    pub const fn restore(self) -> ActionRequest {
        match self {
            TriggerId::Lights => ActionRequest::SetTheme(ThemeName::Day, Origin::Trigger(self)),
            _ => ActionRequest::Restore(self),
        }
    }

    const fn pin(self, pins: &PinMap) -> Pin {
        match self {
            TriggerId::KeyPresent => pins.key_present,
            TriggerId::KeyAbsent => pins.key_absent,
            TriggerId::Lock => pins.lock,
            TriggerId::Lights => pins.lights,
        }
    }
}

/// Arbitration priority. Higher wins the panel manager's pending slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerPriority {
    Normal,
    Important,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerState {
    /// Not yet evaluated.
    Init,
    Active,
    Inactive,
}

#[derive(Clone, Copy)]
struct Trigger {
    id: TriggerId,
    pin: Pin,
    state: TriggerState,
}

/// Evaluates every registered trigger once per tick.
pub struct TriggerArbiter {
    triggers: [Trigger; MAX_TRIGGERS],
}

impl TriggerArbiter {
    pub fn new(pins: &PinMap) -> Self {
        Self {
            triggers: TriggerId::ALL.map(|id| Trigger {
                id,
                pin: id.pin(pins),
                state: TriggerState::Init,
            }),
        }
    }

    /// Sample all trigger pins and return the requests caused by state
    /// changes, lowest priority first so the most important one is
    /// submitted last.
    pub fn poll(
        &mut self,
        gpio: &impl GpioSource,
        _now: Millis,
    ) -> Vec<ActionRequest, MAX_TRIGGERS> {
        let mut out: Vec<ActionRequest, MAX_TRIGGERS> = Vec::new();
        let previous = self.triggers;

        for trigger in self.triggers.iter_mut() {
            trigger.state = if gpio.read_digital(trigger.pin) {
                TriggerState::Active
            } else {
                TriggerState::Inactive
            };
        }

        for (before, trigger) in previous.iter().zip(self.triggers.iter()) {
            let request = match (before.state, trigger.state) {
                (TriggerState::Init, next) => {
                    debug!("Trigger {:?}: primed {:?}", trigger.id, next);
                    None
                }
                (TriggerState::Inactive, TriggerState::Active) => Some(trigger.id.action()),
                (TriggerState::Active, TriggerState::Inactive) => self.release(trigger.id, &previous),
                _ => None,
            };

            if let Some(request) = request {
                info!("Trigger {:?}: {:?} -> {:?}", trigger.id, trigger.state, request);
                // At most one request per trigger, cannot overflow.
                let _ = out.push(request);
            }
        }

        // Insertion sort: stable, and the vector never holds more than four.
        for i in 1..out.len() {
            let mut j = i;
            while j > 0 && out[j - 1].priority() > out[j].priority() {
                out.swap(j - 1, j);
                j -= 1;
            }
        }
        out
    }

    /// Request for a trigger that just went inactive. While another trigger
    /// for the same panel is still asserted the panel stays: it is handed to
    /// that trigger (or to its own rising edge this poll) instead of being
    /// restored.
    fn release(&self, id: TriggerId, previous: &[Trigger; MAX_TRIGGERS]) -> Option<ActionRequest> {
        let Some(panel) = id.panel() else {
            return Some(id.restore());
        };
        let holder = self.triggers.iter().zip(previous.iter()).find(|(t, _)| {
            t.id != id && t.id.panel() == Some(panel) && t.state == TriggerState::Active
        });
        match holder {
            Some((t, before)) if before.state == TriggerState::Active => {
                debug!("Trigger {:?}: {} handed to {:?}", id, panel, t.id);
                Some(t.id.action())
            }
            Some(_) => None,
            None => Some(id.restore()),
        }
    }

    /// First evaluation: record every level without emitting.
    pub fn prime(&mut self, gpio: &impl GpioSource, now: Millis) {
        let primed = self.poll(gpio, now);
        debug_assert!(primed.is_empty());
    }

    pub fn state(&self, id: TriggerId) -> TriggerState {
        self.triggers
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.state)
            .unwrap_or(TriggerState::Init)
    }

    /// Triggers currently asserted, in registration order.
    pub fn active_triggers(&self) -> impl Iterator<Item = TriggerId> + '_ {
        self.triggers
            .iter()
            .filter(|t| t.state == TriggerState::Active)
            .map(|t| t.id)
    }
}
