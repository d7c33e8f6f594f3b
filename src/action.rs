//! Action requests - the only currency producers hand to the panel manager.
//!
//! A closed enum rather than boxed command objects: the set is known at
//! build time and a press must not allocate.

use crate::triggers::{TriggerId, TriggerPriority};
use crate::ui::{PanelName, ThemeName};

/// Who asked for a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Origin {
    /// A digital trigger input changed state.
    Trigger(TriggerId),
    /// The pushbutton, via the current panel's input contract.
    UserInput,
}

impl Origin {
    pub const fn is_trigger(self) -> bool {
        matches!(self, Origin::Trigger(_))
    }

    /// Priority used for single-slot arbitration.
    pub const fn priority(self) -> TriggerPriority {
        match self {
            Origin::Trigger(id) => id.priority(),
            Origin::UserInput => TriggerPriority::Normal,
        }
    }
}

/// A desired transition, submitted to the panel manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActionRequest {
    /// Show a panel.
    LoadPanel(PanelName, Origin),
    /// Switch the colour scheme.
    SetTheme(ThemeName, Origin),
    /// Undo a trigger-driven load: pop the restoration stack or fall back
    /// to the preferred default panel.
    Restore(TriggerId),
    /// Change the persisted default panel (config menu).
    SetDefaultPanel(PanelName, Origin),
    /// Nothing to do.
    NoOp,
}

impl ActionRequest {
    pub const fn origin(&self) -> Option<Origin> {
        match *self {
            ActionRequest::LoadPanel(_, origin)
            | ActionRequest::SetTheme(_, origin)
            | ActionRequest::SetDefaultPanel(_, origin) => Some(origin),
            ActionRequest::Restore(id) => Some(Origin::Trigger(id)),
            ActionRequest::NoOp => None,
        }
    }

    pub fn priority(&self) -> TriggerPriority {
        self.origin()
            .map(Origin::priority)
            .unwrap_or(TriggerPriority::Normal)
    }

    /// Requests that change which panel is on screen.
    pub const fn affects_panel(&self) -> bool {
        matches!(
            self,
            ActionRequest::LoadPanel(..) | ActionRequest::Restore(_)
        )
    }

    pub const fn is_noop(&self) -> bool {
        matches!(self, ActionRequest::NoOp)
    }
}
