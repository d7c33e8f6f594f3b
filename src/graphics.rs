//! Graphics capability consumed by the panel manager.
//!
//! Animations are fire-and-forget. The implementation queues a
//! [`Completion`] when one finishes (or fails) and the panel manager drains
//! the queue at the start of its next tick, so no callback ever runs
//! outside the dispatcher.

use crate::ui::{PanelName, ThemeName};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnimationKind {
    /// Enter animation started by [`Graphics::load_panel`].
    Load,
    /// Value animation started by [`Graphics::update_panel`].
    Update,
}

/// Outcome of one animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Completion {
    pub kind: AnimationKind,
    pub panel: PanelName,
    pub ok: bool,
}

impl Completion {
    pub const fn loaded(panel: PanelName) -> Self {
        Self {
            kind: AnimationKind::Load,
            panel,
            ok: true,
        }
    }

    pub const fn load_failed(panel: PanelName) -> Self {
        Self {
            kind: AnimationKind::Load,
            panel,
            ok: false,
        }
    }

    pub const fn updated(panel: PanelName) -> Self {
        Self {
            kind: AnimationKind::Update,
            panel,
            ok: true,
        }
    }
}

pub trait Graphics {
    /// Start the enter animation for `name`.
    fn load_panel(&mut self, name: PanelName);

    /// Animate the panel's gauge towards a raw sensor reading.
    fn update_panel(&mut self, name: PanelName, value: u16);

    /// Switch palettes. Takes effect immediately.
    fn apply_theme(&mut self, theme: ThemeName);

    /// Next finished animation, if any.
    fn poll_completion(&mut self) -> Option<Completion>;

    /// Give the toolkit a chance to draw. Called once per tick.
    fn render(&mut self);
}
