//! GC9A01 round display wrapper.
//!
//! Implements the core's graphics capability on a 240x240 frame buffer.
//! Animations are frame-counted: each `render()` call (one per dispatcher
//! tick) draws one frame, and the finished animation is queued as a
//! completion for the panel manager to pick up on its next tick.

use clarity::gpio::ANALOG_MAX;
use clarity::graphics::{AnimationKind, Completion, Graphics};
use clarity::{PanelName, ThemeName};
use core::fmt::Write;
use defmt::{debug, warn};
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Arc, PrimitiveStyle};
use embedded_graphics::text::{Alignment, Text};
use heapless::{Deque, String};

/// Push the frame buffer to the panel.
pub trait Present {
    fn present(&mut self) -> bool;
}

const CENTER: Point = Point::new(120, 120);

/// Frames for the enter sweep (~120 ms at the 10 ms tick).
const ENTER_FRAMES: u8 = 12;

/// Frames for a gauge needle move.
const UPDATE_FRAMES: u8 = 8;

/// Gauge arc spans 270 degrees, open at the bottom.
const GAUGE_START_DEG: f32 = 135.0;
const GAUGE_SWEEP_DEG: f32 = 270.0;

#[derive(Clone, Copy)]
struct Palette {
    background: Rgb565,
    foreground: Rgb565,
    accent: Rgb565,
    track: Rgb565,
}

impl Palette {
    const fn for_theme(theme: ThemeName) -> Self {
        match theme {
            ThemeName::Day => Palette {
                background: Rgb565::WHITE,
                foreground: Rgb565::BLACK,
                accent: Rgb565::new(31, 20, 0),
                track: Rgb565::new(24, 48, 24),
            },
            ThemeName::Night => Palette {
                background: Rgb565::BLACK,
                foreground: Rgb565::new(28, 56, 28),
                accent: Rgb565::new(31, 10, 0),
                track: Rgb565::new(4, 8, 4),
            },
        }
    }
}

#[derive(Clone, Copy)]
enum Animation {
    Enter { panel: PanelName, frame: u8 },
    Update { panel: PanelName, from: u16, to: u16, frame: u8 },
}

impl Animation {
    fn completion(&self, ok: bool) -> Completion {
        let (kind, panel) = match *self {
            Animation::Enter { panel, .. } => (AnimationKind::Load, panel),
            Animation::Update { panel, .. } => (AnimationKind::Update, panel),
        };
        Completion { kind, panel, ok }
    }
}

fn title(panel: PanelName) -> &'static str {
    match panel {
        PanelName::Splash => "clarity",
        PanelName::OilPressure => "OIL PRESS",
        PanelName::OilTemperature => "OIL TEMP",
        PanelName::Key => "KEY",
        PanelName::Lock => "LOCKED",
        PanelName::Config => "SETTINGS",
    }
}

fn is_gauge(panel: PanelName) -> bool {
    matches!(panel, PanelName::OilPressure | PanelName::OilTemperature)
}

pub struct ClusterDisplay<D: 'static> {
    screen: &'static mut D,
    palette: Palette,
    panel: Option<PanelName>,
    /// Raw reading currently shown by the gauge.
    value: u16,
    animation: Option<Animation>,
    completions: Deque<Completion, 4>,
    dirty: bool,
}

impl<D> ClusterDisplay<D>
where
    D: DrawTarget<Color = Rgb565> + Present,
{
    pub fn new(screen: &'static mut D) -> Self {
        Self {
            screen,
            palette: Palette::for_theme(ThemeName::Day),
            panel: None,
            value: 0,
            animation: None,
            completions: Deque::new(),
            dirty: true,
        }
    }

    fn finish(&mut self, completion: Completion) {
        if self.completions.push_back(completion).is_err() {
            warn!("Display: completion queue full, dropping {:?}", completion);
        }
    }

    fn draw_frame(&mut self) -> Result<(), D::Error> {
        let palette = self.palette;
        self.screen.clear(palette.background)?;

        let Some(panel) = self.panel else {
            return Ok(());
        };

        // Enter sweep around the bezel.
        if let Some(Animation::Enter { frame, .. }) = self.animation {
            let sweep = 360.0 * f32::from(frame + 1) / f32::from(ENTER_FRAMES);
            Arc::with_center(CENTER, 236, Angle::from_degrees(-90.0), Angle::from_degrees(sweep))
                .into_styled(PrimitiveStyle::with_stroke(palette.accent, 4))
                .draw(self.screen)?;
        }

        let title_style = MonoTextStyle::new(&FONT_10X20, palette.foreground);
        Text::with_alignment(title(panel), Point::new(120, 96), title_style, Alignment::Center)
            .draw(self.screen)?;

        if is_gauge(panel) {
            let shown = match self.animation {
                Some(Animation::Update { from, to, frame, .. }) => {
                    let t = i32::from(frame + 1);
                    let n = i32::from(UPDATE_FRAMES);
                    (i32::from(from) + (i32::from(to) - i32::from(from)) * t / n) as u16
                }
                _ => self.value,
            };
            self.draw_gauge(shown)?;
        }
        Ok(())
    }

    fn draw_gauge(&mut self, value: u16) -> Result<(), D::Error> {
        let palette = self.palette;
        let fraction = f32::from(value.min(ANALOG_MAX)) / f32::from(ANALOG_MAX);

        Arc::with_center(
            CENTER,
            200,
            Angle::from_degrees(GAUGE_START_DEG),
            Angle::from_degrees(GAUGE_SWEEP_DEG),
        )
        .into_styled(PrimitiveStyle::with_stroke(palette.track, 12))
        .draw(self.screen)?;

        Arc::with_center(
            CENTER,
            200,
            Angle::from_degrees(GAUGE_START_DEG),
            Angle::from_degrees(GAUGE_SWEEP_DEG * fraction),
        )
        .into_styled(PrimitiveStyle::with_stroke(palette.accent, 12))
        .draw(self.screen)?;

        let mut label: String<8> = String::new();
        let _ = write!(label, "{}", value);
        Text::with_alignment(
            label.as_str(),
            Point::new(120, 150),
            MonoTextStyle::new(&FONT_6X10, palette.foreground),
            Alignment::Center,
        )
        .draw(self.screen)?;
        Ok(())
    }
}

impl<D> Graphics for ClusterDisplay<D>
where
    D: DrawTarget<Color = Rgb565> + Present,
{
    fn load_panel(&mut self, name: PanelName) {
        if let Some(previous @ Animation::Enter { .. }) = self.animation {
            // Superseded after a timeout on the manager side.
            self.finish(previous.completion(false));
        }
        debug!("Display: enter {}", name);
        self.panel = Some(name);
        // Gauges sweep up from zero; the old reading belongs to another panel.
        self.value = 0;
        self.animation = Some(Animation::Enter {
            panel: name,
            frame: 0,
        });
    }

    fn update_panel(&mut self, name: PanelName, value: u16) {
        if self.panel != Some(name) || self.animation.is_some() {
            self.finish(Completion {
                kind: AnimationKind::Update,
                panel: name,
                ok: false,
            });
            return;
        }
        self.animation = Some(Animation::Update {
            panel: name,
            from: self.value,
            to: value,
            frame: 0,
        });
    }

    fn apply_theme(&mut self, theme: ThemeName) {
        self.palette = Palette::for_theme(theme);
        self.dirty = true;
    }

    fn poll_completion(&mut self) -> Option<Completion> {
        self.completions.pop_front()
    }

    fn render(&mut self) {
        if self.animation.is_none() && !self.dirty {
            return;
        }
        let ok = self.draw_frame().is_ok() && self.screen.present();
        self.dirty = false;

        let Some(animation) = self.animation else {
            if !ok {
                warn!("Display: redraw failed");
            }
            return;
        };

        let next = match animation {
            Animation::Enter { panel, frame } if ok && frame + 1 < ENTER_FRAMES => {
                Some(Animation::Enter {
                    panel,
                    frame: frame + 1,
                })
            }
            Animation::Update {
                panel,
                from,
                to,
                frame,
            } if ok && frame + 1 < UPDATE_FRAMES => Some(Animation::Update {
                panel,
                from,
                to,
                frame: frame + 1,
            }),
            _ => None,
        };

        if next.is_none() {
            if let Animation::Update { to, .. } = animation {
                self.value = to;
            }
            self.finish(animation.completion(ok));
        }
        self.animation = next;
    }
}
