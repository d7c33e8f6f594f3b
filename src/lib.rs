//! Event coordination core for the clarity gauge cluster.
//!
//! Every module here is pure logic and runs on the host: raw GPIO levels
//! go in through [`gpio::GpioSource`], panel loads and theme changes come
//! out through [`graphics::Graphics`], and preferences persist through
//! [`preferences::PreferenceBackend`]. The embedded binary (`main.rs`)
//! supplies nRF52840 implementations of those three traits.
//!
//! Usage: `cargo test` (unit tests + `tests/integration.rs`)
//!
//! Note: `main.rs` is `#![no_std]` + `#![no_main]` and only builds with
//! `--features embedded`.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod action;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gpio;
pub mod graphics;
pub mod panel_manager;
pub mod preferences;
pub mod sim;
pub mod triggers;
pub mod ui;

pub use action::{ActionRequest, Origin};
pub use dispatcher::Dispatcher;
pub use error::{Error, StorageError};
pub use ui::{PanelName, PressEvent, ThemeName};
