//! # cosmic-arcade
//!
//! A game launcher and title pack for a 32×32 RGB matrix with eight
//! switches.
//!
//! Everything above the hardware is platform independent and runs on the
//! host under test:
//! - **Frame / Panel**: the 32×32 `Rgb888` buffer and the trait it is pushed through
//! - **Input**: button snapshots, edge detection and the network latch
//! - **Launcher / Menu**: the menu ↔ title state machine with global brightness keys
//! - **Titles**: racer, side-scroller, crosser, stacker, claimer, shader gallery,
//!   stormy night and the Halloween carousel
//!
//! With the `badge` feature the Disobey 2026 badge (ESP32-S3) drives it all:
//! the matrix is upscaled onto the ST7789 LCD and the badge buttons become
//! the eight switches.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! let resources = cosmic_arcade::board::init();
//! let display = mk_static!(Display<'static>, resources.display.into());
//! let backlight = mk_static!(Backlight, resources.backlight.into());
//! let mut launcher = Launcher::new(Menu::catalogue(), BadgePanel::new(display, backlight));
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod brightness;
pub mod color;
pub mod config;
pub mod frame;
pub mod game;
pub mod games;
pub mod input;
pub mod launcher;
pub mod menu;
pub mod noise;
pub mod panel;
pub mod rng;
pub mod scenes;

#[cfg(feature = "badge")]
mod backlight;
#[cfg(feature = "badge")]
pub mod board;
#[cfg(feature = "badge")]
mod buttons;
#[cfg(feature = "badge")]
mod display;

#[cfg(feature = "badge")]
pub use backlight::Backlight;
#[cfg(feature = "badge")]
pub use buttons::Buttons;
#[cfg(feature = "badge")]
pub use display::{
    BadgePanel,
    Display,
};

/// StaticCell helper: allocates a value into a `static` exactly once.
#[cfg(feature = "badge")]
#[macro_export]
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write($val);
        x
    }};
}
