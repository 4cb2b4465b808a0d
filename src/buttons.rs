//! Badge buttons mapped onto the eight launcher switches.
//!
//! | badge  | switch      |
//! |--------|-------------|
//! | A      | A           |
//! | B      | B           |
//! | Start  | C           |
//! | Select | D           |
//! | Up     | VolUp       |
//! | Down   | VolDown     |
//! | Right  | BrightUp    |
//! | Left   | BrightDown  |
//!
//! Levels are read once per tick; edge and hold logic lives above this.

use esp_hal::gpio::{
    Input,
    InputConfig,
    Pull,
};

use crate::{
    board::ButtonResources,
    input::{
        ButtonOctet,
        InputProvider,
    },
};

pub struct Buttons {
    up: Input<'static>,
    down: Input<'static>,
    left: Input<'static>,
    right: Input<'static>,
    a: Input<'static>,
    b: Input<'static>,
    start: Input<'static>,
    select: Input<'static>,
}

impl From<ButtonResources<'static>> for Buttons {
    fn from(res: ButtonResources<'static>) -> Self {
        let pull_up = InputConfig::default().with_pull(Pull::Up);
        Self {
            up: Input::new(res.up, pull_up),
            down: Input::new(res.down, pull_up),
            left: Input::new(res.left, pull_up),
            right: Input::new(res.right, pull_up),
            a: Input::new(res.a, pull_up),
            b: Input::new(res.b, pull_up),
            start: Input::new(res.start, pull_up),
            // Select is wired active-high.
            select: Input::new(res.select, InputConfig::default().with_pull(Pull::Down)),
        }
    }
}

impl InputProvider for Buttons {
    fn sample(&mut self) -> ButtonOctet {
        ButtonOctet {
            a: self.a.is_low(),
            b: self.b.is_low(),
            c: self.start.is_low(),
            d: self.select.is_high(),
            vol_up: self.up.is_low(),
            vol_down: self.down.is_low(),
            bright_up: self.right.is_low(),
            bright_down: self.left.is_low(),
        }
    }
}
