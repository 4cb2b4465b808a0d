//! Display backlight control.

use esp_hal::gpio::{
    Level,
    Output,
    OutputConfig,
};

use crate::board::BacklightResources;

/// The display backlight LED. It has no dimming; brightness is applied to
/// the pixels and the light only goes dark at level zero.
pub struct Backlight {
    pin: Output<'static>,
}

impl From<BacklightResources<'static>> for Backlight {
    fn from(res: BacklightResources<'static>) -> Self {
        Self {
            pin: Output::new(res.led, Level::High, OutputConfig::default()),
        }
    }
}

impl Backlight {
    pub fn set(&mut self, on: bool) {
        self.pin.set_level(Level::from(on));
    }

    pub fn is_on(&self) -> bool {
        self.pin.is_set_high()
    }
}
