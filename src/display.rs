//! ST7789 display driver (320×170 LCD over SPI with DMA) and the panel
//! that shows the 32×32 frame on it.

use embedded_graphics::{
    pixelcolor::{
        Rgb565,
        Rgb888,
    },
    prelude::*,
    primitives::Rectangle,
};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    Async,
    dma::{
        DmaRxBuf,
        DmaTxBuf,
    },
    dma_buffers,
    gpio::{
        Level,
        Output,
        OutputConfig,
    },
    spi::master::Spi,
    time::Rate,
};

use crate::{
    backlight::Backlight,
    board::DisplayResources,
    color::scale,
    config::{
        HEIGHT,
        WIDTH,
    },
    frame::Frame,
    panel::Panel,
};

type SpiInterface<'a> = mipidsi::interface::SpiInterface<
    'a,
    ExclusiveDevice<esp_hal::spi::master::SpiDmaBus<'a, Async>, Output<'a>, esp_hal::delay::Delay>,
    Output<'a>,
>;

/// The badge's ST7789 display, ready to draw on with `embedded-graphics`.
pub type Display<'a> = mipidsi::Display<SpiInterface<'a>, mipidsi::models::ST7789, Output<'a>>;

impl<'a> From<DisplayResources<'a>> for Display<'a> {
    fn from(res: DisplayResources<'a>) -> Self {
        let (rx_buffer, rx_descriptors, tx_buffer, tx_descriptors) = dma_buffers!(32000);
        let dma_rx_buf = DmaRxBuf::new(rx_descriptors, rx_buffer).expect("dma rx buffer");
        let dma_tx_buf = DmaTxBuf::new(tx_descriptors, tx_buffer).expect("dma tx buffer");

        let mut delay = esp_hal::delay::Delay::new();

        let dc = Output::new(res.dc, Level::Low, OutputConfig::default());
        let mut rst = Output::new(res.rst, Level::Low, OutputConfig::default());
        rst.set_high();

        let spi = Spi::new(
            res.spi,
            esp_hal::spi::master::Config::default().with_frequency(Rate::from_mhz(80)),
        )
        .expect("spi config")
        .with_sck(res.sck)
        .with_mosi(res.mosi)
        .with_miso(res.miso)
        .with_dma(res.dma)
        .with_buffers(dma_rx_buf, dma_tx_buf)
        .into_async();

        let cs = Output::new(res.cs, Level::High, OutputConfig::default());
        let spi_device = ExclusiveDevice::new(spi, cs, delay).expect("spi device");

        let buffer = crate::mk_static!([u8; 32000], [0_u8; 32000]);
        let di = mipidsi::interface::SpiInterface::new(spi_device, dc, buffer);

        mipidsi::Builder::new(mipidsi::models::ST7789, di)
            .reset_pin(rst)
            .display_size(170, 320)
            .invert_colors(mipidsi::options::ColorInversion::Inverted)
            .orientation(
                mipidsi::options::Orientation::new().rotate(mipidsi::options::Rotation::Deg90),
            )
            .display_offset(35, 0)
            .init(&mut delay)
            .expect("st7789 init")
    }
}

// ── Matrix emulation ────────────────────────────────────────────────────────

/// Each matrix pixel becomes a `SCALE`×`SCALE` block.
const SCALE: i32 = 5;
const ORIGIN: Point = Point::new((320 - WIDTH * SCALE) / 2, (170 - HEIGHT * SCALE) / 2);

/// The 32×32 matrix shown as a 160×160 block in the middle of the LCD.
pub struct BadgePanel {
    display: &'static mut Display<'static>,
    backlight: &'static mut Backlight,
    level: f32,
}

impl BadgePanel {
    pub fn new(display: &'static mut Display<'static>, backlight: &'static mut Backlight) -> Self {
        let _ = display.clear(Rgb565::BLACK);
        Self {
            display,
            backlight,
            level: 1.0,
        }
    }
}

impl Panel for BadgePanel {
    fn push(&mut self, frame: &Frame) {
        let area = Rectangle::new(ORIGIN, Size::new((WIDTH * SCALE) as u32, (HEIGHT * SCALE) as u32));
        let level = self.level;
        let colors = (0..HEIGHT * SCALE).flat_map(|sy| {
            (0..WIDTH * SCALE).map(move |sx| {
                let c: Rgb888 = frame.get(sx / SCALE, sy / SCALE);
                Rgb565::from(scale(c, level))
            })
        });
        if self.display.fill_contiguous(&area, colors).is_err() {
            warn!("display write failed, frame dropped");
        }
    }

    fn brightness(&self) -> f32 {
        self.level
    }

    fn set_brightness(&mut self, level: f32) {
        self.level = level.clamp(0.0, 1.0);
        self.backlight.set(self.level > 0.0);
    }
}
