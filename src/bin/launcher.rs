//! Badge firmware: the menu and every title on the emulated 32×32 matrix.

#![no_std]
#![no_main]

use cosmic_arcade::{
    Backlight,
    BadgePanel,
    Buttons,
    Display,
    config::LOOP_SLEEP_MS,
    input::MergedInput,
    launcher::{
        Launcher,
        Pacer,
    },
    menu::Menu,
    mk_static,
};
use defmt::info;
use embassy_executor::Spawner;
use embassy_time::{
    Duration,
    Instant,
    Timer,
};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use esp_println as _;

extern crate alloc;

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    let resources = cosmic_arcade::board::init();

    esp_alloc::heap_allocator!(size: 96 * 1024);

    let timg0 = TimerGroup::new(resources.timer.timg0);
    esp_rtos::start(timg0.timer0);

    let display = mk_static!(Display<'static>, resources.display.into());
    let backlight = mk_static!(Backlight, resources.backlight.into());
    let buttons: Buttons = resources.buttons.into();

    let mut input = MergedInput::physical_only(buttons);
    let mut launcher = Launcher::new(Menu::catalogue(), BadgePanel::new(display, backlight));
    let mut pacer = Pacer::default();

    info!("launcher started");

    loop {
        let now = Instant::now();
        if pacer.due(now) {
            launcher.tick(&mut input, now);
        }
        Timer::after(Duration::from_millis(LOOP_SLEEP_MS)).await;
    }
}
