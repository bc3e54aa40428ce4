//! Status LED driver.

use crate::ble::peripheral;
use crate::config::{LED_ACTIVE_LOW, LED_BLINK_MS, LED_POLL_MS};
use crate::ui::indicator_logic::{led_level, led_pattern, LedPattern};
use embassy_time::{Duration, Timer};
use embedded_hal::digital::OutputPin;

/// Drive `led` from the session state. Never returns.
pub async fn status_led_task<L: OutputPin>(mut led: L) -> ! {
    let mut tick: u32 = 0;
    loop {
        let pattern = led_pattern(peripheral::state());
        let lit = led_level(pattern, tick);
        // Pin errors are infallible on nRF.
        let _ = led.set_state((lit != LED_ACTIVE_LOW).into());

        let period = match pattern {
            LedPattern::Off | LedPattern::On => LED_POLL_MS,
            LedPattern::Blink | LedPattern::Flash => LED_BLINK_MS,
        };
        tick = tick.wrapping_add(1);
        Timer::after(Duration::from_millis(period)).await;
    }
}
