//! Pairing button with async debouncing.
//!
//! Active-low with internal pull-up. Each press toggles pairing: a
//! discoverable device withdraws its advertisement, a hidden one starts
//! advertising again. A live link is never dropped by the button.

use crate::ble::peripheral;
use crate::config::BUTTON_DEBOUNCE_MS;
use defmt::{info, warn};
use embassy_time::{Duration, Timer};
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

/// Run the pairing button loop.
///
/// Waits for the pin to go low (pressed), debounces, toggles pairing,
/// then waits for release before repeating.
pub async fn pairing_button_task<B>(mut btn: B) -> !
where
    B: Wait + InputPin,
{
    loop {
        // Wait for falling edge (button press, active-low).
        if btn.wait_for_falling_edge().await.is_err() {
            continue;
        }

        // Debounce: wait and re-check.
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if btn.is_low().unwrap_or(false) {
            let result = if peripheral::pairing_enabled() {
                info!("Button: pairing off");
                peripheral::deactivate_pairing()
            } else {
                info!("Button: pairing on");
                peripheral::activate_pairing()
            };
            if let Err(e) = result {
                warn!("Pairing toggle failed: {}", e);
            }

            // Wait for release to avoid repeat triggers.
            let _ = btn.wait_for_rising_edge().await;
            Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
        }
    }
}
