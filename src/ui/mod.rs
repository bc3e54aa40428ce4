//! User interface subsystem - one button and one LED.
//!
//! ## Components
//!
//! - **Pairing button**: toggles whether the device advertises
//! - **Status LED**: shows the session state (see [`indicator_logic`])

pub mod buttons;
pub mod indicator;
pub mod indicator_logic;
