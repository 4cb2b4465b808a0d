//! The titles listed in the menu.

pub mod claimer;
pub mod crosser;
pub mod halloween;
pub mod racer;
pub mod scroller;
pub mod shader;
pub mod stacker;
