//! Reusable animated scenes shared between titles and the menu.

pub mod lightning;
pub mod storm;
