//! Typed invocations of the host scripts.
//!
//! Each struct implements `BatchScript` and maps its fields to the exact
//! environment contract of the corresponding host script.

pub mod animatic;
pub mod scene_setup;
