// Network adapter modules split by the player socket vs plain HTTP routes.

pub mod client;
pub mod internal;

pub use client::ws_handler;
pub use internal::{healthz_handler, inspect_beatmap_handler};
