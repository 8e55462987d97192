//! xfdashboard
//!
//! Window tracking and live window presentation core of a dashboard shell
//! for X11 desktops. The [`tracker`] keeps the authoritative model of
//! windows, workspaces and monitors fed by a windowing [`x11`] backend;
//! [`view`] turns tracked windows into live previews that [`layout`]
//! arranges, and [`actions`] holds the interaction behaviors attached to
//! them.

pub mod actions;
pub mod animation;
pub mod config;
pub mod layout;
pub mod shared;
pub mod signal;
pub mod style;
pub mod tracker;
pub mod view;
pub mod x11;
