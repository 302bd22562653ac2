// src/lib.rs

//! dockbar: a minimalist X11 status bar docked to one screen edge.
//!
//! The bar picks one output through RandR, sizes itself from that output's
//! pixel density, and repaints a row of drawers once per tick. Each drawer
//! owns an equal-width slice of the bar.

pub mod bar;
pub mod canvas;
pub mod color;
pub mod config;
pub mod display;
pub mod drawer;
pub mod drawers;
pub mod events;
pub mod geometry;
pub mod layout;
pub mod output;
pub mod render_loop;
pub mod resolution;
pub mod signals;
pub mod state;
