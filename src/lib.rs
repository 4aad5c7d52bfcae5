//! Philadelphia Crash Map
//!
//! Loads the city's crash extracts, bins the located crashes into hexagons
//! for a chosen metric and hands the result to a deck.gl page, a static PNG
//! or the interactive viewer.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod gui;
pub mod hex;
pub mod pipeline;
pub mod stats;
