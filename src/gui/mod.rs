//! GUI module - User interface components

mod app;
mod control_panel;
mod map_viewer;

pub use app::CrashMapApp;
pub use control_panel::{ControlPanel, ControlPanelAction, UserSettings};
pub use map_viewer::MapViewer;
