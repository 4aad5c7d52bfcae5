//! Charts module - Map rendering and its color legend

mod deck;
mod legend;
mod palette;
mod plotter;
mod renderer;

pub use deck::{
    ColumnDatum, ColumnLayer, DeckSpec, Light, Lighting, MapStyle, CARTO_DARK_STYLE,
    MAPBOX_DARK_STYLE, MAPBOX_KEY_VAR,
};
pub use legend::{format_value, legend_edges, Legend, LegendEntry};
pub use palette::{ColorScheme, PaletteError, Rgba};
pub use plotter::{to_color32, HexMapData, HexMapPlotter};
pub use renderer::{CountChartRenderer, RenderError, StaticMapRenderer};
