//! Rendered artifacts: static SVG charts and the interactive risk map

mod charts;
mod map;

pub use charts::{
    render_class_imbalance, render_feature_importance, render_geo_scatter, render_missing_data,
};
pub use map::{render_risk_map, RiskMarker};
