//! Interactive geospatial risk map
//!
//! High-risk records are rendered as circle markers on a Leaflet map and
//! written out as a standalone HTML document.

use crate::config::GeoAnchor;
use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::info;

/// One high-risk record placed on the map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskMarker {
    pub lat: f64,
    pub lon: f64,
    /// Predicted failure probability in [0, 1]
    pub probability: f64,
}

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

/// Render the markers on a map centered on `anchor` and write it to
/// `path` as a self-contained HTML document (tiles and the Leaflet
/// assets load from their CDN).
pub fn render_risk_map(
    markers: &[RiskMarker],
    anchor: GeoAnchor,
    zoom: u8,
    path: &Path,
) -> Result<()> {
    let mut html = String::with_capacity(2048 + markers.len() * 160);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n");
    html.push_str("<title>Failure Hotspot Map</title>\n");
    html.push_str(&format!(
        "<link rel=\"stylesheet\" href=\"{LEAFLET_CSS}\"/>\n<script src=\"{LEAFLET_JS}\"></script>\n"
    ));
    html.push_str("<style>html, body, #map { height: 100%; margin: 0; }</style>\n");
    html.push_str("</head>\n<body>\n<div id=\"map\"></div>\n<script>\n");

    html.push_str(&format!(
        "var map = L.map('map').setView([{:.6}, {:.6}], {});\n",
        anchor.lat, anchor.lon, zoom
    ));
    html.push_str(
        "L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', \
         { maxZoom: 19, attribution: '&copy; OpenStreetMap contributors' }).addTo(map);\n",
    );

    for marker in markers {
        html.push_str(&format!(
            "L.circleMarker([{:.6}, {:.6}], \
             {{ radius: 8, color: 'red', fill: true, fillColor: 'darkred', fillOpacity: 0.6 }})\
             .bindPopup('Failure Probability: {:.2}%').addTo(map);\n",
            marker.lat,
            marker.lon,
            marker.probability * 100.0
        ));
    }

    html.push_str("</script>\n</body>\n</html>\n");

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, html)?;
    info!(markers = markers.len(), path = %path.display(), "risk map written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn anchor() -> GeoAnchor {
        GeoAnchor::new(41.8781, -87.6298)
    }

    #[test]
    fn test_one_marker_per_record() {
        let markers = vec![
            RiskMarker {
                lat: 41.9,
                lon: -87.6,
                probability: 0.85,
            },
            RiskMarker {
                lat: 41.7,
                lon: -87.7,
                probability: 0.92,
            },
        ];
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("failure_hotspot_map.html");
        render_risk_map(&markers, anchor(), 8, &path).unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert_eq!(html.matches("L.circleMarker").count(), 2);
        assert!(html.contains("Failure Probability: 85.00%"));
        assert!(html.contains("Failure Probability: 92.00%"));
    }

    #[test]
    fn test_empty_map_still_valid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty_map.html");
        render_risk_map(&[], anchor(), 8, &path).unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("setView([41.878100, -87.629800], 8)"));
        assert!(!html.contains("L.circleMarker"));
    }

    #[test]
    fn test_creates_missing_parent_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/map.html");
        render_risk_map(&[], anchor(), 8, &path).unwrap();
        assert!(path.exists());
    }
}
