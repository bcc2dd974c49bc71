//! Static SVG chart rendering
//!
//! Each function lays out one chart and writes it as a standalone SVG
//! document. No return value is consumed downstream beyond the path the
//! caller already holds.

use crate::data::MissingReport;
use crate::error::Result;
use std::fs;
use std::path::Path;

const BAR_FILL: &str = "#b91c1c";
const BAR_FILL_ALT: &str = "#1d4ed8";
const AXIS_COLOR: &str = "#e5e7eb";
const TEXT_COLOR: &str = "#374151";
const MUTED_COLOR: &str = "#6b7280";

fn svg_header(width: usize, height: usize, title: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" style="background:white; border-radius:8px">
  <text x="{}" y="22" text-anchor="middle" font-size="14" font-weight="600" fill="{TEXT_COLOR}">{title}</text>
"##,
        width / 2
    )
}

fn axes(margin: usize, width: usize, height: usize) -> String {
    format!(
        r##"  <line x1="{margin}" y1="{y0}" x2="{x1}" y2="{y0}" stroke="{AXIS_COLOR}" stroke-width="2"/>
  <line x1="{margin}" y1="{margin}" x2="{margin}" y2="{y0}" stroke="{AXIS_COLOR}" stroke-width="2"/>
"##,
        y0 = height - margin,
        x1 = width - margin,
    )
}

/// Class-imbalance bar chart: one bar per label, before any resampling.
pub fn render_class_imbalance(n_neg: usize, n_pos: usize, path: &Path) -> Result<()> {
    let (width, height, margin) = (480usize, 360usize, 60usize);
    let chart_height = height - 2 * margin;
    let max_count = n_neg.max(n_pos).max(1);

    let mut svg = svg_header(width, height, "Target Class Imbalance (Before SMOTE)");
    svg.push_str(&axes(margin, width, height));

    let bar_width = 120usize;
    for (i, (count, label, fill)) in [
        (n_neg, "neg (Normal)", BAR_FILL_ALT),
        (n_pos, "pos (Failure)", BAR_FILL),
    ]
    .iter()
    .enumerate()
    {
        let x = margin + 40 + i * (bar_width + 80);
        let bar_height =
            ((*count as f64 / max_count as f64) * chart_height as f64).round() as usize;
        let y = height - margin - bar_height;
        svg.push_str(&format!(
            r##"  <rect x="{x}" y="{y}" width="{bar_width}" height="{bar_height}" fill="{fill}" opacity="0.85"/>
  <text x="{cx}" y="{ly}" text-anchor="middle" font-size="12" fill="{MUTED_COLOR}">{label}</text>
  <text x="{cx}" y="{vy}" text-anchor="middle" font-size="12" fill="{TEXT_COLOR}">{count}</text>
"##,
            cx = x + bar_width / 2,
            ly = height - margin + 20,
            vy = y.saturating_sub(6),
        ));
    }

    svg.push_str("</svg>\n");
    fs::write(path, svg)?;
    Ok(())
}

/// Missing-data ranking: horizontal bars for the worst `top_n` columns by
/// percentage missing. The caller skips this chart when nothing is missing.
pub fn render_missing_data(report: &MissingReport, top_n: usize, path: &Path) -> Result<()> {
    let rows = report.head(top_n);
    let (width, margin, row_height) = (680usize, 60usize, 22usize);
    let height = 2 * margin + rows.len().max(1) * row_height;
    let chart_width = width - 2 * margin - 120;
    let max_pct = rows.iter().map(|(_, p)| *p).fold(1.0f64, f64::max);

    let mut svg = svg_header(
        width,
        height,
        "Features by Percentage of Missing Data (Before Imputation)",
    );

    for (i, (name, pct)) in rows.iter().enumerate() {
        let y = margin + i * row_height;
        let bar_width = ((pct / max_pct) * chart_width as f64).round() as usize;
        svg.push_str(&format!(
            r##"  <text x="{lx}" y="{ty}" text-anchor="end" font-size="11" fill="{MUTED_COLOR}">{name}</text>
  <rect x="{bx}" y="{y}" width="{bar_width}" height="{bh}" fill="{BAR_FILL}" opacity="0.8"/>
  <text x="{vx}" y="{ty}" font-size="11" fill="{TEXT_COLOR}">{pct:.1}%</text>
"##,
            lx = margin + 90,
            bx = margin + 100,
            ty = y + 13,
            bh = row_height - 6,
            vx = margin + 104 + bar_width,
        ));
    }

    svg.push_str("</svg>\n");
    fs::write(path, svg)?;
    Ok(())
}

/// Scatter of the synthesized fleet locations, longitude against latitude.
pub fn render_geo_scatter(points: &[(f64, f64)], path: &Path) -> Result<()> {
    let (width, height, margin) = (560usize, 560usize, 60usize);
    let chart = (width - 2 * margin) as f64;

    let (mut lon_min, mut lon_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut lat_min, mut lat_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(lon, lat) in points {
        lon_min = lon_min.min(lon);
        lon_max = lon_max.max(lon);
        lat_min = lat_min.min(lat);
        lat_max = lat_max.max(lat);
    }
    let lon_span = (lon_max - lon_min).max(1e-9);
    let lat_span = (lat_max - lat_min).max(1e-9);

    let mut svg = svg_header(width, height, "Simulated Fleet Location Distribution");
    svg.push_str(&axes(margin, width, height));
    svg.push_str(&format!(
        r##"  <text x="{cx}" y="{by}" text-anchor="middle" font-size="12" fill="{MUTED_COLOR}">Longitude</text>
  <text x="18" y="{cy}" text-anchor="middle" font-size="12" fill="{MUTED_COLOR}" transform="rotate(-90, 18, {cy})">Latitude</text>
"##,
        cx = width / 2,
        by = height - 14,
        cy = height / 2,
    ));

    for &(lon, lat) in points {
        let x = margin as f64 + (lon - lon_min) / lon_span * chart;
        // SVG y grows downward; latitude grows upward
        let y = (height - margin) as f64 - (lat - lat_min) / lat_span * chart;
        svg.push_str(&format!(
            r##"  <circle cx="{x:.1}" cy="{y:.1}" r="1.5" fill="{BAR_FILL_ALT}" opacity="0.15"/>
"##,
        ));
    }

    svg.push_str("</svg>\n");
    fs::write(path, svg)?;
    Ok(())
}

/// Feature-importance ranking: horizontal bars for the `top_n` features
/// with the highest split counts.
pub fn render_feature_importance(
    names: &[String],
    importances: &[f64],
    top_n: usize,
    path: &Path,
) -> Result<()> {
    let mut ranked: Vec<(&str, f64)> = names
        .iter()
        .map(String::as_str)
        .zip(importances.iter().copied())
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(top_n);

    let (width, margin, row_height) = (680usize, 60usize, 22usize);
    let height = 2 * margin + ranked.len().max(1) * row_height;
    let chart_width = width - 2 * margin - 120;
    let max_importance = ranked.iter().map(|(_, v)| *v).fold(1.0f64, f64::max);

    let mut svg = svg_header(width, height, "Top Feature Importances");

    for (i, (name, value)) in ranked.iter().enumerate() {
        let y = margin + i * row_height;
        let bar_width = ((value / max_importance) * chart_width as f64).round() as usize;
        svg.push_str(&format!(
            r##"  <text x="{lx}" y="{ty}" text-anchor="end" font-size="11" fill="{MUTED_COLOR}">{name}</text>
  <rect x="{bx}" y="{y}" width="{bar_width}" height="{bh}" fill="{BAR_FILL_ALT}" opacity="0.8"/>
  <text x="{vx}" y="{ty}" font-size="11" fill="{TEXT_COLOR}">{value:.0}</text>
"##,
            lx = margin + 90,
            bx = margin + 100,
            ty = y + 13,
            bh = row_height - 6,
            vx = margin + 104 + bar_width,
        ));
    }

    svg.push_str("</svg>\n");
    fs::write(path, svg)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_class_imbalance_chart_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("target_imbalance.svg");
        render_class_imbalance(59000, 1000, &path).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("neg (Normal)"));
        assert!(svg.contains("pos (Failure)"));
        assert!(svg.contains("59000"));
    }

    #[test]
    fn test_missing_data_chart_limits_rows() {
        let report = MissingReport {
            columns: (0..30)
                .map(|i| (format!("s{i}"), 100.0 - i as f64))
                .collect(),
        };
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing_data_head.svg");
        render_missing_data(&report, 20, &path).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("s0"));
        assert!(svg.contains("s19"));
        assert!(!svg.contains(">s20<"));
    }

    #[test]
    fn test_geo_scatter_marks_every_point() {
        let points: Vec<(f64, f64)> = (0..25)
            .map(|i| (-87.6 + i as f64 * 0.01, 41.8 + i as f64 * 0.01))
            .collect();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geo_distribution.svg");
        render_geo_scatter(&points, &path).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert_eq!(svg.matches("<circle").count(), 25);
    }

    #[test]
    fn test_feature_importance_sorted_and_truncated() {
        let names: Vec<String> = (0..25).map(|i| format!("s{i}")).collect();
        let importances: Vec<f64> = (0..25).map(|i| i as f64).collect();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feature_importance.svg");
        render_feature_importance(&names, &importances, 20, &path).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        // Highest-importance feature present, lowest five dropped
        assert!(svg.contains(">s24<"));
        assert!(!svg.contains(">s0<"));
        assert_eq!(svg.matches("<rect").count(), 20);
    }
}
