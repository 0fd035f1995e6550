//! ROC plot rendered as a standalone SVG document

use crate::error::Result;
use crate::evaluation::RocEntry;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Line colours, cycled per curve
pub const PALETTE: [&str; 4] = ["black", "orange", "blue", "green"];

/// SVG dash patterns for dotted, dashed, dash-dot and solid lines
pub const LINE_STYLES: [Option<&str>; 4] = [Some("2,3"), Some("7,4"), Some("7,3,2,3"), None];

/// Plot layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocPlotConfig {
    /// Image width in pixels
    pub width: f64,
    /// Image height in pixels
    pub height: f64,
    /// Space left around the axes for ticks and labels
    pub margin: f64,
    /// Lower axis limit, shared by both axes
    pub lower: f64,
    /// Upper axis limit, shared by both axes
    pub upper: f64,
}

impl Default for RocPlotConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            margin: 60.0,
            lower: -0.1,
            upper: 1.1,
        }
    }
}

/// Draws every ROC curve on one shared set of axes
#[derive(Debug, Clone, Default)]
pub struct RocPlot {
    config: RocPlotConfig,
}

impl RocPlot {
    pub fn new(config: RocPlotConfig) -> Self {
        Self { config }
    }

    fn px(&self, x: f64) -> f64 {
        let c = &self.config;
        c.margin + (x - c.lower) / (c.upper - c.lower) * (c.width - 2.0 * c.margin)
    }

    fn py(&self, y: f64) -> f64 {
        let c = &self.config;
        c.height - c.margin - (y - c.lower) / (c.upper - c.lower) * (c.height - 2.0 * c.margin)
    }

    /// Render the curves to an SVG string
    pub fn render(&self, entries: &[RocEntry]) -> String {
        let c = &self.config;
        let mut svg = String::new();

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = c.width,
            h = c.height
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

        // Grid and ticks
        let (left, right) = (self.px(c.lower), self.px(c.upper));
        let (top, bottom) = (self.py(c.upper), self.py(c.lower));
        for tick in (0..=5).map(|i| i as f64 * 0.2) {
            let (x, y) = (self.px(tick), self.py(tick));
            let _ = writeln!(
                svg,
                r##"<line x1="{x:.2}" y1="{top:.2}" x2="{x:.2}" y2="{bottom:.2}" stroke="#b0b0b0" stroke-width="0.8"/>"##
            );
            let _ = writeln!(
                svg,
                r##"<line x1="{left:.2}" y1="{y:.2}" x2="{right:.2}" y2="{y:.2}" stroke="#b0b0b0" stroke-width="0.8"/>"##
            );
            let _ = writeln!(
                svg,
                r#"<text x="{x:.2}" y="{:.2}" font-size="11" text-anchor="middle">{tick:.1}</text>"#,
                bottom + 16.0
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" font-size="11" text-anchor="end">{tick:.1}</text>"#,
                left - 6.0,
                y + 4.0
            );
        }
        let _ = writeln!(
            svg,
            r#"<rect x="{left:.2}" y="{top:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="black"/>"#,
            right - left,
            bottom - top
        );

        // Chance line
        let _ = writeln!(
            svg,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="gray" stroke-width="2" stroke-dasharray="7,4"/>"#,
            self.px(0.0),
            self.py(0.0),
            self.px(1.0),
            self.py(1.0)
        );

        for (i, entry) in entries.iter().enumerate() {
            let points: Vec<String> = entry
                .curve
                .fpr
                .iter()
                .zip(entry.curve.tpr.iter())
                .map(|(&x, &y)| format!("{:.2},{:.2}", self.px(x), self.py(y)))
                .collect();
            let dash = LINE_STYLES[i % LINE_STYLES.len()]
                .map(|d| format!(r#" stroke-dasharray="{}""#, d))
                .unwrap_or_default();
            let _ = writeln!(
                svg,
                r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="1.5"{}/>"#,
                points.join(" "),
                PALETTE[i % PALETTE.len()],
                dash
            );
        }

        self.render_legend(&mut svg, entries, right, bottom);

        let _ = writeln!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" font-size="13" text-anchor="middle">False Positive Rate</text>"#,
            (left + right) / 2.0,
            c.height - 15.0
        );
        let _ = writeln!(
            svg,
            r#"<text x="15" y="{y:.2}" font-size="13" text-anchor="middle" transform="rotate(-90 15 {y:.2})">True Positive Rate</text>"#,
            y = (top + bottom) / 2.0
        );
        svg.push_str("</svg>\n");
        svg
    }

    // Anchored to the lower-right corner of the axes
    fn render_legend(&self, svg: &mut String, entries: &[RocEntry], right: f64, bottom: f64) {
        if entries.is_empty() {
            return;
        }
        let labels: Vec<String> = entries
            .iter()
            .map(|e| escape_xml(&format!("{} (auc = {:.2})", e.label, e.auc)))
            .collect();
        let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f64;
        let width = 40.0 + longest * 6.5;
        let height = 8.0 + 18.0 * entries.len() as f64;
        let (x0, y0) = (right - width - 10.0, bottom - height - 10.0);

        let _ = writeln!(
            svg,
            r##"<rect x="{x0:.2}" y="{y0:.2}" width="{width:.2}" height="{height:.2}" fill="white" stroke="#cccccc"/>"##
        );
        for (i, label) in labels.iter().enumerate() {
            let y = y0 + 16.0 + 18.0 * i as f64;
            let dash = LINE_STYLES[i % LINE_STYLES.len()]
                .map(|d| format!(r#" stroke-dasharray="{}""#, d))
                .unwrap_or_default();
            let _ = writeln!(
                svg,
                r#"<line x1="{:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="{}" stroke-width="1.5"{}/>"#,
                x0 + 6.0,
                x0 + 30.0,
                PALETTE[i % PALETTE.len()],
                dash
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" font-size="11">{}</text>"#,
                x0 + 36.0,
                y + 4.0,
                label
            );
        }
    }

    /// Render and write the plot, creating parent directories as needed
    pub fn save(&self, entries: &[RocEntry], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render(entries))?;
        tracing::info!(path = %path.display(), curves = entries.len(), "ROC plot saved");
        Ok(())
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::RocCurve;
    use crate::training::CVResults;

    fn entry(label: &str, auc: f64) -> RocEntry {
        RocEntry {
            label: label.to_string(),
            cv_auc: CVResults::from_scores(vec![auc]),
            curve: RocCurve {
                fpr: vec![0.0, 0.0, 1.0],
                tpr: vec![0.0, 1.0, 1.0],
                thresholds: vec![f64::INFINITY, 0.5, 0.1],
            },
            auc,
        }
    }

    #[test]
    fn test_render_one_polyline_per_curve() {
        let entries = vec![entry("Random Forest", 1.0), entry("SVC", 0.75)];
        let svg = RocPlot::default().render(&entries);

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("Random Forest (auc = 1.00)"));
        assert!(svg.contains("SVC (auc = 0.75)"));
        assert!(svg.contains(r#"stroke="black""#));
        assert!(svg.contains(r#"stroke="orange""#));
        assert!(svg.contains("False Positive Rate"));
        assert!(svg.contains("True Positive Rate"));
    }

    #[test]
    fn test_axis_limits_map_to_plot_area() {
        let plot = RocPlot::default();
        assert!((plot.px(-0.1) - 60.0).abs() < 1e-9);
        assert!((plot.px(1.1) - 580.0).abs() < 1e-9);
        assert!((plot.py(-0.1) - 420.0).abs() < 1e-9);
        assert!((plot.py(1.1) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_labels_are_escaped() {
        let svg = RocPlot::default().render(&[entry("a<b>&c", 0.5)]);
        assert!(svg.contains("a&lt;b&gt;&amp;c"));
    }

    #[test]
    fn test_save_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots").join("roc.svg");
        RocPlot::default().save(&[entry("RVC", 0.9)], &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("RVC (auc = 0.90)"));
    }
}
