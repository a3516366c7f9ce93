//! SVG Chart Generator
//!
//! Renders line charts as standalone SVG documents. Every report chart goes
//! through [`LineChart`], so styling stays consistent across the chart set.

use std::fs;
use std::path::Path;

use crate::utils::error::Result;

/// Chart styling constants
const CHART_WIDTH: f64 = 900.0;
const CHART_HEIGHT: f64 = 500.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 80.0;
const MARGIN_LEFT: f64 = 90.0;

const COLOR_GRID: &str = "#ecf0f1";
const COLOR_AXIS: &str = "#2c3e50";
const COLOR_TEXT: &str = "#2c3e50";

/// Series colors, cycled in series order
const PALETTE: [&str; 8] = [
    "#3498db", "#2ecc71", "#e74c3c", "#9b59b6", "#f39c12", "#1abc9c", "#34495e", "#e67e22",
];

/// Number of grid intervals on automatic axes
const GRID_STEPS: usize = 5;

/// A data point for a line chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

impl DataPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A named data series; color is assigned from the palette at render time
#[derive(Debug, Clone)]
pub struct DataSeries {
    pub name: String,
    pub points: Vec<DataPoint>,
}

impl DataSeries {
    pub fn new(name: impl Into<String>, points: Vec<DataPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

/// Horizontal axis scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XScale {
    #[default]
    Linear,
    /// Base-10 logarithmic; points with `x <= 0` are not drawn
    Log10,
}

/// An explicit axis tick
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

/// A line chart description
#[derive(Debug, Clone, Default)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<DataSeries>,
    pub x_scale: XScale,
    /// Replaces the automatic x ticks when set
    pub x_ticks: Option<Vec<Tick>>,
    /// Draw a circle on every data point
    pub markers: bool,
}

/// Data extents after scale transformation
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl LineChart {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            ..Self::default()
        }
    }

    pub fn with_series(mut self, series: Vec<DataSeries>) -> Self {
        self.series = series;
        self
    }

    pub fn with_x_scale(mut self, scale: XScale) -> Self {
        self.x_scale = scale;
        self
    }

    pub fn with_x_ticks(mut self, ticks: Vec<Tick>) -> Self {
        self.x_ticks = Some(ticks);
        self
    }

    pub fn with_markers(mut self, markers: bool) -> Self {
        self.markers = markers;
        self
    }

    /// Map a data x into scale space, `None` when not drawable
    fn scale_x(&self, x: f64) -> Option<f64> {
        if !x.is_finite() {
            return None;
        }
        match self.x_scale {
            XScale::Linear => Some(x),
            XScale::Log10 if x > 0.0 => Some(x.log10()),
            XScale::Log10 => None,
        }
    }

    /// Drawable points of a series in scale space
    fn visible_points<'a>(&'a self, series: &'a DataSeries) -> impl Iterator<Item = (f64, f64)> + 'a {
        series
            .points
            .iter()
            .filter(|p| p.y.is_finite())
            .filter_map(move |p| self.scale_x(p.x).map(|x| (x, p.y)))
    }

    fn bounds(&self) -> Bounds {
        let mut x_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;

        for s in &self.series {
            for (x, y) in self.visible_points(s) {
                x_min = x_min.min(x);
                x_max = x_max.max(x);
                y_min = y_min.min(y);
                y_max = y_max.max(y);
            }
        }

        if let Some(ticks) = &self.x_ticks {
            for t in ticks {
                if let Some(x) = self.scale_x(t.value) {
                    x_min = x_min.min(x);
                    x_max = x_max.max(x);
                }
            }
        }

        let (x_min, x_max) = widen(x_min, x_max, 0.0);
        let (y_min, y_max) = widen(y_min, y_max, 0.05);

        Bounds {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    fn x_tick_marks(&self, b: &Bounds) -> Vec<(f64, String)> {
        if let Some(ticks) = &self.x_ticks {
            return ticks
                .iter()
                .filter_map(|t| self.scale_x(t.value).map(|x| (x, t.label.clone())))
                .filter(|(x, _)| *x >= b.x_min && *x <= b.x_max)
                .collect();
        }

        match self.x_scale {
            XScale::Linear => even_ticks(b.x_min, b.x_max),
            XScale::Log10 => {
                let decades: Vec<(f64, String)> = (b.x_min.ceil() as i32..=b.x_max.floor() as i32)
                    .map(|e| (e as f64, format!("{}", 10f64.powi(e))))
                    .collect();
                if decades.len() >= 2 {
                    decades
                } else {
                    (0..=GRID_STEPS)
                        .map(|i| {
                            let v = b.x_min + (i as f64 / GRID_STEPS as f64) * (b.x_max - b.x_min);
                            let raw = 10f64.powf(v);
                            (v, format_value(raw, raw))
                        })
                        .collect()
                }
            }
        }
    }

    /// Render the chart to an SVG document
    pub fn render(&self) -> String {
        let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let b = self.bounds();

        let px = |x: f64| MARGIN_LEFT + ((x - b.x_min) / (b.x_max - b.x_min)) * plot_width;
        let py = |y: f64| MARGIN_TOP + plot_height - ((y - b.y_min) / (b.y_max - b.y_min)) * plot_height;

        let mut svg = String::new();

        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">"#,
            CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
        ));
        svg.push_str(&format!(
            r#"<rect width="{}" height="{}" fill="white"/>"#,
            CHART_WIDTH, CHART_HEIGHT
        ));

        svg.push_str(&format!(
            r#"<text x="{}" y="35" text-anchor="middle" font-family="Arial, sans-serif" font-size="18" font-weight="bold" fill="{}">{}</text>"#,
            CHART_WIDTH / 2.0, COLOR_TEXT, escape_xml(&self.title)
        ));

        // Horizontal grid + y tick labels
        for (value, label) in even_ticks(b.y_min, b.y_max) {
            let y = py(value);
            svg.push_str(&format!(
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1"/>"#,
                MARGIN_LEFT, y, MARGIN_LEFT + plot_width, y, COLOR_GRID
            ));
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" text-anchor="end" font-family="Arial, sans-serif" font-size="12" fill="{}">{}</text>"#,
                MARGIN_LEFT - 10.0, y + 4.0, COLOR_TEXT, escape_xml(&label)
            ));
        }

        // Vertical grid + x tick labels
        for (value, label) in self.x_tick_marks(&b) {
            let x = px(value);
            svg.push_str(&format!(
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1"/>"#,
                x, MARGIN_TOP, x, MARGIN_TOP + plot_height, COLOR_GRID
            ));
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="11" fill="{}">{}</text>"#,
                x, MARGIN_TOP + plot_height + 20.0, COLOR_TEXT, escape_xml(&label)
            ));
        }

        // Axes
        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
            MARGIN_LEFT, MARGIN_TOP + plot_height, MARGIN_LEFT + plot_width, MARGIN_TOP + plot_height, COLOR_AXIS
        ));
        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"/>"#,
            MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, MARGIN_TOP + plot_height, COLOR_AXIS
        ));

        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}">{}</text>"#,
            MARGIN_LEFT + plot_width / 2.0, CHART_HEIGHT - 20.0, COLOR_TEXT, escape_xml(&self.x_label)
        ));
        svg.push_str(&format!(
            r#"<text x="20" y="{}" text-anchor="middle" font-family="Arial, sans-serif" font-size="14" fill="{}" transform="rotate(-90 20 {})">{}</text>"#,
            CHART_HEIGHT / 2.0, COLOR_TEXT, CHART_HEIGHT / 2.0, escape_xml(&self.y_label)
        ));

        for (idx, series) in self.series.iter().enumerate() {
            let color = series_color(idx);
            let points: Vec<(f64, f64)> = self
                .visible_points(series)
                .map(|(x, y)| (px(x), py(y)))
                .collect();
            if points.is_empty() {
                continue;
            }

            let mut path = String::new();
            for (i, (x, y)) in points.iter().enumerate() {
                if i == 0 {
                    path.push_str(&format!("M {:.2} {:.2}", x, y));
                } else {
                    path.push_str(&format!(" L {:.2} {:.2}", x, y));
                }
            }
            svg.push_str(&format!(
                r#"<path d="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
                path, color
            ));

            if self.markers || points.len() == 1 {
                for (x, y) in &points {
                    svg.push_str(&format!(
                        r#"<circle cx="{:.2}" cy="{:.2}" r="4" fill="{}" stroke="white" stroke-width="1.5"/>"#,
                        x, y, color
                    ));
                }
            }
        }

        // Legend
        let mut legend_y = MARGIN_TOP + 10.0;
        for (idx, series) in self.series.iter().enumerate() {
            svg.push_str(&format!(
                r#"<rect x="{}" y="{}" width="15" height="15" fill="{}"/>"#,
                CHART_WIDTH - MARGIN_RIGHT - 170.0, legend_y, series_color(idx)
            ));
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" font-family="Arial, sans-serif" font-size="12" fill="{}">{}</text>"#,
                CHART_WIDTH - MARGIN_RIGHT - 150.0, legend_y + 12.0, COLOR_TEXT, escape_xml(&series.name)
            ));
            legend_y += 22.0;
        }

        svg.push_str("</svg>");
        svg
    }

    /// Render and write the chart to `output_path`
    pub fn save(&self, output_path: &Path) -> Result<()> {
        fs::write(output_path, self.render())?;
        Ok(())
    }
}

fn series_color(idx: usize) -> &'static str {
    PALETTE[idx % PALETTE.len()]
}

/// Make a degenerate or empty range drawable and apply relative padding
fn widen(min: f64, max: f64, pad: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 0.5, max + 0.5);
    }
    let span = max - min;
    (min - span * pad, max + span * pad)
}

fn even_ticks(min: f64, max: f64) -> Vec<(f64, String)> {
    let span = max - min;
    (0..=GRID_STEPS)
        .map(|i| {
            let v = min + (i as f64 / GRID_STEPS as f64) * span;
            (v, format_value(v, span))
        })
        .collect()
}

/// Format a tick value with precision matched to the axis span
fn format_value(v: f64, span: f64) -> String {
    let span = span.abs();
    if span >= 10.0 {
        format!("{:.0}", v)
    } else if span >= 1.0 {
        format!("{:.1}", v)
    } else if span >= 0.1 {
        format!("{:.2}", v)
    } else {
        format!("{:.3}", v)
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
