//! HTML report generation for run records.
//!
//! Generate self-contained HTML files with embedded
//! [Plotly.js](https://plotly.com/javascript/) charts for offline inspection
//! of a benchmark run. No feature flag is required; this module is always
//! available.
//!
//! # Charts included
//!
//! | Chart | Description |
//! |---|---|
//! | **Loss history** | Loss vs step with best-so-far line |
//! | **Scalar series** | One line chart per additional logged scalar |
//! | **Reference images** | One-off inputs and known solutions |
//! | **Frame series** | First, best-step and last frame of each image series |
//!
//! Single-channel images render as heatmaps, three-channel ones as RGB
//! image traces.
//!
//! # Usage
//!
//! ```no_run
//! use lossbench::optim::Adam;
//! use lossbench::prelude::*;
//! use lossbench::report::generate_html_report;
//!
//! let mut bench = Sphere::randn(16, 0);
//! let mut opt = Adam::new(0.05);
//! run(&mut bench, &mut opt, 200)?;
//! generate_html_report(bench.state().record(), bench.name(), "report.html")?;
//! # Ok::<(), lossbench::Error>(())
//! ```
//!
//! The output is a single HTML file that can be opened in any browser.
//! An internet connection is needed on first load to fetch `Plotly.js`
//! from a CDN.

use core::fmt::Write as _;
use std::path::Path;

use crate::error::Result;
use crate::image::Image;
use crate::record::RunRecord;

/// Generate an HTML report with interactive Plotly.js charts.
///
/// Create a self-contained HTML file at `path` with the loss history, every
/// additional logged scalar, the reference images, and the first/best/last
/// frame of each logged image series. Sections with no data are omitted.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created or written.
pub fn generate_html_report(
    record: &RunRecord,
    title: &str,
    path: impl AsRef<Path>,
) -> Result<()> {
    let html = build_html(record, title);
    std::fs::write(path, html)?;
    Ok(())
}

fn build_html(record: &RunRecord, title: &str) -> String {
    let mut html = String::with_capacity(8192);

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} &middot; Benchmark Report</title>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
         background: #f5f6fa; color: #2c3e50; padding: 24px; }}
  h1 {{ text-align: center; margin-bottom: 8px; font-size: 1.8em; }}
  .subtitle {{ text-align: center; color: #7f8c8d; margin-bottom: 24px; }}
  .chart {{ background: #fff; border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,0.08);
            margin-bottom: 24px; padding: 16px; }}
  .chart-title {{ font-size: 1.1em; font-weight: 600; margin-bottom: 8px; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p class="subtitle">{n} evaluations</p>
"#,
        title = escape_html(title),
        n = record.num_evals(),
    );

    // Loss history with best-so-far line.
    if !record.loss_history().is_empty() {
        html.push_str("<div class=\"chart\"><div class=\"chart-title\">Loss History</div><div id=\"loss\"></div></div>\n");
        write_loss_chart(&mut html, record);
    }

    // One chart per remaining scalar series.
    for name in record.scalar_names() {
        if name == crate::record::LOSS_KEY {
            continue;
        }
        if let Some(series) = record.scalar(name) {
            let div = div_id("scalar", name);
            let _ = write!(
                html,
                "<div class=\"chart\"><div class=\"chart-title\">{}</div><div id=\"{div}\"></div></div>\n",
                escape_html(name),
            );
            write_scalar_chart(&mut html, &div, name, series);
        }
    }

    // Reference images.
    for (name, image) in record.reference_images() {
        let div = div_id("ref", name);
        let _ = write!(
            html,
            "<div class=\"chart\"><div class=\"chart-title\">{}</div><div id=\"{div}\"></div></div>\n",
            escape_html(name),
        );
        write_image_chart(&mut html, &div, image);
    }

    // First, best-step and last frame of each series.
    let names: Vec<String> = record.image_names().map(str::to_string).collect();
    for name in names {
        if let Some(series) = record.image_series(&name) {
            let picks = frame_picks(record, &name, series);
            for (label, step, image) in picks {
                let div = div_id("frame", &format!("{name} {label}"));
                let _ = write!(
                    html,
                    "<div class=\"chart\"><div class=\"chart-title\">{} &middot; {label} (step {step})</div><div id=\"{div}\"></div></div>\n",
                    escape_html(&name),
                );
                write_image_chart(&mut html, &div, image);
            }
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// First, best-step and last frame of a series, deduplicated.
fn frame_picks<'a>(
    record: &'a RunRecord,
    name: &str,
    series: &'a [(u64, Image)],
) -> Vec<(&'static str, u64, &'a Image)> {
    let mut picks: Vec<(&'static str, u64, &Image)> = Vec::with_capacity(3);
    if let Some((step, image)) = series.first() {
        picks.push(("first", *step, image));
    }
    if let (Ok(best), Some(image)) = (record.best(), record.frame_at_best(name)) {
        if picks.iter().all(|(_, step, _)| *step != best.step) {
            picks.push(("best", best.step, image));
        }
    }
    if let Some((step, image)) = series.last() {
        if picks.iter().all(|(_, s, _)| s != step) {
            picks.push(("last", *step, image));
        }
    }
    picks
}

// ---------------------------------------------------------------------------
// Chart generators
// ---------------------------------------------------------------------------

fn write_loss_chart(html: &mut String, record: &RunRecord) {
    let history = record.loss_history();
    let steps: Vec<u64> = history.iter().map(|(s, _)| *s).collect();
    let vals: Vec<f64> = history.iter().map(|(_, v)| *v).collect();

    let mut best_vals = Vec::with_capacity(vals.len());
    let mut best = f64::INFINITY;
    for &v in &vals {
        if v.is_finite() && v < best {
            best = v;
        }
        best_vals.push(best);
    }

    let _ = write!(
        html,
        r##"<script>
Plotly.newPlot("loss", [
  {{ x: {steps:?}, y: {vals}, mode: "lines", name: "Loss", type: "scatter",
     line: {{ color: "#3498db", width: 1 }} }},
  {{ x: {steps:?}, y: {best_vals}, mode: "lines", name: "Best so far", type: "scatter",
     line: {{ color: "#e74c3c", width: 2 }} }}
], {{ xaxis: {{ title: "Step" }}, yaxis: {{ title: "Loss" }},
     margin: {{ t: 10 }}, legend: {{ x: 1, xanchor: "right", y: 1 }} }},
   {{ responsive: true }});
</script>
"##,
        vals = js_num_array(&vals),
        best_vals = js_num_array(&best_vals),
    );
}

fn write_scalar_chart(html: &mut String, div: &str, name: &str, series: &[(u64, f64)]) {
    let steps: Vec<u64> = series.iter().map(|(s, _)| *s).collect();
    let vals: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    let _ = write!(
        html,
        r##"<script>
Plotly.newPlot("{div}", [
  {{ x: {steps:?}, y: {vals}, mode: "lines", name: "{name}", type: "scatter",
     line: {{ color: "#2ecc71", width: 1 }} }}
], {{ xaxis: {{ title: "Step" }}, yaxis: {{ title: "{name}" }}, margin: {{ t: 10 }} }},
   {{ responsive: true }});
</script>
"##,
        vals = js_num_array(&vals),
        name = escape_js(name),
    );
}

fn write_image_chart(html: &mut String, div: &str, image: &Image) {
    if image.channels() == 3 {
        write_rgb_chart(html, div, image);
    } else {
        write_heatmap_chart(html, div, image);
    }
}

fn write_heatmap_chart(html: &mut String, div: &str, image: &Image) {
    let mut z = String::from("[");
    for r in 0..image.rows() {
        z.push('[');
        for c in 0..image.cols() {
            let _ = write!(z, "{},", js_num(image.get(0, r, c)));
        }
        z.push_str("],");
    }
    z.push(']');

    let _ = write!(
        html,
        r##"<script>
Plotly.newPlot("{div}", [
  {{ z: {z}, type: "heatmap", colorscale: "Greys", reversescale: true }}
], {{ yaxis: {{ autorange: "reversed", scaleanchor: "x" }}, margin: {{ t: 10 }} }},
   {{ responsive: true }});
</script>
"##,
    );
}

fn write_rgb_chart(html: &mut String, div: &str, image: &Image) {
    let bytes = image.to_uint8();
    let (rows, cols) = (image.rows(), image.cols());
    let plane = rows * cols;

    let mut z = String::from("[");
    for r in 0..rows {
        z.push('[');
        for c in 0..cols {
            let i = r * cols + c;
            let _ = write!(
                z,
                "[{},{},{}],",
                bytes[i],
                bytes[plane + i],
                bytes[2 * plane + i]
            );
        }
        z.push_str("],");
    }
    z.push(']');

    let _ = write!(
        html,
        r##"<script>
Plotly.newPlot("{div}", [
  {{ z: {z}, type: "image" }}
], {{ margin: {{ t: 10 }} }}, {{ responsive: true }});
</script>
"##,
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A number Plotly can parse: NaN and infinities become null.
fn js_num(v: f64) -> String {
    if v.is_finite() {
        format!("{v}")
    } else {
        String::from("null")
    }
}

/// A JS array literal with every element routed through [`js_num`].
fn js_num_array(vals: &[f64]) -> String {
    let mut out = String::from("[");
    for v in vals {
        out.push_str(&js_num(*v));
        out.push(',');
    }
    out.push(']');
    out
}

/// Stable element id derived from a chart name.
///
/// Alphanumeric characters pass through; anything else becomes `_` plus its
/// two-digit hex code, so distinct names never collide on the same id.
fn div_id(prefix: &str, name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else {
            let _ = write!(slug, "_{:02x}", u32::from(c));
        }
    }
    format!("{prefix}_{slug}")
}

fn escape_js(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
