//! SVG and HTML output.
//!
//! The SVG carries one `path.county` per region with `data-fips`,
//! `data-education` and `data-tooltip` attributes, plus a `#legend` group
//! whose swatches mirror the color scale bucket for bucket. The HTML page
//! wraps the same SVG and adds a floating `#tooltip` driven by a few lines
//! of script.

use std::fmt::Write;
use std::path::Path;

use clap::ValueEnum;

use crate::classify::hex;
use crate::pipeline::{ChoroplethMap, Region};
use crate::projection::format_number;

const SWATCH_WIDTH: f64 = 40.0;
const SWATCH_HEIGHT: f64 = 20.0;
const SWATCH_SPACING: f64 = 50.0;
const LABEL_OFFSET_Y: f64 = 35.0;

const TOOLTIP_SCRIPT: &str = r##"(function () {
  var tooltip = document.getElementById("tooltip");
  document.querySelectorAll("#root .county").forEach(function (county) {
    county.addEventListener("mouseover", function (event) {
      tooltip.textContent = county.getAttribute("data-tooltip");
      tooltip.setAttribute("data-education", county.getAttribute("data-education"));
      tooltip.style.left = event.pageX + 10 + "px";
      tooltip.style.top = event.pageY - 28 + "px";
      tooltip.style.visibility = "visible";
    });
    county.addEventListener("mouseout", function () {
      tooltip.style.visibility = "hidden";
    });
  });
})();"##;

/// Document kinds the renderer can produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Svg,
    Html,
}

impl OutputFormat {
    /// Guesses the format from a file extension.
    pub fn from_path(path: &str) -> Option<Self> {
        match Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("svg") => Some(Self::Svg),
            Some("html") | Some("htm") => Some(Self::Html),
            _ => None,
        }
    }
}

/// Escapes text for use in XML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Hover text for a region.
pub fn tooltip_text(region: &Region) -> String {
    match (&region.record.education, region.record.id()) {
        (Some(education), _) => education.tooltip(),
        (None, Some(id)) => format!("No data for FIPS {id}"),
        (None, None) => "No data".to_string(),
    }
}

pub fn render(map: &ChoroplethMap, format: OutputFormat) -> String {
    match format {
        OutputFormat::Svg => render_svg(map),
        OutputFormat::Html => render_html(map),
    }
}

/// Standalone SVG. Tooltips use native `<title>` elements.
pub fn render_svg(map: &ChoroplethMap) -> String {
    svg_document(map, true)
}

/// HTML page embedding the SVG with a scripted tooltip.
pub fn render_html(map: &ChoroplethMap) -> String {
    let title = map
        .config
        .title
        .as_deref()
        .unwrap_or("Educational attainment by county");

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape(title));
    out.push_str(
        "<style>\n\
         body { font-family: sans-serif; }\n\
         #tooltip { position: absolute; visibility: hidden; padding: 6px 8px; \
         background: rgba(255, 255, 255, 0.95); border: 1px solid #999; \
         border-radius: 4px; font-size: 12px; pointer-events: none; }\n\
         </style>\n</head>\n<body>\n<div id=\"root\">\n",
    );
    out.push_str(&svg_document(map, false));
    out.push_str("</div>\n<div id=\"tooltip\"></div>\n<script>\n");
    out.push_str(TOOLTIP_SCRIPT);
    out.push_str("\n</script>\n</body>\n</html>\n");
    out
}

fn svg_document(map: &ChoroplethMap, native_titles: bool) -> String {
    let canvas = &map.config.canvas;
    let (w, h) = (format_number(canvas.width), format_number(canvas.height));

    let mut out = String::new();
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
    );
    out.push_str(
        "<style>.county { stroke: #fff; stroke-width: 0.25; } \
         .county:hover { stroke: #333; stroke-width: 1; }</style>\n",
    );

    let center = format_number(canvas.width / 2.0);
    if let Some(title) = &map.config.title {
        let _ = writeln!(
            out,
            "<text id=\"title\" x=\"{center}\" y=\"{}\" text-anchor=\"middle\" style=\"font-size: 24px;\">{}</text>",
            format_number(canvas.padding),
            escape(title)
        );
    }
    if let Some(description) = &map.config.description {
        let _ = writeln!(
            out,
            "<text id=\"description\" x=\"{center}\" y=\"{}\" text-anchor=\"middle\" style=\"font-size: 14px; fill: #444;\">{}</text>",
            format_number(canvas.padding + 22.0),
            escape(description)
        );
    }

    out.push_str("<g id=\"counties\">\n");
    for region in &map.regions {
        write_region(&mut out, map, region, native_titles);
    }
    out.push_str("</g>\n");

    write_legend(&mut out, map);
    out.push_str("</svg>\n");
    out
}

fn write_region(out: &mut String, map: &ChoroplethMap, region: &Region, native_titles: bool) {
    let fips = region
        .record
        .id()
        .map(|id| id.to_string())
        .unwrap_or_default();
    let education = region.record.percentage().unwrap_or(0.0);
    let tooltip = escape(&tooltip_text(region));

    let _ = write!(
        out,
        "<path class=\"county\" d=\"{}\" fill=\"{}\" data-fips=\"{fips}\" data-education=\"{education}\" data-tooltip=\"{tooltip}\"",
        region.path,
        hex(map.scale.color(region.bucket)),
    );
    if native_titles {
        let _ = writeln!(out, "><title>{tooltip}</title></path>");
    } else {
        out.push_str("/>\n");
    }
}

fn write_legend(out: &mut String, map: &ChoroplethMap) {
    let canvas = &map.config.canvas;
    let _ = writeln!(
        out,
        "<g id=\"legend\" transform=\"translate({}, {})\">",
        format_number(canvas.padding),
        format_number(canvas.height - canvas.padding)
    );
    for (i, entry) in map.legend().iter().enumerate() {
        let x = i as f64 * SWATCH_SPACING;
        let _ = writeln!(
            out,
            "<rect x=\"{}\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            format_number(x),
            format_number(SWATCH_WIDTH),
            format_number(SWATCH_HEIGHT),
            hex(entry.color)
        );
        let _ = writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" style=\"font-size: 12px; fill: #666;\">{}</text>",
            format_number(x + SWATCH_WIDTH / 2.0),
            format_number(LABEL_OFFSET_Y),
            escape(&entry.label)
        );
    }
    out.push_str("</g>\n");
}
