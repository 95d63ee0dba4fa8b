//! SVG rendering of evolution series.

use std::path::Path;

use plotters::prelude::*;

use crate::config::PlotOptions;
use crate::error::{DatabaseError, DatabaseResult};
use crate::series::EvolutionSeries;

fn plot_err(e: impl std::fmt::Display) -> DatabaseError {
    DatabaseError::Plot {
        message: e.to_string(),
    }
}

/// Widens a degenerate or tight range by 5% on each side.
fn padded(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    let pad = if span > 0.0 {
        span * 0.05
    } else if lo != 0.0 {
        lo.abs() * 0.05
    } else {
        1.0
    };
    (lo - pad, hi + pad)
}

/// Draws `series` as a line plot and writes it to `output` as SVG.
///
/// Points with a non-finite coordinate are left out.
///
/// # Errors
/// [`DatabaseError::Plot`] if the series has no finite point or the file
/// cannot be written.
pub fn render_svg(series: &EvolutionSeries, output: &Path, options: &PlotOptions) -> DatabaseResult<()> {
    let ((x0, x1), (y0, y1)) = series
        .bounds()
        .ok_or_else(|| plot_err(format!("'{}' has no finite values to plot", series.property)))?;
    let (x0, x1) = padded(x0, x1);
    let (y0, y1) = padded(y0, y1);
    let points: Vec<(f64, f64)> = series
        .points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();

    let title = options
        .title
        .clone()
        .unwrap_or_else(|| format!("{} vs {}", series.property, series.time.label()));

    let root = SVGBackend::new(output, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22).into_font())
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(series.time.label())
        .y_desc(series.property.as_str())
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
        .map_err(plot_err)?;
    if options.markers {
        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 3, BLUE.filled())))
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    tracing::debug!(
        path = %output.display(),
        points = points.len(),
        "Wrote evolution plot"
    );
    Ok(())
}
