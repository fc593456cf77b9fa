use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::report::stats::{CorrelationMatrix, Histogram};

/// 8x6 inches at 100 dpi.
const CORRELATION_SIZE: (u32, u32) = (800, 600);
/// 10x5 inches at 100 dpi.
const DISTRIBUTION_SIZE: (u32, u32) = (1000, 500);

/// A chart rasterized to packed RGB8 pixels.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RenderedChart {
    pub fn to_image(&self) -> eyre::Result<DynamicImage> {
        let buffer = RgbImage::from_raw(self.width, self.height, self.rgb.clone())
            .ok_or_else(|| eyre::eyre!("Chart buffer does not match {}x{}", self.width, self.height))?;
        Ok(DynamicImage::ImageRgb8(buffer))
    }

    pub fn to_png(&self) -> eyre::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.to_image()?
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .map_err(|e| eyre::eyre!("Failed to encode chart as PNG: {}", e))?;
        Ok(bytes)
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> eyre::Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_png()?)
            .map_err(|e| eyre::eyre!("Failed to write chart '{}': {}", path.display(), e))?;
        tracing::info!(path = %path.display(), "Chart saved");
        Ok(())
    }
}

/// Blue → light grey → red ramp over [-1, 1]; undefined cells are grey.
fn coolwarm(value: Option<f64>) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let Some(v) = value else {
        return RGBColor(200, 200, 200);
    };
    let v = v.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 {
        (NEUTRAL, COLD, -v)
    } else {
        (NEUTRAL, WARM, v)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

/// Annotated correlation heatmap.
pub fn render_correlation_heatmap(matrix: &CorrelationMatrix) -> eyre::Result<RenderedChart> {
    let (width, height) = CORRELATION_SIZE;
    let mut rgb = vec![0u8; (width * height * 3) as usize];
    let n = matrix.labels.len() as i32;

    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Swap Amount and Price Correlation", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(0i32..n, n..0i32)?;

        let (plot_w, plot_h) = chart.plotting_area().dim_in_pixel();
        let cell_w = plot_w as i32 / n.max(1);
        let cell_h = plot_h as i32 / n.max(1);
        let labels = &matrix.labels;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(n as usize + 1)
            .y_labels(n as usize + 1)
            .x_label_offset(cell_w / 2)
            .y_label_offset(cell_h / 2)
            .x_label_formatter(&|i| labels.get(*i as usize).cloned().unwrap_or_default())
            .y_label_formatter(&|i| labels.get(*i as usize).cloned().unwrap_or_default())
            .label_style(("sans-serif", 18))
            .draw()?;

        let cells: Vec<(i32, i32, Option<f64>)> = matrix
            .values
            .iter()
            .enumerate()
            .flat_map(|(row, values)| {
                values
                    .iter()
                    .enumerate()
                    .map(move |(col, v)| (col as i32, row as i32, *v))
            })
            .collect();

        chart.draw_series(cells.iter().map(|(x, y, v)| {
            Rectangle::new([(*x, *y), (*x + 1, *y + 1)], coolwarm(*v).filled())
        }))?;

        let annotation_style = TextStyle::from(("sans-serif", 22).into_font())
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(cells.iter().map(|(x, y, v)| {
            let label = v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "nan".to_string());
            EmptyElement::at((*x, *y))
                + Text::new(label, (cell_w / 2, cell_h / 2), annotation_style.clone())
        }))?;

        root.present()?;
    }

    Ok(RenderedChart { width, height, rgb })
}

/// Price histogram with an optional density overlay.
pub fn render_price_distribution(
    hist: &Histogram,
    kde: Option<&[(f64, f64)]>,
) -> eyre::Result<RenderedChart> {
    let (width, height) = DISTRIBUTION_SIZE;
    let mut rgb = vec![0u8; (width * height * 3) as usize];

    let kde_peak = kde
        .map(|curve| curve.iter().map(|(_, y)| *y).fold(0.0, f64::max))
        .unwrap_or(0.0);
    let y_max = (hist.max_count() as f64).max(kde_peak).max(1.0) * 1.1;

    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Swap Price Distribution", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(hist.lower..hist.upper, 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Price (USD)")
            .y_desc("Frequency")
            .label_style(("sans-serif", 16))
            .draw()?;

        chart.draw_series(hist.bins().map(|(left, right, count)| {
            Rectangle::new([(left, 0.0), (right, count as f64)], BLUE.mix(0.45).filled())
        }))?;
        chart.draw_series(hist.bins().map(|(left, right, count)| {
            Rectangle::new([(left, 0.0), (right, count as f64)], BLUE.stroke_width(1))
        }))?;

        if let Some(curve) = kde {
            chart.draw_series(LineSeries::new(curve.iter().copied(), BLUE.stroke_width(2)))?;
        }

        root.present()?;
    }

    Ok(RenderedChart { width, height, rgb })
}
