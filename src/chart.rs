//! Two-panel dashboard: revenue loss per city above, volume against lateness below.

use crate::error::{PipelineError, Result};
use crate::types::{city_label, CityRiskRow};
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

const SIZE: (u32, u32) = (1200, 1200);
const LOSS_COLOR: RGBColor = RGBColor(0xd9, 0x53, 0x4f);
const VOLUME_COLOR: RGBColor = RGBColor(0x5b, 0xc0, 0xde);
const MARKER_SIZE: i32 = 10;

/// Plot-ready series derived from the city risk matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub labels: Vec<String>,
    pub losses: Vec<f64>,
    pub points: Vec<(f64, f64)>,
    pub loss_axis: Range<f64>,
    pub volume_axis: Range<f64>,
    pub late_axis: Range<f64>,
}

fn padded(min: f64, max: f64) -> Range<f64> {
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = (max - min) * 0.1;
    (min - pad)..(max + pad)
}

pub fn prepare(rows: &[CityRiskRow]) -> DashboardData {
    let losses: Vec<f64> = rows.iter().map(|r| r.revenue_loss).collect();
    let points: Vec<(f64, f64)> = rows.iter().map(|r| (r.order_volume as f64, r.late_pct)).collect();

    let top_loss = losses.iter().copied().fold(0.0, f64::max);
    let loss_axis = 0.0..if top_loss > 0.0 { top_loss * 1.1 } else { 1.0 };

    let (vmin, vmax) = points
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), (v, _)| (lo.min(*v), hi.max(*v)));
    let volume_axis = if points.is_empty() { 0.0..1.0 } else { padded(vmin, vmax) };

    DashboardData {
        labels: rows.iter().map(|r| city_label(&r.city).to_string()).collect(),
        losses,
        points,
        loss_axis,
        volume_axis,
        late_axis: -5.0..105.0,
    }
}

pub fn render_dashboard(path: &Path, rows: &[CityRiskRow]) -> Result<()> {
    draw(path, &prepare(rows)).map_err(|e| PipelineError::Render {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn draw(path: &Path, data: &DashboardData) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically((SIZE.1 / 2) as i32);

    let n = data.labels.len();
    let mut bars = ChartBuilder::on(&upper)
        .caption(
            "Revenue Leakage by City",
            ("sans-serif", 28).into_font().style(FontStyle::Bold),
        )
        .margin(20)
        .x_label_area_size(150)
        .y_label_area_size(90)
        .build_cartesian_2d((0..n).into_segmented(), data.loss_axis.clone())?;
    // plotters only rotates labels in quarter turns
    bars.configure_mesh()
        .disable_x_mesh()
        .x_labels(n.max(1))
        .x_label_formatter(&|x: &SegmentValue<usize>| match x {
            SegmentValue::CenterOf(i) => data.labels.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .x_label_style(("sans-serif", 14).into_font().transform(FontTransform::Rotate90))
        .y_desc("revenue_loss")
        .draw()?;
    bars.draw_series(
        Histogram::vertical(&bars)
            .style(LOSS_COLOR.filled())
            .margin(8)
            .data(data.losses.iter().enumerate().map(|(i, v)| (i, *v))),
    )?;

    let mut scatter = ChartBuilder::on(&lower)
        .caption("Order Volume vs Late %", ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(data.volume_axis.clone(), data.late_axis.clone())?;
    scatter
        .configure_mesh()
        .x_desc("order_volume")
        .y_desc("late_pct")
        .draw()?;
    scatter.draw_series(
        data.points
            .iter()
            .map(|(x, y)| Circle::new((*x, *y), MARKER_SIZE, VOLUME_COLOR.filled())),
    )?;

    root.present()?;
    Ok(())
}
