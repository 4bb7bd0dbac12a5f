use anyhow::{Context, Result};
use chrono::Duration;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::model::Observation;

pub const CHART_TITLE: &str = "Bitcoin Price Chart (Candlestick)";
pub const SERIES_LABEL: &str = "BTC/USD";

const GAIN: RGBColor = RGBColor(38, 166, 154);
const LOSS: RGBColor = RGBColor(239, 83, 80);

/// Candlestick chart over the full observation sequence as an inline SVG
/// document.
pub struct CandlestickChart<'a> {
    observations: &'a [Observation],
    width: u32,
    height: u32,
}

impl<'a> CandlestickChart<'a> {
    pub fn new(observations: &'a [Observation]) -> Self {
        Self {
            observations,
            width: 1200,
            height: 520,
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(200);
        self.height = height.max(150);
        self
    }

    fn price_range(&self) -> (f64, f64) {
        let min_price = self
            .observations
            .iter()
            .map(|o| o.low)
            .fold(f64::INFINITY, f64::min);
        let max_price = self
            .observations
            .iter()
            .map(|o| o.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let range = max_price - min_price;
        let pad = if range < 0.01 { 1.0 } else { range * 0.05 };
        (min_price - pad, max_price + pad)
    }

    fn candle_width(&self, plot_width: u32) -> u32 {
        let n = self.observations.len().max(1) as u32;
        (plot_width / (n * 2)).clamp(2, 18)
    }

    pub fn render_svg(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root)?;
            root.present()?;
        }
        Ok(svg)
    }

    fn draw(&self, root: &DrawingArea<SVGBackend<'_>, Shift>) -> Result<()> {
        root.fill(&WHITE)?;

        let (Some(first), Some(last)) = (self.observations.first(), self.observations.last())
        else {
            root.titled(CHART_TITLE, ("sans-serif", 22))?;
            return Ok(());
        };

        let half_hour = Duration::minutes(30);
        let x_range = (first.timestamp - half_hour)..(last.timestamp + half_hour);
        let (y_min, y_max) = self.price_range();

        let mut chart = ChartBuilder::on(root)
            .caption(CHART_TITLE, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(44)
            .y_label_area_size(84)
            .build_cartesian_2d(x_range, y_min..y_max)
            .context("failed to build chart coordinates")?;

        chart
            .configure_mesh()
            .light_line_style(&RGBColor(235, 235, 235))
            .x_desc("Time")
            .y_desc("Price (USD)")
            .x_labels(12)
            .x_label_formatter(&|t| t.format("%H:%M").to_string())
            .y_label_formatter(&|p| format!("{:.0}", p))
            .draw()?;

        let body = self.candle_width(self.width.saturating_sub(96));
        chart
            .draw_series(self.observations.iter().map(|o| {
                CandleStick::new(
                    o.timestamp,
                    o.open,
                    o.high,
                    o.low,
                    o.close,
                    GAIN.filled(),
                    LOSS.filled(),
                    body,
                )
            }))?
            .label(SERIES_LABEL)
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], GAIN.filled()));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        Ok(())
    }
}
