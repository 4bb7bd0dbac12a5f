use anyhow::Result;
use std::fmt::Write as _;

use crate::error::{ForecastError, Severity};
use crate::predictor::Forecast;

use super::chart::CandlestickChart;
use super::{escape_html, format_usd, PAGE_TITLE};

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; background: #fafafa; color: #262730; }
main { max-width: 1280px; margin: 0 auto; padding: 2rem 2.5rem; }
h1 { font-size: 2rem; margin-bottom: 1.5rem; }
.banner { border-radius: 0.5rem; padding: 0.9rem 1.1rem; margin: 0.75rem 0; }
.banner.error { background: #ffe2e2; color: #7d1a1a; }
.banner.warning { background: #fff6d6; color: #6e5400; }
.banner.success { background: #dff5e3; color: #15572a; }
table { border-collapse: collapse; width: 100%; background: #fff; font-variant-numeric: tabular-nums; }
th, td { border: 1px solid #e6e6e6; padding: 0.4rem 0.6rem; text-align: right; }
th:first-child, td:first-child { text-align: left; }
td.up { color: #1a7f64; }
td.down { color: #c0392b; }
.chart { margin-top: 1.5rem; background: #fff; }
.chart svg { width: 100%; height: auto; }
"#;

/// Whole-page HTML for one render cycle. A failed pipeline shows its
/// banner and nothing else.
pub struct DashboardPage<'a> {
    outcome: &'a Result<Forecast, ForecastError>,
    table_rows: usize,
}

impl<'a> DashboardPage<'a> {
    pub fn new(outcome: &'a Result<Forecast, ForecastError>) -> Self {
        Self {
            outcome,
            table_rows: 5,
        }
    }

    pub fn table_rows(mut self, n: usize) -> Self {
        self.table_rows = n.max(1);
        self
    }

    pub fn render(&self) -> Result<String> {
        let mut body = String::new();
        match self.outcome {
            Err(e) => {
                let class = match e.severity() {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                };
                push_banner(&mut body, class, e.user_message());
            }
            Ok(forecast) => self.render_forecast(&mut body, forecast)?,
        }
        Ok(wrap_document(&body))
    }

    fn render_forecast(&self, body: &mut String, forecast: &Forecast) -> Result<()> {
        push_banner(
            body,
            "success",
            &format!("Model accuracy (R²): {:.2}", forecast.r2),
        );
        push_banner(
            body,
            "success",
            &format!(
                "Next price prediction: {}",
                format_usd(forecast.next_close)
            ),
        );

        body.push_str("<h2>Latest data</h2>\n");
        body.push_str(&render_table(forecast, self.table_rows));

        let svg = CandlestickChart::new(&forecast.observations).render_svg()?;
        body.push_str("<div class=\"chart\">\n");
        body.push_str(&svg);
        body.push_str("\n</div>\n");
        Ok(())
    }
}

fn push_banner(body: &mut String, class: &str, message: &str) {
    let _ = writeln!(
        body,
        "<div class=\"banner {}\" role=\"status\">{}</div>",
        class,
        escape_html(message)
    );
}

fn render_table(forecast: &Forecast, rows: usize) -> String {
    let mut out = String::from(
        "<table>\n<thead><tr><th>timestamp</th><th>price</th><th>open</th><th>close</th>\
         <th>high</th><th>low</th><th>target</th></tr></thead>\n<tbody>\n",
    );
    for o in forecast.latest(rows) {
        let dir = if o.is_bullish() { "up" } else { "down" };
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{:.2}</td><td>{:.2}</td><td class=\"{}\">{:.2}</td>\
             <td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>",
            o.timestamp.format("%Y-%m-%d %H:%M:%S"),
            o.price,
            o.open,
            dir,
            o.close,
            o.high,
            o.low,
            o.target
        );
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

fn wrap_document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{style}</style>\n</head>\n<body>\n<main>\n\
         <h1>{title}</h1>\n{body}</main>\n</body>\n</html>\n",
        title = escape_html(PAGE_TITLE),
        style = STYLE,
        body = body
    )
}
