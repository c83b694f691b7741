//! Admin analytics dashboard.
//!
//! Charts are drawn server-side as inline SVG: a bar chart of monthly
//! revenue, a donut of sales by category and an area chart of traffic by
//! hour. `/admin/dashboard/data.json` serves the same series for
//! client-side charting.

use std::f64::consts::{FRAC_PI_2, TAU};
use std::fmt::Write as _;

use askama::Template;
use askama_web::WebTemplate;
use axum::{Json, extract::State, response::IntoResponse};
use tracing::instrument;

use crate::dashboard::{CategoryShare, Dashboard, Kpi, MonthlySales, TrafficPoint};
use crate::filters;
use crate::middleware::CspNonce;
use crate::state::AppState;

/// Drawing area of the bar and area charts, in SVG user units.
const CHART_WIDTH: f64 = 600.0;
const CHART_HEIGHT: f64 = 240.0;
/// Donut radii, in SVG user units.
const OUTER_RADIUS: f64 = 100.0;
const INNER_RADIUS: f64 = 60.0;

/// One bar of the revenue chart.
#[derive(Clone, Debug)]
pub struct BarView {
    pub label: &'static str,
    pub value: u32,
    pub x: String,
    pub y: String,
    pub width: String,
    pub height: String,
    pub label_x: String,
}

/// One slice of the category donut.
#[derive(Clone, Debug)]
pub struct SliceView {
    pub name: &'static str,
    pub color: &'static str,
    pub percent: u32,
    pub path: String,
}

/// Area chart of the traffic series.
#[derive(Clone, Debug)]
pub struct AreaView {
    pub line: String,
    pub area: String,
    pub labels: Vec<(&'static str, String)>,
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub kpis: Vec<Kpi>,
    pub bars: Vec<BarView>,
    pub slices: Vec<SliceView>,
    pub traffic: AreaView,
    pub annual_revenue: String,
    pub best_month: Option<MonthlySales>,
    pub peak_traffic: Option<TrafficPoint>,
    pub nonce: String,
}

/// Display the dashboard.
#[instrument(skip(state, nonce))]
pub async fn show(State(state): State<AppState>, CspNonce(nonce): CspNonce) -> impl IntoResponse {
    let dashboard = state.dashboard();

    DashboardTemplate {
        kpis: dashboard.kpis.clone(),
        bars: bar_chart(&dashboard.sales),
        slices: donut_chart(&dashboard.categories),
        traffic: area_chart(&dashboard.traffic),
        annual_revenue: thousands(dashboard.annual_revenue()),
        best_month: dashboard.best_month().copied(),
        peak_traffic: dashboard.peak_traffic().copied(),
        nonce,
    }
}

/// Chart series as JSON.
#[instrument(skip(state))]
pub async fn data(State(state): State<AppState>) -> Json<Dashboard> {
    Json(state.dashboard().clone())
}

fn coord(value: f64) -> String {
    format!("{value:.1}")
}

/// Bars scaled so the largest month fills the chart height.
fn bar_chart(sales: &[MonthlySales]) -> Vec<BarView> {
    let max = sales.iter().map(|s| s.total).max().unwrap_or(0).max(1);
    let slot = CHART_WIDTH / sales.len().max(1) as f64;
    let width = slot * 0.6;

    sales
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let height = f64::from(s.total) / f64::from(max) * CHART_HEIGHT;
            let x = slot.mul_add(i as f64, (slot - width) / 2.0);
            BarView {
                label: s.month,
                value: s.total,
                x: coord(x),
                y: coord(CHART_HEIGHT - height),
                width: coord(width),
                height: coord(height),
                label_x: coord(x + width / 2.0),
            }
        })
        .collect()
}

/// Donut slices, starting at twelve o'clock and running clockwise.
fn donut_chart(categories: &[CategoryShare]) -> Vec<SliceView> {
    let total: u32 = categories.iter().map(|c| c.value).sum();
    if total == 0 {
        return Vec::new();
    }

    let mut start = -FRAC_PI_2;
    categories
        .iter()
        .map(|c| {
            let share = f64::from(c.value) / f64::from(total);
            let end = share.mul_add(TAU, start);
            let path = annular_sector(start, end);
            start = end;
            SliceView {
                name: c.name,
                color: c.color,
                percent: (share * 100.0).round() as u32,
                path,
            }
        })
        .collect()
}

/// SVG path of a donut slice between two angles, centred on the origin.
fn annular_sector(start: f64, end: f64) -> String {
    // A full circle cannot be drawn as one arc; stop just short of it.
    let end = if end - start >= TAU { start + TAU - 1e-4 } else { end };
    let large_arc = u8::from(end - start > std::f64::consts::PI);
    let point = |radius: f64, angle: f64| (radius * angle.cos(), radius * angle.sin());

    let (ox1, oy1) = point(OUTER_RADIUS, start);
    let (ox2, oy2) = point(OUTER_RADIUS, end);
    let (ix2, iy2) = point(INNER_RADIUS, end);
    let (ix1, iy1) = point(INNER_RADIUS, start);

    format!(
        "M {} {} A {OUTER_RADIUS} {OUTER_RADIUS} 0 {large_arc} 1 {} {} \
         L {} {} A {INNER_RADIUS} {INNER_RADIUS} 0 {large_arc} 0 {} {} Z",
        coord(ox1),
        coord(oy1),
        coord(ox2),
        coord(oy2),
        coord(ix2),
        coord(iy2),
        coord(ix1),
        coord(iy1),
    )
}

/// Line and filled area through the traffic points.
fn area_chart(traffic: &[TrafficPoint]) -> AreaView {
    let max = traffic.iter().map(|t| t.users).max().unwrap_or(0).max(1);
    let step = if traffic.len() > 1 {
        CHART_WIDTH / (traffic.len() - 1) as f64
    } else {
        0.0
    };

    let mut line = String::new();
    let mut labels = Vec::with_capacity(traffic.len());
    for (i, t) in traffic.iter().enumerate() {
        let x = step * i as f64;
        let y = CHART_HEIGHT - f64::from(t.users) / f64::from(max) * CHART_HEIGHT;
        let command = if i == 0 { 'M' } else { 'L' };
        let _ = write!(line, "{command} {} {} ", coord(x), coord(y));
        labels.push((t.time, coord(x)));
    }

    let area = if traffic.is_empty() {
        String::new()
    } else {
        let last_x = step * (traffic.len() - 1) as f64;
        format!(
            "{line}L {} {height} L 0.0 {height} Z",
            coord(last_x),
            height = coord(CHART_HEIGHT),
        )
    };

    AreaView {
        line: line.trim_end().to_string(),
        area,
        labels,
    }
}

/// Group thousands with dots, Spanish style: `60800` becomes `60.800`.
fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
