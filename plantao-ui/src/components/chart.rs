//! Chart Component
//!
//! Monthly gross/net bar chart using HTML5 Canvas.

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::state::global::{amount, MonthlyStats};

const GROSS_COLOR: &str = "#FF9800";
const NET_COLOR: &str = "#4CAF50";

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 40.0;

/// Bar chart of gross and net per month
#[component]
pub fn MonthlyChart(#[prop(into)] months: Signal<Vec<MonthlyStats>>) -> impl IntoView {
    let canvas_ref = create_node_ref::<html::Canvas>();

    create_effect(move |_| {
        let data = months.get();
        if let Some(canvas) = canvas_ref.get() {
            draw_chart(&canvas, &data);
        }
    });

    view! {
        <div class="relative">
            <canvas
                node_ref=canvas_ref
                width="800"
                height="320"
                class="w-full h-64 md:h-80 rounded-lg"
            />

            <div class="flex justify-center gap-4 mt-4">
                <LegendItem color=GROSS_COLOR label="Bruto" />
                <LegendItem color=NET_COLOR label="Líquido" />
            </div>
        </div>
    }
}

#[component]
fn LegendItem(color: &'static str, label: &'static str) -> impl IntoView {
    view! {
        <div class="flex items-center space-x-2">
            <div class="w-3 h-3 rounded-full" style=format!("background-color: {}", color) />
            <span class="text-sm text-gray-300">{label}</span>
        </div>
    }
}

/// A bar in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Lay out one gross and one net bar per month, scaled to the largest gross
pub fn layout_bars(pairs: &[(f64, f64)], width: f64, height: f64) -> Vec<(Bar, Bar)> {
    let chart_width = width - MARGIN_LEFT - MARGIN_RIGHT;
    let chart_height = height - MARGIN_TOP - MARGIN_BOTTOM;

    let max = pairs
        .iter()
        .map(|(gross, net)| gross.max(*net))
        .fold(0.0_f64, f64::max);
    if pairs.is_empty() || max <= 0.0 {
        return Vec::new();
    }

    let slot = chart_width / pairs.len() as f64;
    let bar_width = (slot * 0.35).min(40.0);
    let baseline = MARGIN_TOP + chart_height;

    pairs
        .iter()
        .enumerate()
        .map(|(i, (gross, net))| {
            let center = MARGIN_LEFT + slot * (i as f64 + 0.5);
            let bar = |value: f64, x: f64| {
                let h = (value.max(0.0) / max) * chart_height;
                Bar { x, y: baseline - h, width: bar_width, height: h }
            };
            (bar(*gross, center - bar_width), bar(*net, center))
        })
        .collect()
}

fn draw_chart(canvas: &HtmlCanvasElement, months: &[MonthlyStats]) {
    let ctx = match canvas.get_context("2d") {
        Ok(Some(ctx)) => match ctx.dyn_into::<CanvasRenderingContext2d>() {
            Ok(ctx) => ctx,
            Err(_) => return,
        },
        _ => return,
    };

    let width = canvas.width() as f64;
    let height = canvas.height() as f64;

    ctx.set_fill_style(&"#1f2937".into()); // gray-800
    ctx.fill_rect(0.0, 0.0, width, height);

    let pairs: Vec<(f64, f64)> = months
        .iter()
        .map(|m| (amount(&m.gross), amount(&m.net)))
        .collect();
    let bars = layout_bars(&pairs, width, height);

    if bars.is_empty() {
        ctx.set_fill_style(&"#6b7280".into());
        ctx.set_font("16px sans-serif");
        let _ = ctx.fill_text("Nenhum plantão no período", width / 2.0 - 90.0, height / 2.0);
        return;
    }

    // Grid and y labels
    let max = pairs.iter().map(|(g, n)| g.max(*n)).fold(0.0_f64, f64::max);
    let chart_height = height - MARGIN_TOP - MARGIN_BOTTOM;
    ctx.set_stroke_style(&"#374151".into());
    ctx.set_line_width(1.0);
    ctx.set_font("12px sans-serif");
    for i in 0..=4 {
        let y = MARGIN_TOP + (i as f64 / 4.0) * chart_height;
        ctx.begin_path();
        ctx.move_to(MARGIN_LEFT, y);
        ctx.line_to(width - MARGIN_RIGHT, y);
        ctx.stroke();

        let value = max * (1.0 - i as f64 / 4.0);
        ctx.set_fill_style(&"#9ca3af".into());
        let _ = ctx.fill_text(&format!("{:.0}", value), 5.0, y + 4.0);
    }

    for ((gross, net), month) in bars.iter().zip(months) {
        ctx.set_fill_style(&GROSS_COLOR.into());
        ctx.fill_rect(gross.x, gross.y, gross.width, gross.height);
        ctx.set_fill_style(&NET_COLOR.into());
        ctx.fill_rect(net.x, net.y, net.width, net.height);

        // "2024-03" -> "03/24"
        let label = match month.month.split_once('-') {
            Some((year, m)) => format!("{}/{}", m, &year[year.len().saturating_sub(2)..]),
            None => month.month.clone(),
        };
        ctx.set_fill_style(&"#9ca3af".into());
        let _ = ctx.fill_text(&label, gross.x, height - 15.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_scales_to_largest_gross() {
        let bars = layout_bars(&[(1000.0, 890.0), (2000.0, 1780.0)], 800.0, 320.0);
        assert_eq!(bars.len(), 2);

        let chart_height = 320.0 - MARGIN_TOP - MARGIN_BOTTOM;
        assert_eq!(bars[1].0.height, chart_height);
        assert_eq!(bars[0].0.height, chart_height / 2.0);
        assert!(bars[0].1.height < bars[0].0.height);
        assert!(bars[0].0.x < bars[1].0.x);
    }

    #[test]
    fn test_layout_empty() {
        assert!(layout_bars(&[], 800.0, 320.0).is_empty());
        assert!(layout_bars(&[(0.0, 0.0)], 800.0, 320.0).is_empty());
    }
}
