//! Map Page
//!
//! Worked locations drawn on a canvas. Coordinates are projected
//! equirectangularly into the bounding box of the markers.

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::api::{self, MapData};
use crate::state::global::{amount, format_brl, Coordinates, GlobalState};

const PADDING: f64 = 40.0;

#[component]
pub fn Map() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let data = create_rw_signal(None::<MapData>);
    let canvas_ref = create_node_ref::<html::Canvas>();

    create_effect(move |_| {
        let query = state.filter.get();
        let _ = state.revision.get();
        let state = state.clone();
        spawn_local(async move {
            match api::fetch_map(&query).await {
                Ok(map) => data.set(Some(map)),
                Err(e) => state.show_error(&e),
            }
        });
    });

    create_effect(move |_| {
        let map = data.get();
        if let (Some(canvas), Some(map)) = (canvas_ref.get(), map) {
            draw_map(&canvas, &map);
        }
    });

    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"Mapa"</h1>
                <p class="text-gray-400 mt-1">"Onde você deu plantão"</p>
            </div>

            <section class="bg-gray-800 rounded-xl p-6">
                <canvas
                    node_ref=canvas_ref
                    width="800"
                    height="500"
                    class="w-full rounded-lg"
                />
                {move || data.get().filter(|m| m.unmapped > 0).map(|m| view! {
                    <p class="text-sm text-gray-400 mt-2">
                        {format!("{} plantões em locais sem coordenadas não aparecem no mapa", m.unmapped)}
                    </p>
                })}
            </section>

            <section class="bg-gray-800 rounded-xl p-6">
                <ul class="space-y-2">
                    {move || data.get().map(|m| m.markers).unwrap_or_default().into_iter().map(|marker| view! {
                        <li class="flex justify-between border-b border-gray-700 py-2">
                            <span>{marker.location}</span>
                            <span class="text-gray-400">
                                {format!("{} plantões, {}", marker.shift_count, format_brl(amount(&marker.gross_amount)))}
                            </span>
                        </li>
                    }).collect_view()}
                </ul>
            </section>
        </div>
    }
}

/// Canvas position of each coordinate, fitted into `width` x `height`
pub fn project(points: &[Coordinates], width: f64, height: f64) -> Vec<(f64, f64)> {
    if points.is_empty() {
        return Vec::new();
    }

    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lng, mut max_lng) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
        min_lng = min_lng.min(p.lng);
        max_lng = max_lng.max(p.lng);
    }

    // A single point (or a line) still needs a non-zero span
    let lat_span = (max_lat - min_lat).max(0.01);
    let lng_span = (max_lng - min_lng).max(0.01);
    let usable_w = width - 2.0 * PADDING;
    let usable_h = height - 2.0 * PADDING;
    let scale = (usable_w / lng_span).min(usable_h / lat_span);

    let offset_x = PADDING + (usable_w - lng_span * scale) / 2.0;
    let offset_y = PADDING + (usable_h - lat_span * scale) / 2.0;
    let center_lat = (min_lat + max_lat) / 2.0;
    let center_lng = (min_lng + max_lng) / 2.0;

    points
        .iter()
        .map(|p| {
            let x = offset_x + (p.lng - center_lng + lng_span / 2.0) * scale;
            // North is up
            let y = offset_y + (center_lat - p.lat + lat_span / 2.0) * scale;
            (x, y)
        })
        .collect()
}

fn draw_map(canvas: &HtmlCanvasElement, map: &MapData) {
    let ctx = match canvas.get_context("2d") {
        Ok(Some(ctx)) => match ctx.dyn_into::<CanvasRenderingContext2d>() {
            Ok(ctx) => ctx,
            Err(_) => return,
        },
        _ => return,
    };

    let width = canvas.width() as f64;
    let height = canvas.height() as f64;

    ctx.set_fill_style(&"#1f2937".into());
    ctx.fill_rect(0.0, 0.0, width, height);

    if map.markers.is_empty() {
        ctx.set_fill_style(&"#6b7280".into());
        ctx.set_font("16px sans-serif");
        let _ = ctx.fill_text("Nenhum local com coordenadas", width / 2.0 - 100.0, height / 2.0);
        return;
    }

    let coordinates: Vec<Coordinates> = map.markers.iter().map(|m| m.coordinates).collect();
    let positions = project(&coordinates, width, height);
    let max_count = map.markers.iter().map(|m| m.shift_count).max().unwrap_or(1).max(1);

    ctx.set_font("12px sans-serif");
    for (marker, (x, y)) in map.markers.iter().zip(positions) {
        let radius = 5.0 + 10.0 * (marker.shift_count as f64 / max_count as f64);

        ctx.set_fill_style(&"rgba(255, 152, 0, 0.8)".into());
        ctx.begin_path();
        let _ = ctx.arc(x, y, radius, 0.0, std::f64::consts::PI * 2.0);
        ctx.fill();

        ctx.set_fill_style(&"#e5e7eb".into());
        let _ = ctx.fill_text(&marker.location, x + radius + 4.0, y + 4.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_keeps_north_up_and_inside_canvas() {
        let sao_paulo = Coordinates { lat: -23.55, lng: -46.63 };
        let rio = Coordinates { lat: -22.91, lng: -43.17 };
        let positions = project(&[sao_paulo, rio], 800.0, 500.0);

        let (sp_x, sp_y) = positions[0];
        let (rio_x, rio_y) = positions[1];
        assert!(rio_x > sp_x);
        assert!(rio_y < sp_y);
        for (x, y) in positions {
            assert!((PADDING - 1e-6..=800.0 - PADDING + 1e-6).contains(&x));
            assert!((PADDING - 1e-6..=500.0 - PADDING + 1e-6).contains(&y));
        }
    }

    #[test]
    fn test_project_single_point_is_centered() {
        let positions = project(&[Coordinates { lat: -15.8, lng: -47.9 }], 800.0, 500.0);
        let (x, y) = positions[0];
        assert!((x - 400.0).abs() < 1e-6);
        assert!((y - 250.0).abs() < 1e-6);
    }
}
