//! Server-rendered HTML status page.
//!
//! Draws the fleet as an SVG map (one colored dot per vehicle, one edge
//! per relay link) above a status table, and reloads itself on the tick
//! cadence.

use chrono::{DateTime, Utc};
use fleetlink_types::{LinkState, VehicleView, WorldSnapshot};

/// Minimum padding around the fleet in world units.
const MIN_PADDING: f64 = 10.0;

/// Render the complete status page.
pub fn render_index(snapshot: &WorldSnapshot, started_at: DateTime<Utc>, refresh_ms: u64) -> String {
    let tick = snapshot.tick;
    let vehicle_count = snapshot.vehicles.len();
    let streaming = snapshot
        .vehicles
        .iter()
        .filter(|v| v.state.is_streaming())
        .count();
    let started = started_at.to_rfc3339();
    let legend = render_legend();
    let map = render_map(snapshot);
    let rows: String = snapshot.vehicles.iter().map(render_row).collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Fleetlink Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 900px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        svg {{ background: #161b22; border: 1px solid #30363d; border-radius: 6px; width: 100%; height: 420px; }}
        table {{ border-collapse: collapse; width: 100%; margin-top: 1rem; }}
        th, td {{ text-align: left; padding: 0.3rem 0.6rem; border-bottom: 1px solid #30363d; }}
        .swatch {{ display: inline-block; width: 0.8rem; height: 0.8rem; border-radius: 50%; margin-right: 0.4rem; }}
        .legend span {{ margin-right: 1.2rem; }}
        a {{ color: #58a6ff; text-decoration: none; }}
    </style>
</head>
<body>
    <h1>Fleetlink Observer</h1>
    <p class="subtitle">Decentralized vehicle network selection, started {started}</p>

    <div>
        <div class="metric">
            <div class="label">Tick</div>
            <div class="value">{tick}</div>
        </div>
        <div class="metric">
            <div class="label">Vehicles</div>
            <div class="value">{vehicle_count}</div>
        </div>
        <div class="metric">
            <div class="label">Streaming</div>
            <div class="value">{streaming}</div>
        </div>
    </div>

    <p class="legend">{legend}</p>
    {map}

    <table>
        <tr><th>Vehicle</th><th>Position</th><th>State</th><th>Source</th><th>Streaming</th></tr>
{rows}    </table>

    <p>API: <a href="/api/snapshot">/api/snapshot</a>, <a href="/api/status">/api/status</a>, <code>/api/vehicles/{{id}}</code>, <code>ws://host:port/ws/state</code></p>
    <script>setTimeout(() => location.reload(), {refresh_ms});</script>
</body>
</html>"#
    )
}

fn render_legend() -> String {
    LinkState::ALL
        .iter()
        .map(|state| {
            format!(
                r#"<span><span class="swatch" style="background:{}"></span>{}</span>"#,
                state.color(),
                state.label()
            )
        })
        .collect()
}

fn render_row(v: &VehicleView) -> String {
    format!(
        "        <tr><td>Vehicle {}</td><td>{}</td><td><span class=\"swatch\" style=\"background:{}\"></span>{}</td><td>{}</td><td>{}</td></tr>\n",
        v.id.into_inner(),
        v.position(),
        v.state.color(),
        v.state,
        v.source_description().unwrap_or_default(),
        if v.state.is_streaming() { "yes" } else { "no" },
    )
}

/// Bounding box of the fleet in SVG coordinates (y grows downwards, so
/// world y is negated).
fn bounds(vehicles: &[VehicleView]) -> (f64, f64, f64, f64) {
    if vehicles.is_empty() {
        return (0.0, -100.0, 100.0, 0.0);
    }
    vehicles.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(min_x, min_y, max_x, max_y), v| {
            (min_x.min(v.x), min_y.min(-v.y), max_x.max(v.x), max_y.max(-v.y))
        },
    )
}

fn render_map(snapshot: &WorldSnapshot) -> String {
    let (min_x, min_y, max_x, max_y) = bounds(&snapshot.vehicles);
    let span = (max_x - min_x).max(max_y - min_y);
    let pad = (span * 0.1).max(MIN_PADDING);
    let radius = (span / 60.0).max(1.5);

    let edges: String = snapshot
        .vehicles
        .iter()
        .filter_map(|v| {
            let target = snapshot.vehicle(v.relay_target?)?;
            Some(format!(
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-dasharray="{}" />"#,
                v.x,
                -v.y,
                target.x,
                -target.y,
                LinkState::RelayedLink.color(),
                radius,
            ))
        })
        .collect();

    let dots: String = snapshot
        .vehicles
        .iter()
        .map(|v| {
            format!(
                r##"<circle cx="{x}" cy="{y}" r="{radius}" fill="{color}"><title>Vehicle {id}: {state}</title></circle><text x="{x}" y="{ty}" fill="#c9d1d9" font-size="{radius}" text-anchor="middle">{id}</text>"##,
                x = v.x,
                y = -v.y,
                ty = radius.mul_add(-1.6, -v.y),
                color = v.state.color(),
                id = v.id.into_inner(),
                state = v.state,
            )
        })
        .collect();

    format!(
        r#"<svg viewBox="{} {} {} {}" xmlns="http://www.w3.org/2000/svg">{edges}{dots}</svg>"#,
        min_x - pad,
        min_y - pad,
        pad.mul_add(2.0, max_x - min_x),
        pad.mul_add(2.0, max_y - min_y),
    )
}

#[cfg(test)]
mod tests {
    use fleetlink_types::VehicleId;

    use super::*;

    fn snapshot() -> WorldSnapshot {
        WorldSnapshot {
            tick: 12,
            vehicles: vec![
                VehicleView {
                    id: VehicleId(1),
                    x: 0.0,
                    y: 0.0,
                    state: LinkState::ProviderLink,
                    relay_target: None,
                },
                VehicleView {
                    id: VehicleId(2),
                    x: 5.0,
                    y: 0.0,
                    state: LinkState::RelayedLink,
                    relay_target: Some(VehicleId(1)),
                },
                VehicleView {
                    id: VehicleId(3),
                    x: 90.0,
                    y: 40.0,
                    state: LinkState::NoService,
                    relay_target: None,
                },
            ],
        }
    }

    #[test]
    fn page_shows_states_colors_and_relay_edges() {
        let html = render_index(&snapshot(), Utc::now(), 500);

        assert!(html.contains("<div class=\"value\">12</div>"));
        assert!(html.contains(LinkState::ProviderLink.color()));
        assert!(html.contains(LinkState::NoService.color()));
        assert!(html.contains("via Vehicle 1"));
        assert_eq!(html.matches("<line ").count(), 1);
        assert_eq!(html.matches("<circle ").count(), 3);
        assert!(html.contains("setTimeout(() => location.reload(), 500)"));
    }

    #[test]
    fn empty_fleet_still_renders() {
        let html = render_index(&WorldSnapshot::default(), Utc::now(), 1000);
        assert!(html.contains("<svg viewBox="));
        assert!(!html.contains("<circle "));
    }

    #[test]
    fn bounds_flip_the_vertical_axis() {
        let (min_x, min_y, max_x, max_y) = bounds(&snapshot().vehicles);
        assert!((min_x - 0.0).abs() < f64::EPSILON);
        assert!((max_x - 90.0).abs() < f64::EPSILON);
        assert!((min_y + 40.0).abs() < f64::EPSILON);
        assert!((max_y - 0.0).abs() < f64::EPSILON);
    }
}
