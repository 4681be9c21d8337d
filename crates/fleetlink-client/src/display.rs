//! Text rendering for the terminal.

use fleetlink_types::{AvailableVehicle, Position, VehicleId, WorldSnapshot};

const RULE_WIDTH: usize = 80;

/// Status table of every vehicle; the controlled vehicle is marked `>>>`.
pub fn render_status(snapshot: &WorldSnapshot, controlled: Option<VehicleId>) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let rows: Vec<String> = snapshot
        .vehicles
        .iter()
        .map(|v| {
            let marker = if Some(v.id) == controlled { ">>> " } else { "    " };
            let streaming = if v.state.is_streaming() {
                "Streaming"
            } else {
                "Not Streaming"
            };
            let source = v
                .source_description()
                .map(|s| format!(" ({s})"))
                .unwrap_or_default();
            let id = v.id.into_inner();
            let position = v.position().to_string();
            let state = v.state.to_string();
            format!(
                "{marker}Vehicle {id:>2} @ {position:<14} | State: {state:<12} | {streaming}{source}"
            )
        })
        .collect();

    format!(
        "{heavy}\nCurrent Vehicle Status (tick {}):\n{light}\n{}\n{heavy}",
        snapshot.tick,
        rows.join("\n")
    )
}

/// Vehicles offered on connect, followed by the server's prompt.
pub fn render_welcome(vehicles: &[AvailableVehicle], prompt: &str) -> String {
    let list: Vec<String> = vehicles
        .iter()
        .map(|v| {
            format!(
                "Vehicle {} @ {}",
                v.id.into_inner(),
                Position::new(v.x, v.y)
            )
        })
        .collect();
    format!(
        "\nAvailable Vehicles:\n{}\n{prompt} (enter an id, or press Enter for the first free one):",
        list.join("\n")
    )
}

/// The command list.
pub const fn render_help() -> &'static str {
    "\nAvailable Commands:\n\
     status (s)       - Show current status of all vehicles\n\
     move x y         - Move controlled vehicle to new position (e.g., 'move 50 0')\n\
     refresh (r)      - Same as status\n\
     select [id]      - Switch to another free vehicle\n\
     help (h, ?)      - Show this help message\n\
     exit (quit)      - Disconnect from server"
}

#[cfg(test)]
mod tests {
    use fleetlink_types::{LinkState, VehicleView};

    use super::*;

    fn snapshot() -> WorldSnapshot {
        WorldSnapshot {
            tick: 7,
            vehicles: vec![
                VehicleView {
                    id: VehicleId(1),
                    x: 10.0,
                    y: 0.0,
                    state: LinkState::ProviderLink,
                    relay_target: None,
                },
                VehicleView {
                    id: VehicleId(2),
                    x: 20.0,
                    y: 0.0,
                    state: LinkState::RelayedLink,
                    relay_target: Some(VehicleId(1)),
                },
                VehicleView {
                    id: VehicleId(4),
                    x: 300.0,
                    y: 0.0,
                    state: LinkState::NoService,
                    relay_target: None,
                },
            ],
        }
    }

    #[test]
    fn status_marks_controlled_vehicle_and_sources() {
        let text = render_status(&snapshot(), Some(VehicleId(2)));
        let lines: Vec<&str> = text.lines().collect();

        assert!(text.contains("tick 7"));
        assert!(lines.iter().any(|l| {
            l.starts_with(">>> Vehicle  2") && l.contains("Streaming (via Vehicle 1)")
        }));
        assert!(
            lines
                .iter()
                .any(|l| l.starts_with("    Vehicle  1") && l.ends_with("| Streaming"))
        );
        assert!(
            lines
                .iter()
                .any(|l| l.contains("Vehicle  4") && l.contains("Not Streaming"))
        );
    }

    #[test]
    fn welcome_lists_offers() {
        let text = render_welcome(
            &[AvailableVehicle {
                id: VehicleId(3),
                x: 100.0,
                y: 100.0,
            }],
            "Select a vehicle to control",
        );
        assert!(text.contains("Vehicle 3 @ (100, 100)"));
        assert!(text.contains("Select a vehicle to control"));
    }

    #[test]
    fn help_lists_every_command() {
        for word in ["status", "move x y", "refresh", "select", "help", "exit"] {
            assert!(render_help().contains(word), "{word}");
        }
    }
}
