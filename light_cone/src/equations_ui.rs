//! Equations sidebar UI for the light cone editor
//!
//! Displays relevant physics equations using egui.

use egui::{Color32, Context, RichText};

/// An equation with its name and formula
pub struct Equation {
    pub name: &'static str,
    pub formula: &'static str,
    pub description: &'static str,
}

/// Draw the equations sidebar
pub fn draw_equations_sidebar(
    ctx: &Context,
    title: &str,
    equations: &[Equation],
    variables: &[(&str, &str)],
) {
    egui::SidePanel::right("equations_panel")
        .resizable(true)
        .default_width(280.0)
        .show(ctx, |ui| {
            ui.heading(RichText::new(title).color(Color32::LIGHT_BLUE));
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.collapsing(RichText::new("📐 Equations").strong(), |ui| {
                    for eq in equations {
                        ui.group(|ui| {
                            ui.label(RichText::new(eq.name).strong().color(Color32::YELLOW));
                            ui.label(RichText::new(eq.formula).monospace().color(Color32::WHITE));
                            ui.label(RichText::new(eq.description).small().italics());
                        });
                        ui.add_space(4.0);
                    }
                });

                ui.add_space(8.0);

                ui.collapsing(RichText::new("📖 Variables").strong(), |ui| {
                    egui::Grid::new("variables_grid")
                        .num_columns(2)
                        .spacing([10.0, 4.0])
                        .show(ui, |ui| {
                            for (symbol, meaning) in variables {
                                ui.label(
                                    RichText::new(*symbol)
                                        .monospace()
                                        .color(Color32::LIGHT_GREEN),
                                );
                                ui.label(*meaning);
                                ui.end_row();
                            }
                        });
                });
            });
        });
}

// ============================================================================
// Light Cone Equations
// ============================================================================

pub const LIGHT_CONE_EQUATIONS: &[Equation] = &[
    Equation {
        name: "Velocity Addition",
        formula: "w = (v₁ + v₂) / (1 + v₁·v₂/c²)",
        description: "Composed velocities never reach c",
    },
    Equation {
        name: "Proper Acceleration",
        formula: "a = 2·X·c² / (c²·T² − X²)",
        description: "Constant acceleration covering X in time T",
    },
    Equation {
        name: "Hyperbolic Velocity",
        formula: "v(T) = a·T / √(1 + (a·T/c)²)",
        description: "Velocity after accelerating for time T",
    },
    Equation {
        name: "Proper Time",
        formula: "τ = (c/a)·asinh(a·T/c)",
        description: "Time experienced by the traveler",
    },
    Equation {
        name: "Isochrone",
        formula: "t = t₀ + k·√(τ² + (Δx/c)²)",
        description: "Events of equal proper time since departure",
    },
    Equation {
        name: "Time Dilation",
        formula: "Δ% = (T − τ) / T · 100",
        description: "How much less the traveler ages",
    },
];

pub const LIGHT_CONE_VARIABLES: &[(&str, &str)] = &[
    ("c", "Speed of light (normalized to 1)"),
    ("x, X", "Spatial position / displacement"),
    ("t, T", "Coordinate time / interval"),
    ("τ", "Proper time along a worldline"),
    ("v", "Velocity as a fraction of c"),
    ("a", "Proper acceleration"),
    ("k", "Isochrone calibration factor"),
];
