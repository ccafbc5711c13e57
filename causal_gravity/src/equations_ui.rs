//! Equations sidebar UI for the causal gravity sandbox
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
// Causal Gravity Equations
// ============================================================================

pub const CAUSAL_GRAVITY_EQUATIONS: &[Equation] = &[
    Equation {
        name: "Newton's Law of Gravitation",
        formula: "a = G·M / r²",
        description: "Acceleration toward each visible mass",
    },
    Equation {
        name: "Propagation Front",
        formula: "r(t) = 10·s·(t − t₀)",
        description: "A change travels outward at a fixed rate",
    },
    Equation {
        name: "Causal Lookup",
        formula: "masses(P) = history[version(cell(P))]",
        description: "Objects only see changes that have reached them",
    },
    Equation {
        name: "Schwarzschild Radius",
        formula: "rₛ = 2·G·M / c²",
        description: "Capture radius of a black hole",
    },
    Equation {
        name: "Gravitational Time Dilation",
        formula: "τ/t = √(1 − 2φ/c²)",
        description: "Clocks run slower deeper in the potential",
    },
    Equation {
        name: "Gravitational Redshift",
        formula: "z = 1/√(1 − rₛ/r) − 1",
        description: "Light climbing out of a well loses energy",
    },
];

pub const CAUSAL_GRAVITY_VARIABLES: &[(&str, &str)] = &[
    ("G", "Gravitational constant (scaled)"),
    ("M", "Mass of a body"),
    ("r", "Distance to a body"),
    ("c", "Speed of light (scaled)"),
    ("s", "Grid spacing"),
    ("t₀", "Time a change occurred"),
    ("φ", "Gravitational potential Σ G·M/r"),
    ("τ", "Proper time at a clock"),
];
