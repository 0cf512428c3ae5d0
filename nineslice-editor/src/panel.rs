//! On-screen settings panel.
//!
//! Edits the explicit [`EditorSettings`] directly; the next mesh build picks the
//! changes up. Keyboard shortcuts in `input` edit the same state.

use crate::input::MarginSide;
use egui::{Color32, Context, DragValue, Grid, Slider, Ui};
use nineslice::mesh::GRID_SIZE;
use nineslice::{EditorSettings, VERTEX_COUNT};

/// Upper bound of the output size sliders.
const MAX_OUTPUT: f32 = 4096.0;

/// Read-only state shown next to the editable settings.
#[derive(Debug, Clone, Default)]
pub struct PanelStatus {
    pub image_size: (u32, u32),
    /// Validation error of the current margins, if any.
    pub error: Option<String>,
    pub inverted: bool,
    /// Margin targeted by the `-`/`=` shortcuts.
    pub margin_side: MarginSide,
}

/// Draws the settings window. Returns `true` if any setting changed.
pub fn settings_panel(ctx: &Context, settings: &mut EditorSettings, status: &PanelStatus) -> bool {
    let before = settings.clone();

    egui::Window::new("Nine-slice")
        .default_pos([16.0, 16.0])
        .resizable(false)
        .show(ctx, |ui| {
            margin_controls(ui, settings, status);
            ui.separator();
            output_controls(ui, settings);
            ui.separator();
            tint_controls(ui, settings);
            ui.separator();
            status_line(ui, status);
        });

    *settings != before
}

fn margin_controls(ui: &mut Ui, settings: &mut EditorSettings, status: &PanelStatus) {
    let (width, height) = status.image_size;
    let m = &mut settings.margins;

    ui.heading("Margins");
    Grid::new("margins").num_columns(2).show(ui, |ui| {
        let rows = [
            (MarginSide::Left, &mut m.left, width),
            (MarginSide::Right, &mut m.right, width),
            (MarginSide::Top, &mut m.top, height),
            (MarginSide::Bottom, &mut m.bottom, height),
        ];
        for (side, value, extent) in rows {
            if side == status.margin_side {
                ui.strong(side.name());
            } else {
                ui.label(side.name());
            }
            ui.add(Slider::new(value, 0..=extent.saturating_sub(1)).suffix(" px"));
            ui.end_row();
        }
    });
}

fn output_controls(ui: &mut Ui, settings: &mut EditorSettings) {
    ui.heading("Output");
    Grid::new("output").num_columns(2).show(ui, |ui| {
        ui.label("width");
        ui.add(Slider::new(&mut settings.size[0], 0.0..=MAX_OUTPUT).suffix(" px"));
        ui.end_row();

        ui.label("height");
        ui.add(Slider::new(&mut settings.size[1], 0.0..=MAX_OUTPUT).suffix(" px"));
        ui.end_row();

        ui.label("position");
        ui.horizontal(|ui| {
            ui.add(DragValue::new(&mut settings.position[0]).prefix("x "));
            ui.add(DragValue::new(&mut settings.position[1]).prefix("y "));
        });
        ui.end_row();
    });
}

/// Vertex selector plus one color picker per vertex, laid out like the lattice.
fn tint_controls(ui: &mut Ui, settings: &mut EditorSettings) {
    ui.heading("Vertex tints");

    let mut selected = settings.selected_index();
    ui.add(Slider::new(&mut selected, 0..=VERTEX_COUNT - 1).text("vertex"));
    settings.select_vertex(selected);

    let mut color = settings.selected_color();
    ui.horizontal(|ui| {
        ui.label("selected");
        if ui.color_edit_button_rgba_unmultiplied(&mut color).changed() {
            settings.set_selected_color(color);
        }
    });

    Grid::new("vertex_tints").show(ui, |ui| {
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                let index = row * GRID_SIZE + col;
                let response = ui
                    .color_edit_button_rgba_unmultiplied(&mut settings.colors[index])
                    .on_hover_text(format!("vertex {index}"));
                if response.clicked() {
                    settings.select_vertex(index);
                }
            }
            ui.end_row();
        }
    });

    if ui.button("Reset tints").clicked() {
        settings.reset_colors();
    }
}

fn status_line(ui: &mut Ui, status: &PanelStatus) {
    let (width, height) = status.image_size;
    match &status.error {
        Some(error) => {
            ui.colored_label(Color32::LIGHT_RED, error);
        }
        None if status.inverted => {
            ui.colored_label(
                Color32::YELLOW,
                "output is smaller than the margins; middle band inverted",
            );
        }
        None => {
            ui.label(format!("source {width}x{height}"));
        }
    }
}
