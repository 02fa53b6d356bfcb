//! egui widgets. Everything here reads the viewer's state and returns
//! [`Command`]s; nothing is mutated directly.

mod dialogs;
mod panel;

use egui::{Color32, Key, KeyboardShortcut, Modifiers, PointerButton, Sense};

use crate::render::ScreenPrimitive;
use crate::viewer::{Command, Dialog, MenuItem, SettingsPanel};

const OPEN_SHORTCUT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::O);
const CLOSE_SHORTCUT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::W);

/// Camera distance per point of wheel scroll.
const ZOOM_PER_POINT: f32 = 0.01;

/// Read-only view of what one frame draws.
pub struct FrameState<'a> {
    pub app_name: &'a str,
    pub settings: &'a SettingsPanel,
    pub dialog: Option<&'a Dialog>,
    pub geometry_count: usize,
    pub scene: &'a [ScreenPrimitive],
    pub draw_time: &'a str,
}

pub struct UiOutput {
    pub commands: Vec<Command>,
    /// 3D view size in physical pixels.
    pub viewport_size: (u32, u32),
}

pub fn show(ctx: &egui::Context, state: &FrameState) -> UiOutput {
    let mut commands = Vec::new();

    if ctx.input_mut(|i| i.consume_shortcut(&OPEN_SHORTCUT)) {
        commands.push(Command::Menu(MenuItem::FileOpen));
    }
    if ctx.input_mut(|i| i.consume_shortcut(&CLOSE_SHORTCUT)) {
        commands.push(Command::Menu(MenuItem::FileClose));
    }

    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        menu_bar(ctx, ui, state.settings, &mut commands);
    });

    if state.settings.visible {
        egui::SidePanel::right("settings_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    panel::settings_panel(ui, state.settings, state.draw_time, &mut commands);
                });
            });
    }

    let viewport_size = egui::CentralPanel::default()
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| viewport(ui, state, &mut commands))
        .inner;

    if state.settings.help_visible {
        dialogs::help_overlay(ctx, &mut commands);
    }
    if let Some(dialog) = state.dialog {
        dialogs::dialog_window(ctx, state.app_name, dialog, &mut commands);
    }

    UiOutput {
        commands,
        viewport_size,
    }
}

fn menu_bar(
    ctx: &egui::Context,
    ui: &mut egui::Ui,
    settings: &SettingsPanel,
    commands: &mut Vec<Command>,
) {
    egui::menu::bar(ui, |ui| {
        ui.menu_button("File", |ui| {
            let open = egui::Button::new("Open...").shortcut_text(ctx.format_shortcut(&OPEN_SHORTCUT));
            menu_item(ui, open, MenuItem::FileOpen, commands);
            let export = egui::Button::new("Export Current Image...");
            menu_item(ui, export, MenuItem::FileExportRgb, commands);
            ui.separator();
            let close = egui::Button::new("Close").shortcut_text(ctx.format_shortcut(&CLOSE_SHORTCUT));
            menu_item(ui, close, MenuItem::FileClose, commands);
        });
        ui.menu_button("Settings", |ui| {
            let panel = egui::Button::new("Lighting & Materials").selected(settings.visible);
            menu_item(ui, panel, MenuItem::SettingsLightAndMaterials, commands);
        });
        ui.menu_button("Help", |ui| {
            let keys = egui::Button::new("Show Controls").selected(settings.help_visible);
            menu_item(ui, keys, MenuItem::HelpKeys, commands);
            ui.separator();
            menu_item(ui, egui::Button::new("About"), MenuItem::HelpAbout, commands);
            menu_item(ui, egui::Button::new("Contact"), MenuItem::HelpContact, commands);
        });
    });
}

fn menu_item(ui: &mut egui::Ui, button: egui::Button<'_>, item: MenuItem, commands: &mut Vec<Command>) {
    if ui.add(button).clicked() {
        commands.push(Command::Menu(item));
        ui.close_menu();
    }
}

fn viewport(ui: &mut egui::Ui, state: &FrameState, commands: &mut Vec<Command>) -> (u32, u32) {
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

    let [r, g, b] = state.settings.background_color;
    let fill = if state.settings.show_skybox {
        Color32::from_gray(96)
    } else {
        egui::Rgba::from_rgb(r, g, b).into()
    };
    ui.painter().rect_filled(rect, 0.0, fill);
    paint_scene(ui, rect, state.scene);
    if state.geometry_count == 0 {
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "Open a geometry file (Ctrl-O) or drop one here",
            egui::FontId::proportional(16.0),
            Color32::from_gray(120),
        );
    }

    let delta = if response.dragged_by(PointerButton::Primary) {
        response.drag_delta()
    } else {
        egui::Vec2::ZERO
    };
    let scroll = if response.hovered() {
        ui.input(|i| i.smooth_scroll_delta.y)
    } else {
        0.0
    };
    if delta != egui::Vec2::ZERO || scroll != 0.0 {
        commands.push(Command::ViewportDrag {
            delta: glam::Vec2::new(delta.x, delta.y),
            zoom: scroll * ZOOM_PER_POINT,
        });
    }

    let pixels = rect.size() * ui.ctx().pixels_per_point();
    (pixels.x.round() as u32, pixels.y.round() as u32)
}

fn paint_scene(ui: &egui::Ui, rect: egui::Rect, scene: &[ScreenPrimitive]) {
    let painter = ui.painter_at(rect);
    let pixels_per_point = ui.ctx().pixels_per_point();
    let to_screen = |at: glam::Vec2| rect.min + egui::vec2(at.x, at.y) * rect.size();
    let color = |c: glam::Vec3| Color32::from(egui::Rgba::from_rgb(c.x, c.y, c.z));
    for primitive in scene {
        match *primitive {
            ScreenPrimitive::Point { at, size, color: c } => {
                let square = egui::Rect::from_center_size(
                    to_screen(at),
                    egui::Vec2::splat(size / pixels_per_point),
                );
                painter.rect_filled(square, 0.0, color(c));
            }
            ScreenPrimitive::Segment { from, to, color: c } => {
                painter.line_segment([to_screen(from), to_screen(to)], egui::Stroke::new(1.0, color(c)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_frame(state: &FrameState, input: egui::RawInput) -> UiOutput {
        let ctx = egui::Context::default();
        let mut output = None;
        let _ = ctx.run(input, |ctx| output = Some(show(ctx, state)));
        output.unwrap()
    }

    fn screen(width: f32, height: f32) -> egui::RawInput {
        egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(width, height),
            )),
            ..Default::default()
        }
    }

    #[test]
    fn idle_frame_emits_nothing() {
        let settings = SettingsPanel::default();
        let state = FrameState {
            app_name: "geoviz",
            settings: &settings,
            dialog: Some(&Dialog::About),
            geometry_count: 0,
            scene: &[],
            draw_time: "1.0 ms",
        };
        let output = run_frame(&state, screen(800.0, 600.0));
        assert!(output.commands.is_empty());
        assert!(output.viewport_size.0 > 0 && output.viewport_size.0 < 800);
    }

    #[test]
    fn hidden_panel_gives_viewport_full_width() {
        let settings = SettingsPanel {
            visible: false,
            ..SettingsPanel::default()
        };
        let state = FrameState {
            app_name: "geoviz",
            settings: &settings,
            dialog: None,
            geometry_count: 1,
            scene: &[],
            draw_time: "",
        };
        let output = run_frame(&state, screen(800.0, 600.0));
        assert_eq!(output.viewport_size.0, 800);
    }

    #[test]
    fn scene_points_are_painted() {
        let settings = SettingsPanel {
            visible: false,
            ..SettingsPanel::default()
        };
        let scene = [ScreenPrimitive::Point {
            at: glam::Vec2::splat(0.5),
            size: 4.0,
            color: glam::Vec3::X,
        }];
        let state = FrameState {
            app_name: "geoviz",
            settings: &settings,
            dialog: None,
            geometry_count: 1,
            scene: &scene,
            draw_time: "",
        };
        let ctx = egui::Context::default();
        let output = ctx.run(screen(800.0, 600.0), |ctx| {
            show(ctx, &state);
        });
        let painted = output.shapes.iter().any(|clipped| {
            matches!(&clipped.shape, egui::Shape::Rect(rect) if rect.fill == Color32::RED)
        });
        assert!(painted);
    }

    #[test]
    fn ctrl_o_opens_file_dialog() {
        let settings = SettingsPanel::default();
        let state = FrameState {
            app_name: "geoviz",
            settings: &settings,
            dialog: None,
            geometry_count: 0,
            scene: &[],
            draw_time: "",
        };
        let mut input = screen(800.0, 600.0);
        input.modifiers = Modifiers::COMMAND;
        input.events.push(egui::Event::Key {
            key: Key::O,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: Modifiers::COMMAND,
        });
        let output = run_frame(&state, input);
        assert_eq!(output.commands, vec![Command::Menu(MenuItem::FileOpen)]);
    }
}
