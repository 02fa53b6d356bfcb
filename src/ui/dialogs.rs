use crate::viewer::{Command, Dialog, MenuItem};

const CONTROLS: &[(&str, &str)] = &[
    ("Left drag", "Rotate (Arcball, Model, Sun, Environment) or look (Fly)"),
    ("Wheel", "Zoom"),
    ("W / S", "Fly forward / backward"),
    ("A / D", "Fly left / right"),
    ("Q / Z", "Fly up / down"),
    ("Arrow keys", "Look around in fly mode"),
    ("Ctrl-O", "Open geometry"),
    ("Ctrl-W", "Close window"),
];

pub fn help_overlay(ctx: &egui::Context, commands: &mut Vec<Command>) {
    let mut open = true;
    egui::Window::new("Controls")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::LEFT_TOP, [12.0, 36.0])
        .show(ctx, |ui| {
            egui::Grid::new("controls_grid").striped(true).show(ui, |ui| {
                for (input, action) in CONTROLS {
                    ui.strong(*input);
                    ui.label(*action);
                    ui.end_row();
                }
            });
        });
    if !open {
        commands.push(Command::Menu(MenuItem::HelpKeys));
    }
}

pub fn dialog_window(
    ctx: &egui::Context,
    app_name: &str,
    dialog: &Dialog,
    commands: &mut Vec<Command>,
) {
    egui::Window::new(dialog.title())
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            match dialog {
                Dialog::About => {
                    ui.heading(format!("{} {}", app_name, env!("CARGO_PKG_VERSION")));
                    ui.label(env!("CARGO_PKG_DESCRIPTION"));
                }
                Dialog::Contact => {
                    ui.label("Questions and bug reports are welcome on the project's issue tracker.");
                }
                Dialog::Message { body, .. } => {
                    ui.label(body.as_str());
                }
            }
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                commands.push(Command::CloseDialog);
            }
        });
}
