mod input;
mod timing;

use std::path::PathBuf;
use std::time::Instant;

use crate::config::ViewerConfig;
use crate::geometry::io::AsciiGeometryReader;
use crate::render::HeadlessBackend;
use crate::ui::{self, FrameState};
use crate::viewer::{Command, CommandOutcome, FileRequest, Visualizer};
use input::InputState;
use timing::FrameTiming;

/// File name offered by the export dialog.
const EXPORT_FILE_NAME: &str = "image.png";

pub struct App {
    viewer: Visualizer<HeadlessBackend>,
    input: InputState,
    timing: FrameTiming,
    viewport_size: (u32, u32),
    window_title: String,
}

impl App {
    pub fn new(ctx: &egui::Context, config: &ViewerConfig, initial_file: Option<PathBuf>) -> Self {
        let viewer = Visualizer::new(HeadlessBackend::new(), Box::new(AsciiGeometryReader), config);
        let mut app = Self {
            window_title: viewer.title().to_string(),
            viewer,
            input: InputState::default(),
            timing: FrameTiming::new(Instant::now()),
            viewport_size: (
                config.window_width.max(1.0) as u32,
                config.window_height.max(1.0) as u32,
            ),
        };
        if let Some(path) = initial_file {
            log::info!("Opening {}", path.display());
            app.dispatch(ctx, Command::OpenGeometry(path));
        }
        app
    }

    /// Applies `command` and follows up on its outcome. A picked file turns
    /// into the command that consumes it; a cancelled dialog ends the chain.
    fn dispatch(&mut self, ctx: &egui::Context, command: Command) {
        let mut next = Some(command);
        while let Some(command) = next.take() {
            match self.viewer.apply(command) {
                CommandOutcome::None => {}
                CommandOutcome::PickFile(request) => {
                    next = pick_path(request)
                        .map(|path| request.into_command(path, self.viewport_size));
                }
                CommandOutcome::Close => {
                    log::info!("Close requested, shutting down...");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
        }
    }

    fn frame(&mut self, ctx: &egui::Context) {
        self.timing.update(Instant::now());
        self.viewer.poll_notices();

        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        for path in dropped {
            self.dispatch(ctx, Command::OpenGeometry(path));
        }

        let scene = self.viewer.draw_list(self.viewport_size);
        let output = ui::show(
            ctx,
            &FrameState {
                app_name: env!("CARGO_PKG_NAME"),
                settings: self.viewer.settings(),
                dialog: self.viewer.dialog(),
                geometry_count: self.viewer.geometry_handles().len(),
                scene: &scene,
                draw_time: self.timing.label(),
            },
        );
        self.viewport_size = output.viewport_size;
        for command in output.commands {
            self.dispatch(ctx, command);
        }

        if self.viewer.settings().mouse_mode.wants_tick_events() {
            let movement = self.input.update(ctx);
            self.dispatch(
                ctx,
                Command::Tick {
                    movement,
                    dt: self.timing.frame_dt,
                },
            );
            if movement.any() {
                ctx.request_repaint();
            }
        }

        if self.viewer.title() != self.window_title {
            self.window_title = self.viewer.title().to_string();
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.window_title.clone()));
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.frame(ctx);
    }
}

fn pick_path(request: FileRequest) -> Option<PathBuf> {
    let mut dialog = rfd::FileDialog::new().set_title(request.title());
    for (name, extensions) in request.filters() {
        dialog = dialog.add_filter(*name, *extensions);
    }
    let path = if request.is_save() {
        dialog.set_file_name(EXPORT_FILE_NAME).save_file()
    } else {
        dialog.pick_file()
    };
    if path.is_none() {
        log::debug!("{} cancelled", request.title());
    }
    path
}
