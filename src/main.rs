//! geoviz - desktop viewer for point clouds, line sets and triangle meshes
//!
//! Opens `.off`, `.xyz`, `.xyzn` and `.xyzrgb` files, picks lit or unlit
//! shading per geometry and offers lighting profiles, environment maps and
//! material presets in a settings panel.

mod app;
mod config;
mod geometry;
mod lighting;
mod material;
mod render;
mod ui;
mod viewer;

use clap::Parser;

use config::Args;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let (config, initial_file) = match Args::parse().into_config() {
        Ok(parsed) => parsed,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };
    log::info!("Resources: {}", config.resource_dir.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_title(config.title.as_str())
            .with_drag_and_drop(true),
        ..Default::default()
    };

    let title = config.title.clone();
    let result = eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(app::App::new(&cc.egui_ctx, &config, initial_file)))),
    );
    if let Err(err) = result {
        log::error!("Failed to run: {}", err);
        std::process::exit(1);
    }

    log::info!("Goodbye!");
}
