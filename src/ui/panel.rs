use glam::Vec3;

use crate::lighting::{ProfileSelection, LIGHTING_PROFILES};
use crate::material::{prefab_materials, MaterialType};
use crate::viewer::settings::{IBL_INTENSITY_RANGE, POINT_SIZE_RANGE, SUN_INTENSITY_RANGE};
use crate::viewer::{Command, MouseMode, SettingsPanel};

pub fn settings_panel(
    ui: &mut egui::Ui,
    settings: &SettingsPanel,
    draw_time: &str,
    commands: &mut Vec<Command>,
) {
    egui::CollapsingHeader::new("View controls")
        .default_open(true)
        .show(ui, |ui| view_controls(ui, settings, commands));

    lighting_profile(ui, settings, commands);

    let advanced = egui::CollapsingHeader::new("Advanced lighting")
        .open(Some(settings.advanced_open))
        .show(ui, |ui| advanced_lighting(ui, settings, commands));
    if advanced.header_response.clicked() {
        commands.push(Command::SetAdvancedOpen(!settings.advanced_open));
    }

    egui::CollapsingHeader::new("Material settings")
        .default_open(true)
        .show(ui, |ui| material_settings(ui, settings, commands));

    ui.separator();
    ui.weak(draw_time);
}

fn view_controls(ui: &mut egui::Ui, settings: &SettingsPanel, commands: &mut Vec<Command>) {
    ui.label("Mouse controls");
    ui.horizontal_wrapped(|ui| {
        for mode in MouseMode::ALL {
            if ui
                .selectable_label(settings.mouse_mode == mode, mode.label())
                .clicked()
                && settings.mouse_mode != mode
            {
                commands.push(Command::SetMouseMode(mode));
            }
        }
    });

    let mut show_skybox = settings.show_skybox;
    if ui.checkbox(&mut show_skybox, "Show skymap").changed() {
        commands.push(Command::SetShowSkybox(show_skybox));
    }

    ui.add_enabled_ui(settings.background_editable(), |ui| {
        ui.horizontal(|ui| {
            let mut color = settings.background_color;
            if ui.color_edit_button_rgb(&mut color).changed() {
                commands.push(Command::SetBackgroundColor(color));
            }
            ui.label("Background color");
        });
    });

    let mut show_axes = settings.show_axes;
    if ui.checkbox(&mut show_axes, "Show axes").changed() {
        commands.push(Command::SetShowAxes(show_axes));
    }
}

fn lighting_profile(ui: &mut egui::Ui, settings: &SettingsPanel, commands: &mut Vec<Command>) {
    ui.label("Lighting profiles");
    egui::ComboBox::from_id_salt("lighting_profile")
        .width(ui.available_width())
        .selected_text(settings.profile.label())
        .show_ui(ui, |ui| {
            let custom = LIGHTING_PROFILES.len();
            for index in 0..=custom {
                let Some(entry) = ProfileSelection::from_ui_index(index) else {
                    continue;
                };
                if ui
                    .selectable_label(settings.profile.ui_index() == index, entry.label())
                    .clicked()
                {
                    commands.push(Command::SelectProfile(index));
                }
            }
        });
}

fn advanced_lighting(ui: &mut egui::Ui, settings: &SettingsPanel, commands: &mut Vec<Command>) {
    ui.horizontal(|ui| {
        let mut ibl_enabled = settings.ibl_enabled;
        if ui.checkbox(&mut ibl_enabled, "HDR").changed() {
            commands.push(Command::SetIblEnabled(ibl_enabled));
        }
        let mut sun_enabled = settings.sun_enabled;
        if ui.checkbox(&mut sun_enabled, "Sun").changed() {
            commands.push(Command::SetSunEnabled(sun_enabled));
        }
    });

    ui.label("HDR map");
    ui.horizontal(|ui| {
        egui::ComboBox::from_id_salt("environment_map")
            .selected_text(settings.environment_map.as_str())
            .show_ui(ui, |ui| {
                for name in &settings.environment_maps {
                    if ui
                        .selectable_label(&settings.environment_map == name, name.as_str())
                        .clicked()
                    {
                        commands.push(Command::SelectEnvironmentMap(name.clone()));
                    }
                }
            });
        if ui.button("Load skybox").clicked() {
            commands.push(Command::RequestSkyboxFile);
        }
    });

    let mut ibl_intensity = settings.ibl_intensity;
    if ui
        .add(egui::Slider::new(&mut ibl_intensity, IBL_INTENSITY_RANGE).text("Intensity"))
        .changed()
    {
        commands.push(Command::SetIblIntensity(ibl_intensity));
    }

    ui.separator();
    ui.label("Sun (Directional light)");
    let mut sun_intensity = settings.sun_intensity;
    if ui
        .add(egui::Slider::new(&mut sun_intensity, SUN_INTENSITY_RANGE).text("Intensity"))
        .changed()
    {
        commands.push(Command::SetSunIntensity(sun_intensity));
    }

    ui.horizontal(|ui| {
        let mut dir = settings.sun_dir;
        let mut changed = false;
        for value in [&mut dir.x, &mut dir.y, &mut dir.z] {
            changed |= ui
                .add(egui::DragValue::new(value).speed(0.01).range(-1.0..=1.0))
                .changed();
        }
        ui.label("Direction");
        if changed {
            commands.push(Command::SetSunDirection(dir));
        }
    });

    ui.horizontal(|ui| {
        let mut color = settings.sun_color.to_array();
        if ui.color_edit_button_rgb(&mut color).changed() {
            commands.push(Command::SetSunColor(Vec3::from_array(color)));
        }
        ui.label("Color");
    });
}

fn material_settings(ui: &mut egui::Ui, settings: &SettingsPanel, commands: &mut Vec<Command>) {
    ui.horizontal(|ui| {
        ui.label("Type");
        egui::ComboBox::from_id_salt("material_type")
            .selected_text(settings.material_type.label())
            .show_ui(ui, |ui| {
                for material_type in MaterialType::ALL {
                    if ui
                        .selectable_label(settings.material_type == material_type, material_type.label())
                        .clicked()
                    {
                        commands.push(Command::SetMaterialType(material_type));
                    }
                }
            });
    });

    ui.add_enabled_ui(settings.prefab_enabled, |ui| {
        ui.horizontal(|ui| {
            ui.label("Material");
            egui::ComboBox::from_id_salt("material_prefab")
                .selected_text(settings.prefab.as_str())
                .show_ui(ui, |ui| {
                    for name in prefab_materials().keys() {
                        if ui.selectable_label(settings.prefab == *name, *name).clicked() {
                            commands.push(Command::SelectPrefab(name.to_string()));
                        }
                    }
                });
        });
    });

    ui.add_enabled_ui(settings.point_size_enabled, |ui| {
        let mut point_size = settings.point_size;
        if ui
            .add(
                egui::Slider::new(&mut point_size, POINT_SIZE_RANGE)
                    .step_by(1.0)
                    .text("Point size"),
            )
            .changed()
        {
            commands.push(Command::SetPointSize(point_size));
        }
    });
}
