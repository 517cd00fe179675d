//! Demo scene: a sliding unlit cone and a spinning lit head, both editable live.

use fred::ui::{drag_euler_degrees, drag_fov_degrees, drag_vec3};
use fred::{AppConfig, Camera, Frame, RawGeometry, Vec3, egui};

const CHECKER_LIGHT: [u8; 4] = [220, 220, 220, 255];
const CHECKER_DARK: [u8; 4] = [60, 60, 60, 255];

fn main() -> fred::Result<()> {
    let config = AppConfig::new().asset_root(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"));

    fred::run_with_config(config, |ctx| {
        let cone_model = ctx
            .load_model("models/cone.obj")
            .unwrap_or_else(|_| ctx.mesh_from_geometry(&RawGeometry::cone(24), "cone"));
        let suzanne_model = ctx
            .load_model("models/suzanne.obj")
            .unwrap_or_else(|_| ctx.mesh_from_geometry(&RawGeometry::sphere(32, 16), "sphere"));

        let cone_texture = ctx
            .load_texture("textures/cone.png")
            .unwrap_or_else(|_| ctx.checkerboard(256, 8, CHECKER_LIGHT, CHECKER_DARK));
        let suzanne_albedo = ctx.texture_or_default("textures/suzanne_albedo.png");
        let suzanne_specular = ctx.texture_or_default("textures/suzanne_specular.png");

        let basic = ctx.load_shader("shaders/basic.vert.wgsl", "shaders/basic.frag.wgsl")?;
        let basic_lit =
            ctx.load_shader("shaders/basic_lit.vert.wgsl", "shaders/basic_lit.frag.wgsl")?;

        let cone = ctx.create_asset(cone_model, cone_texture.clone(), cone_texture, basic);
        let cone = ctx.scene_mut().add_asset(cone);

        let suzanne =
            ctx.create_asset(suzanne_model, suzanne_albedo, suzanne_specular, basic_lit);
        let suzanne = ctx.scene_mut().add_asset(suzanne);

        let mut camera = Camera::new(Vec3::new(4.0, 3.0, 3.0));
        camera.look_at(Vec3::ZERO);
        ctx.scene_mut().add_camera(camera);

        ctx.set_delta_time_multiplier(20.0);

        ctx.scene_mut()
            .set_render_callback(|ui_ctx, scene, clock| {
                egui::Window::new("User Render Callback")
                    .default_pos([420.0, 16.0])
                    .show(ui_ctx, |ui| {
                        ui.label(format!(
                            "Frametime (ms): {:.3}",
                            clock.unscaled_delta_time() * 1000.0
                        ));
                        ui.label(format!("FPS: {:.0}", clock.fps()));

                        ui.separator();
                        ui.label("Camera");
                        if let Some(camera) = scene.active_camera_mut() {
                            drag_vec3(ui, "Translate", &mut camera.position, 0.01);
                            drag_euler_degrees(ui, "Rotate", &mut camera.rotation);
                            drag_fov_degrees(ui, "FOV", &mut camera.fov);
                        }
                    });
            });

        Ok(move |frame: &mut Frame| {
            let dt = frame.delta_time();

            if let Some(asset) = frame.scene.asset_mut(cone) {
                asset.transform.position.x += 0.01 * dt;
            }
            if let Some(asset) = frame.scene.asset_mut(suzanne) {
                let mut euler = asset.euler_degrees();
                euler.x += dt;
                asset.set_euler_degrees(euler);
            }
        })
    })
}
