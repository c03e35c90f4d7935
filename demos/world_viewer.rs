use macroquad::prelude::*;
use macroquad_tile_world::render::overlay::{draw_collision_overlay, draw_zone_overlay};
use macroquad_tile_world::{EngineConfig, MacroquadSurface, Map, Viewport};
use tracing_subscriber::EnvFilter;

const MAP_PATH: &str = "assets/world.tmx";
const CONFIG_PATH: &str = "assets/engine.json";
const WALK_SPEED: f32 = 120.0; // px/s

fn window_conf() -> Conf {
    Conf {
        window_title: "Tile World".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

fn load_config() -> EngineConfig {
    match EngineConfig::load(CONFIG_PATH) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!("{err:#}; using default engine config");
            EngineConfig::default()
        }
    }
}

fn input_dir() -> Vec2 {
    let mut dir = Vec2::ZERO;
    if is_key_down(KeyCode::Left) {
        dir.x -= 1.0;
    }
    if is_key_down(KeyCode::Right) {
        dir.x += 1.0;
    }
    if is_key_down(KeyCode::Up) {
        dir.y -= 1.0;
    }
    if is_key_down(KeyCode::Down) {
        dir.y += 1.0;
    }
    dir.normalize_or_zero()
}

/// Move axis by axis so walls can be slid along.
fn step(map: &Map, pos: Vec2, delta: Vec2) -> Vec2 {
    let mut pos = pos;
    let tried = vec2(pos.x + delta.x, pos.y);
    if !map.is_solid_at_pixel(tried.x, tried.y) {
        pos = tried;
    }
    let tried = vec2(pos.x, pos.y + delta.y);
    if !map.is_solid_at_pixel(tried.x, tried.y) {
        pos = tried;
    }
    pos
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = load_config();
    let mut map = Map::load_or_placeholder(MAP_PATH, &cfg.loader);
    let mut camera = Viewport::from_config(&cfg.viewport, &map);
    let mut surface = MacroquadSurface::new();

    let (tw, th) = map.tile_size();
    let mut player = vec2(tw as f32 * 1.5, th as f32 * 1.5);
    camera.follow(player);

    let mut show_collision = cfg.debug.collision_overlay;
    let mut show_zones = cfg.debug.zone_overlay;
    let mut decoration = true;

    loop {
        let dt = get_frame_time();

        if is_key_pressed(KeyCode::C) {
            show_collision = !show_collision;
        }
        if is_key_pressed(KeyCode::Z) {
            show_zones = !show_zones;
        }
        if is_key_pressed(KeyCode::H) {
            decoration = !decoration;
            let names: Vec<String> = map
                .layers()
                .with_role(macroquad_tile_world::LayerRole::Decoration)
                .map(|l| l.name.clone())
                .collect();
            for name in names {
                map.set_layer_visible(&name, decoration);
            }
        }
        if is_key_pressed(KeyCode::Equal) {
            camera.zoom_in();
        }
        if is_key_pressed(KeyCode::Minus) {
            camera.zoom_out();
        }
        if is_key_pressed(KeyCode::Key0) {
            camera.reset_zoom();
        }

        player = step(&map, player, input_dir() * WALK_SPEED * dt);
        camera.set_output_size(vec2(screen_width(), screen_height()));
        camera.update(dt, player);

        clear_background(BLACK);

        surface.set_view(&camera);
        let stats = map.draw(&mut surface, Some(&camera));
        if show_collision {
            draw_collision_overlay(&map, Some(&camera), &mut surface);
        }
        if show_zones {
            draw_zone_overlay(&map, Some(&camera), &mut surface);
        }

        let p = camera.world_to_screen(player);
        draw_circle(p.x, p.y, 5.0 * camera.zoom(), YELLOW);

        surface.reset_view();
        let zone = map.zone_at_pixel(player.x, player.y);
        draw_text(
            &format!(
                "FPS: {}  tiles: {} (skipped {})  zone: {}  zoom: {:.2}",
                get_fps(),
                stats.drawn,
                stats.skipped,
                zone,
                camera.zoom()
            ),
            20.0,
            30.0,
            24.0,
            WHITE,
        );
        draw_text("arrows move, C collision, Z zones, H decoration, +/- zoom", 20.0, 56.0, 20.0, GRAY);

        next_frame().await;
    }
}
