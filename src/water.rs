use bevy::prelude::*;
use bevy::sprite::{Anchor, SpriteImageMode};

use crate::{
    animation::{AnimationType, DespawnWhenFinished, SheetId},
    physics::{frame_scaled, Collider, PhysicsSet},
    playfield::Playfield,
    resources::{GameState, RoundEntity},
};

pub struct WaterPlugin;

impl Plugin for WaterPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Playing), spawn_water)
            .add_systems(
                Update,
                (scroll_water_system, splash_system.after(PhysicsSet)),
            );
    }
}

const WATER_IMAGE: &str = "water.png";
/// Texel width of water.png.
const WATER_TEXTURE_WIDTH: f32 = 1024.0;
const TILE_SCALE: f32 = 0.25;
/// Layer tops below the screen centre, back to front.
const LAYER_DEPTHS: [f32; 3] = [0.42, 0.44, 0.46];
const LAYER_Z: [f32; 3] = [-2.0, -0.5, 1.0];

#[derive(Component)]
pub struct WaterLayer {
    pub index: usize,
    /// How far the texture has scrolled, in world units.
    pub tile_offset: f32,
}

/// Strip just under the front layer. Whatever touches it splashes.
#[derive(Component)]
pub struct WaterHitbox;

/// Marks a body that makes a splash the first time it touches the water.
/// Removed once the splash happens.
#[derive(Component)]
pub struct Splashes;

/// Even layers drift one way and odd layers the other.
pub fn layer_direction(index: usize) -> f32 {
    if index % 2 == 0 {
        -1.0
    } else {
        1.0
    }
}

/// Horizontal scroll speed at `elapsed_ms`, swinging back and forth.
pub fn scroll_speed(max_speed: f32, elapsed_ms: f32) -> f32 {
    max_speed * (elapsed_ms * 0.002).sin()
}

/// Sprite x for a layer scrolled by `tile_offset`; always in `(-tile_width, 0]`
/// so the oversized layer keeps covering the screen.
pub fn layer_x(tile_offset: f32, tile_width: f32) -> f32 {
    if tile_width <= 0.0 {
        return 0.0;
    }
    -tile_offset.rem_euclid(tile_width)
}

fn tile_width() -> f32 {
    WATER_TEXTURE_WIDTH * TILE_SCALE
}

fn spawn_water(mut commands: Commands, playfield: Res<Playfield>, asset_server: Res<AssetServer>) {
    let image: Handle<Image> = asset_server.load(WATER_IMAGE);
    let layer_size = Vec2::new(
        playfield.width + 2.0 * tile_width(),
        playfield.px_h(0.2),
    );

    for (index, (&depth, &z)) in LAYER_DEPTHS.iter().zip(LAYER_Z.iter()).enumerate() {
        commands.spawn((
            WaterLayer {
                index,
                tile_offset: 0.0,
            },
            RoundEntity,
            Sprite {
                image: image.clone(),
                custom_size: Some(layer_size),
                image_mode: SpriteImageMode::Tiled {
                    tile_x: true,
                    tile_y: false,
                    stretch_value: TILE_SCALE,
                },
                ..default()
            },
            Anchor::TOP_CENTER,
            Transform::from_xyz(0.0, -playfield.px_h(depth), z),
        ));
    }

    let middle = -playfield.px_h(LAYER_DEPTHS[1]);
    let last = -playfield.px_h(LAYER_DEPTHS[2]);
    let thickness = middle - last;
    commands.spawn((
        WaterHitbox,
        RoundEntity,
        Collider::rect(Vec2::new(playfield.width, thickness)),
        Transform::from_xyz(0.0, last - thickness / 2.0, 0.0),
    ));
}

fn scroll_water_system(
    time: Res<Time>,
    playfield: Res<Playfield>,
    mut layers: Query<(&mut WaterLayer, &mut Transform)>,
) {
    let speed = scroll_speed(playfield.speed(0.003), time.elapsed_secs() * 1000.0)
        * frame_scaled(time.delta_secs());
    for (mut layer, mut transform) in &mut layers {
        layer.tile_offset += speed * layer_direction(layer.index);
        transform.translation.x = layer_x(layer.tile_offset, tile_width());
    }
}

fn splash_system(
    mut commands: Commands,
    playfield: Res<Playfield>,
    hitboxes: Query<(&Transform, &Collider), With<WaterHitbox>>,
    bodies: Query<(Entity, &Transform, &Collider), (With<Splashes>, Without<WaterHitbox>)>,
) {
    let Ok((water_transform, water_collider)) = hitboxes.single() else {
        return;
    };
    let water_position = water_transform.translation.truncate();
    let surface = water_collider.centre(water_position).y + water_collider.half_height();

    for (entity, transform, collider) in &bodies {
        let position = transform.translation.truncate();
        if !collider.overlaps(position, water_collider, water_position) {
            continue;
        }
        commands.entity(entity).remove::<Splashes>();

        let frame = SheetId::Splash.frame_size().as_vec2();
        let scale = playfield.scale_for(frame.x, 0.3);
        let x = collider.centre(position).x;
        commands.spawn((
            RoundEntity,
            AnimationType::WaterSplash,
            DespawnWhenFinished,
            Transform::from_xyz(x, surface + playfield.px_h(0.08), -1.2)
                .with_scale(Vec3::splat(scale)),
        ));
        debug!("Splash at x={:.0}", x);
    }
}
