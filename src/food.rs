use bevy::prelude::*;
use rand::Rng;

use crate::{
    animation::{AnimationType, SheetId},
    bat::Bat,
    config::GameConfig,
    physics::{frame_scaled, Collider, PhysicsSet},
    playfield::Playfield,
    resources::{GameState, RoundEntity},
    sprite_modifications::PopIn,
};

pub struct FoodPlugin;

impl Plugin for FoodPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                spawn_food_system.run_if(in_state(GameState::Playing)),
                hover_system.before(PhysicsSet),
            ),
        );
    }
}

/// A fly the bat can eat. At most one is around at a time.
#[derive(Component)]
pub struct Food;

/// Flies wobble around their spawn point on two sine waves.
#[derive(Component)]
pub struct Hover {
    pub spawned_at: f32,
}

/// Where to put the next fly: somewhere in the quadrant away from the bat,
/// so it has to fly across the screen for it. A bat exactly on an axis
/// counts as being on the negative side, so the fly goes positive.
pub fn opposite_quadrant(bat: Vec2, offset: Vec2) -> Vec2 {
    let x_sign = if bat.x > 0.0 { -1.0 } else { 1.0 };
    let y_sign = if bat.y > 0.0 { -1.0 } else { 1.0 };
    Vec2::new(x_sign * offset.x.abs(), y_sign * offset.y.abs())
}

/// Per-frame wobble at `elapsed_ms` since the fly appeared.
pub fn hover_step(speed: f32, elapsed_ms: f32) -> Vec2 {
    Vec2::new(
        speed * (elapsed_ms * 0.005).sin(),
        speed * (elapsed_ms * 0.01).sin(),
    )
}

fn spawn_food_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    playfield: Res<Playfield>,
    food: Query<(), With<Food>>,
    bats: Query<&Transform, With<Bat>>,
) {
    if !food.is_empty() {
        return;
    }
    let Ok(bat) = bats.single() else {
        return;
    };

    let mut rng = rand::thread_rng();
    let offset = Vec2::new(
        rng.gen_range(0.0..=playfield.px_w(config.food.spawn_range_x)),
        rng.gen_range(0.0..=playfield.px_h(config.food.spawn_range_y)),
    );
    let position = opposite_quadrant(bat.translation.truncate(), offset);

    let frame = SheetId::Fly.frame_size().as_vec2();
    let scale = playfield.scale_for(frame.x, config.food.scale);
    let hitbox = Collider::circle_in_frame(
        frame,
        frame.x * 0.06,
        Vec2::new(frame.x * 0.04, frame.y * 0.08),
        scale,
    );

    commands.spawn((
        Food,
        RoundEntity,
        Hover {
            spawned_at: time.elapsed_secs(),
        },
        AnimationType::FlyIdle,
        Transform::from_translation(position.extend(4.0)).with_scale(Vec3::splat(scale * 0.25)),
        PopIn::new(scale, 0.3),
        hitbox,
    ));
    debug!("Fly spawned at {:?}", position);
}

fn hover_system(
    time: Res<Time>,
    config: Res<GameConfig>,
    playfield: Res<Playfield>,
    mut query: Query<(&mut Transform, &Hover), With<Food>>,
) {
    let speed = playfield.speed(config.food.hover_speed) * frame_scaled(time.delta_secs());
    let now = time.elapsed_secs();
    for (mut transform, hover) in &mut query {
        let elapsed_ms = (now - hover.spawned_at) * 1000.0;
        let step = hover_step(speed, elapsed_ms);
        transform.translation.x += step.x;
        transform.translation.y += step.y;
    }
}
