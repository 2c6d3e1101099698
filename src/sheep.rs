use bevy::prelude::*;
use rand::Rng;

use crate::{
    animation::{AnimationType, SheetId},
    bat::{Bat, DamageSource},
    config::GameConfig,
    physics::{AffectedByGravity, Bounce, Collider, LandsOnPlatforms, PhysicsSet, Velocity},
    playfield::Playfield,
    resources::{GameState, RoundEntity, Score},
    scenery::cliff_top,
    water::Splashes,
};

pub struct SheepPlugin;

impl Plugin for SheepPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Playing), reset_sheep)
            .add_systems(
                Update,
                (
                    spawn_sheep_system.run_if(resource_exists::<SheepSpawnTimer>),
                    bump_system
                        .after(PhysicsSet)
                        .run_if(in_state(GameState::Playing)),
                    cull_sheep_system.after(PhysicsSet),
                ),
            );
    }
}

#[derive(Component)]
pub struct Sheep {
    pub half_height: f32,
}

/// The bat already bounced this sheep. Bumped sheep never count as misses.
#[derive(Component)]
pub struct Bumped;

#[derive(Resource)]
pub struct SheepSpawnTimer(pub Timer);

/// New velocity for a sheep that bumps into the bat.
///
/// A sheep hitting level with the bat keeps little of its horizontal speed,
/// one clipping the top or bottom edge is thrown back. Same for the vertical
/// component against horizontal offset.
pub fn deflect(velocity: Vec2, sheep: Vec2, bat: Vec2, bat_radius: f32) -> Vec2 {
    if bat_radius <= 0.0 {
        return -velocity;
    }
    let ratio = ((sheep - bat) / bat_radius).abs().min(Vec2::ONE);
    Vec2::new(-velocity.x * ratio.y, -velocity.y * ratio.x)
}

fn reset_sheep(mut commands: Commands, config: Res<GameConfig>, mut score: ResMut<Score>) {
    *score = Score::default();
    commands.insert_resource(SheepSpawnTimer(Timer::from_seconds(
        config.sheep.spawn_interval,
        TimerMode::Repeating,
    )));
}

fn spawn_sheep_system(
    mut commands: Commands,
    mut timer: ResMut<SheepSpawnTimer>,
    time: Res<Time>,
    config: Res<GameConfig>,
    playfield: Res<Playfield>,
) {
    timer.0.tick(time.delta());
    if !timer.0.just_finished() {
        return;
    }

    let mut rng = rand::thread_rng();
    let from_left = rng.gen_bool(0.5);
    let speed = playfield.speed(rng.gen_range(config.sheep.min_speed..=config.sheep.max_speed));

    let cam = playfield.camera_box();
    let sheep_width = playfield.px_w(config.sheep.scale);
    let x = if from_left {
        cam.left - sheep_width
    } else {
        cam.right + sheep_width
    };
    let y = cliff_top(&playfield) + sheep_width;

    let frame = SheetId::Sheep.frame_size().as_vec2();
    let scale = playfield.scale_for(frame.x, config.sheep.scale);
    let mut hitbox = Collider::circle_in_frame(
        frame,
        frame.x * 0.38,
        Vec2::new(frame.x * 0.12, frame.y * 0.2),
        scale,
    );
    // The sheet faces left; sheep walking right are mirrored
    if from_left {
        hitbox.offset.x = -hitbox.offset.x;
    }

    commands.spawn((
        Sheep {
            half_height: frame.y * scale / 2.0,
        },
        RoundEntity,
        AnimationType::SheepRun,
        Sprite {
            flip_x: from_left,
            ..default()
        },
        Transform::from_xyz(x, y, 2.0).with_scale(Vec3::splat(scale)),
        Velocity(Vec2::new(if from_left { speed } else { -speed }, 0.0)),
        AffectedByGravity,
        LandsOnPlatforms,
        Bounce(config.sheep.bounce),
        hitbox,
        DamageSource {
            amount: config.sheep.damage,
            destroy_on_hit: false,
        },
        Splashes,
    ));
    debug!("Sheep spawned on the {} side", if from_left { "left" } else { "right" });
}

fn bump_system(
    mut commands: Commands,
    mut score: ResMut<Score>,
    bats: Query<(&Transform, &Collider), With<Bat>>,
    mut sheep: Query<(Entity, &Transform, &Collider, &mut Velocity), (With<Sheep>, Without<Bumped>, Without<Bat>)>,
) {
    let Ok((bat_transform, bat_collider)) = bats.single() else {
        return;
    };
    let bat_position = bat_transform.translation.truncate();
    let bat_centre = bat_collider.centre(bat_position);

    for (entity, transform, collider, mut velocity) in &mut sheep {
        let position = transform.translation.truncate();
        if !collider.overlaps(position, bat_collider, bat_position) {
            continue;
        }
        velocity.0 = deflect(velocity.0, collider.centre(position), bat_centre, bat_collider.radius());
        commands.entity(entity).insert(Bumped);
        score.hits += 1;
    }
}

/// Sheep that dropped out of the bottom of the screen are gone for good.
pub fn cull_sheep_system(
    mut commands: Commands,
    mut score: ResMut<Score>,
    playfield: Res<Playfield>,
    sheep: Query<(Entity, &Transform, &Sheep, Has<Bumped>)>,
) {
    let bottom = playfield.camera_box().bottom;
    for (entity, transform, sheep, bumped) in &sheep {
        if transform.translation.y < bottom - sheep.half_height {
            if !bumped {
                score.misses += 1;
            }
            commands.entity(entity).despawn();
        }
    }
}
