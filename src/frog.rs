use bevy::prelude::*;
use bevy::sprite::Anchor;

use crate::{
    animation::{AnimationFinishedEvent, AnimationType, SheetId},
    bat::Bat,
    config::{FrogConfig, GameConfig},
    physics::{frame_scaled, push_out, Collider, PhysicsSet},
    playfield::Playfield,
    resources::{GameState, RoundEntity},
};

pub struct FrogPlugin;

impl Plugin for FrogPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Playing), spawn_frog)
            .add_systems(
                Update,
                (
                    (frog_track_system, frog_idle_system).chain(),
                    frog_blocks_bat_system
                        .after(PhysicsSet)
                        .run_if(in_state(GameState::Playing)),
                ),
            )
            .add_observer(on_frog_animation_finished);
    }
}

/// Where the frog's feet are on the tall tongue frames.
const TONGUE_ANCHOR: Vec2 = Vec2::new(0.0, -0.34);

/// Rides a lily pad back and forth across the pond. Times are seconds
/// since the frog appeared.
#[derive(Component)]
pub struct Frog {
    pub spawned_at: f32,
    pub last_tongue: f32,
    pub last_croak: f32,
    pub pad: Entity,
}

#[derive(Component)]
pub struct LilyPad;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrogAction {
    Tongue,
    Croak,
}

/// What an idle frog should do next, if anything. The tongue wins when both
/// are due.
pub fn next_frog_action(now: f32, last_tongue: f32, last_croak: f32, config: &FrogConfig) -> Option<FrogAction> {
    if now - last_tongue > config.tongue_interval {
        Some(FrogAction::Tongue)
    } else if now - last_croak > config.croak_interval {
        Some(FrogAction::Croak)
    } else {
        None
    }
}

/// 0 at the start of each period, 1 halfway through, back to 0 at the end.
pub fn ping_pong(t: f32, period: f32) -> f32 {
    if period <= 0.0 {
        return 0.0;
    }
    let mut position = t.rem_euclid(period) / period;
    if position > 0.5 {
        position = 1.0 - position;
    }
    position * 2.0
}

fn spawn_frog(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    playfield: Res<Playfield>,
) {
    let y = -playfield.px_h(config.frog.depth);

    let pad_scale = playfield.scale_for(SheetId::LilyPad.frame_size().x as f32, config.frog.scale);
    let pad = commands
        .spawn((
            LilyPad,
            RoundEntity,
            AnimationType::LilyPad,
            Transform::from_xyz(0.0, y - playfield.px_h(0.035), 0.2)
                .with_scale(Vec3::splat(pad_scale)),
        ))
        .id();

    let frame = SheetId::FrogIdle.frame_size().as_vec2();
    let scale = playfield.scale_for(frame.x, config.frog.scale);
    commands.spawn((
        Frog {
            spawned_at: time.elapsed_secs(),
            last_tongue: 0.0,
            last_croak: 0.0,
            pad,
        },
        RoundEntity,
        AnimationType::FrogIdle,
        Anchor::CENTER,
        Transform::from_xyz(0.0, y, 0.3).with_scale(Vec3::splat(scale)),
        Collider::circle_in_frame(
            frame,
            frame.x * 0.25,
            Vec2::new(frame.x * 0.25, frame.y * 0.06),
            scale,
        ),
    ));
}

/// Slides the frog and its pad along the track and bobs them on the water.
fn frog_track_system(
    time: Res<Time>,
    config: Res<GameConfig>,
    playfield: Res<Playfield>,
    mut frogs: Query<(&Frog, &mut Transform), Without<LilyPad>>,
    mut pads: Query<&mut Transform, With<LilyPad>>,
) {
    let now = time.elapsed_secs();
    let track = playfield.px_w(config.frog.track_width);
    let bob_speed = playfield.speed(config.frog.bob_speed) * frame_scaled(time.delta_secs());
    for (frog, mut transform) in &mut frogs {
        let t = now - frog.spawned_at;
        let x = ping_pong(t, config.frog.track_period) * track - track / 2.0;
        let bob = bob_speed * (t * 1000.0 * 0.005).sin();

        transform.translation.x = x;
        transform.translation.y += bob;
        if let Ok(mut pad) = pads.get_mut(frog.pad) {
            pad.translation.x = x;
            pad.translation.y += bob;
        }
    }
}

fn frog_idle_system(
    time: Res<Time>,
    config: Res<GameConfig>,
    mut frogs: Query<(&mut Frog, &mut AnimationType, &mut Anchor)>,
) {
    let now = time.elapsed_secs();
    for (mut frog, mut animation, mut anchor) in &mut frogs {
        if *animation != AnimationType::FrogIdle {
            continue;
        }
        let t = now - frog.spawned_at;
        match next_frog_action(t, frog.last_tongue, frog.last_croak, &config.frog) {
            Some(FrogAction::Tongue) => {
                frog.last_tongue = t;
                *animation = AnimationType::FrogTongue;
                *anchor = Anchor(TONGUE_ANCHOR);
            }
            Some(FrogAction::Croak) => {
                frog.last_croak = t;
                *animation = AnimationType::FrogCroak;
            }
            None => {}
        }
    }
}

/// Croaks and tongues play once, then the frog goes back to idling.
fn on_frog_animation_finished(
    trigger: On<AnimationFinishedEvent>,
    mut frogs: Query<(&mut AnimationType, &mut Anchor), With<Frog>>,
) {
    let event = trigger.event();
    let Ok((mut animation, mut anchor)) = frogs.get_mut(event.entity) else {
        return;
    };
    if matches!(event.animation_type, AnimationType::FrogCroak | AnimationType::FrogTongue) {
        *animation = AnimationType::FrogIdle;
        *anchor = Anchor::CENTER;
    }
}

/// The frog is solid: the bat gets pushed out of it.
fn frog_blocks_bat_system(
    frogs: Query<(&Transform, &Collider), (With<Frog>, Without<Bat>)>,
    mut bats: Query<(&mut Transform, &Collider), With<Bat>>,
) {
    for (mut bat_transform, bat_collider) in &mut bats {
        for (frog_transform, frog_collider) in &frogs {
            let bat_centre = bat_collider.centre(bat_transform.translation.truncate());
            let frog_centre = frog_collider.centre(frog_transform.translation.truncate());
            if let Some(delta) = push_out(
                bat_centre,
                bat_collider.radius(),
                frog_centre,
                frog_collider.radius(),
            ) {
                bat_transform.translation.x += delta.x;
                bat_transform.translation.y += delta.y;
            }
        }
    }
}
