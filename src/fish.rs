use bevy::prelude::*;
use bevy::sprite::Anchor;
use rand::Rng;

use crate::{
    animation::{AnimationType, SheetId},
    bat::DamageSource,
    config::{FishConfig, GameConfig},
    physics::{AffectedByGravity, Collider, PhysicsSet, Velocity},
    playfield::Playfield,
    resources::{GameState, RoundEntity},
};

pub struct FishPlugin;

impl Plugin for FishPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Playing), reset_fish)
            .add_systems(
                Update,
                (
                    spawn_fish_system.run_if(resource_exists::<FishSpawnTimer>),
                    fish_leap_system.before(PhysicsSet),
                    cull_spit_system.after(PhysicsSet),
                ),
            );
    }
}

/// How far fish lean out of the water, in radians.
const LEAN: f32 = 0.453786;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FishColor {
    Yellow,
}

impl FishColor {
    pub fn animation(self) -> AnimationType {
        match self {
            FishColor::Yellow => AnimationType::FishSwim,
        }
    }

    pub fn sheet(self) -> SheetId {
        match self {
            FishColor::Yellow => SheetId::FishYellow,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Rise, hold, sink. Times in seconds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FishTiming {
    pub up: f32,
    pub stay: f32,
    pub down: f32,
}

impl FishTiming {
    pub fn from_config(config: &FishConfig) -> Self {
        FishTiming {
            up: config.up_time,
            stay: config.stay_time,
            down: config.down_time,
        }
    }

    pub fn total(&self) -> f32 {
        self.up + self.stay + self.down
    }

    /// How far out of the water the fish is, 0 to 1, `t` seconds after it
    /// spawned. `None` once the leap is over.
    pub fn height_fraction(&self, t: f32) -> Option<f32> {
        if t > self.total() {
            return None;
        }
        if t <= self.up {
            return Some(if self.up > 0.0 { (t / self.up).max(0.0) } else { 1.0 });
        }
        if t < self.up + self.stay || self.down <= 0.0 {
            return Some(1.0);
        }
        Some((self.total() - t) / self.down)
    }
}

#[derive(Component)]
pub struct Fish {
    pub facing: Facing,
    pub timing: FishTiming,
    pub spawned_at: f32,
    pub base_y: f32,
    pub rise: f32,
    pub spit: Entity,
    pub spit_launched: bool,
}

/// Waits hidden next to its fish until the fish reaches the top of its leap.
#[derive(Component)]
pub struct Spit;

#[derive(Resource)]
pub struct FishSpawnTimer(pub Timer);

/// Where and how deep the previous fish jumped. Fish alternate sides and
/// alternate between in front of and behind the middle water layer.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct LastFish(pub Option<(f32, f32)>);

impl LastFish {
    /// Facing and z for the next fish. A fish that jumped on the right
    /// sends the next one in from the left, facing right.
    pub fn next(&self) -> (Facing, f32) {
        match self.0 {
            Some((x, z)) => (
                if x > 0.0 { Facing::Right } else { Facing::Left },
                if z == 0.0 { -1.0 } else { 0.0 },
            ),
            None => (Facing::Left, -1.0),
        }
    }
}

/// Launch velocity for a spit. `spread` scales the horizontal speed and
/// `steepness` how much faster it goes up than sideways.
pub fn spit_velocity(facing: Facing, speed: f32, spread: f32, steepness: f32) -> Vec2 {
    let vx = facing.sign() * speed * spread;
    Vec2::new(vx, vx.abs() * steepness)
}

fn reset_fish(mut commands: Commands, config: Res<GameConfig>) {
    commands.insert_resource(FishSpawnTimer(Timer::from_seconds(
        config.fish.spawn_interval,
        TimerMode::Repeating,
    )));
    commands.insert_resource(LastFish::default());
}

fn spawn_fish_system(
    mut commands: Commands,
    mut timer: ResMut<FishSpawnTimer>,
    mut last_fish: ResMut<LastFish>,
    time: Res<Time>,
    config: Res<GameConfig>,
    playfield: Res<Playfield>,
) {
    timer.0.tick(time.delta());
    if !timer.0.just_finished() {
        return;
    }

    let (facing, z) = last_fish.next();
    let cam = playfield.camera_box();
    let quarter = cam.width * 0.25;
    let mut rng = rand::thread_rng();
    let x = match facing {
        Facing::Right => rng.gen_range(cam.left..=cam.left + quarter),
        Facing::Left => rng.gen_range(cam.right - quarter..=cam.right),
    };
    let y = -playfield.px_h(config.fish.spawn_depth);
    last_fish.0 = Some((x, z));

    let color = FishColor::Yellow;
    let scale = playfield.scale_for(color.sheet().frame_size().x as f32, config.fish.scale);

    let spit_frame = SheetId::Spit.frame_size().as_vec2();
    let spit_scale = playfield.scale_for(spit_frame.x, config.fish.spit_scale);
    let spit = commands
        .spawn((
            Spit,
            RoundEntity,
            AnimationType::SpitIdle,
            Sprite {
                flip_x: facing == Facing::Left,
                ..default()
            },
            Visibility::Hidden,
            Transform::from_xyz(
                x + facing.sign() * playfield.px_w(0.11),
                y + playfield.px_h(0.11),
                3.0,
            )
            .with_scale(Vec3::splat(spit_scale)),
            Collider::circle(spit_frame.x * 0.4 * spit_scale),
        ))
        .id();

    let (anchor, lean) = match facing {
        Facing::Right => (Anchor::TOP_LEFT, LEAN),
        Facing::Left => (Anchor::TOP_RIGHT, -LEAN),
    };
    commands.spawn((
        Fish {
            facing,
            timing: FishTiming::from_config(&config.fish),
            spawned_at: time.elapsed_secs(),
            base_y: y,
            rise: playfield.px_h(config.fish.rise),
            spit,
            spit_launched: false,
        },
        RoundEntity,
        color.animation(),
        Sprite {
            flip_x: facing == Facing::Left,
            ..default()
        },
        anchor,
        Transform::from_xyz(x, y, z)
            .with_rotation(Quat::from_rotation_z(lean))
            .with_scale(Vec3::splat(scale)),
    ));
    debug!("{:?} fish jumping at x={:.0} facing {:?}", color, x, facing);
}

/// Moves each fish along its leap and lets the spit go once it is up.
pub fn fish_leap_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    playfield: Res<Playfield>,
    mut leaping: Query<(Entity, &mut Fish, &mut Transform), Without<Spit>>,
    mut spits: Query<(&mut Visibility, &mut AnimationType), With<Spit>>,
) {
    let now = time.elapsed_secs();
    let mut rng = rand::thread_rng();
    for (entity, mut fish, mut transform) in &mut leaping {
        let t = now - fish.spawned_at;
        let Some(height) = fish.timing.height_fraction(t) else {
            commands.entity(entity).despawn();
            continue;
        };
        transform.translation.y = fish.base_y + height * fish.rise;

        if fish.spit_launched || t < fish.timing.up {
            continue;
        }
        fish.spit_launched = true;
        let Ok((mut visibility, mut animation)) = spits.get_mut(fish.spit) else {
            continue;
        };
        *visibility = Visibility::Visible;
        *animation = AnimationType::SpitLaunch;
        let velocity = spit_velocity(
            fish.facing,
            playfield.speed(config.fish.spit_speed),
            rng.gen_range(0.75..=1.25),
            rng.gen_range(1.4..=2.2),
        );
        commands.entity(fish.spit).insert((
            Velocity(velocity),
            AffectedByGravity,
            DamageSource {
                amount: config.fish.spit_damage,
                destroy_on_hit: true,
            },
        ));
    }
}

fn cull_spit_system(
    mut commands: Commands,
    playfield: Res<Playfield>,
    spits: Query<(Entity, &Transform), With<Spit>>,
) {
    let bottom = playfield.camera_box().bottom;
    for (entity, transform) in &spits {
        if transform.translation.y < bottom {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const TIMING: FishTiming = FishTiming {
        up: 2.0,
        stay: 0.1,
        down: 2.0,
    };

    #[test]
    fn leap_rises_holds_and_sinks() {
        assert_eq!(TIMING.height_fraction(0.0), Some(0.0));
        assert_eq!(TIMING.height_fraction(1.0), Some(0.5));
        assert_eq!(TIMING.height_fraction(2.05), Some(1.0));
        let sinking = TIMING.height_fraction(3.1).unwrap();
        assert!((sinking - 0.5).abs() < 1e-5);
        assert_eq!(TIMING.height_fraction(4.2), None);
    }

    #[test]
    fn fish_alternate_sides_and_depths() {
        assert_eq!(LastFish(None).next(), (Facing::Left, -1.0));
        assert_eq!(LastFish(Some((300.0, -1.0))).next(), (Facing::Right, 0.0));
        assert_eq!(LastFish(Some((-300.0, 0.0))).next(), (Facing::Left, -1.0));
    }

    #[test]
    fn spit_flies_up_and_forwards() {
        let right = spit_velocity(Facing::Right, 100.0, 1.0, 2.0);
        assert_eq!(right, Vec2::new(100.0, 200.0));
        let left = spit_velocity(Facing::Left, 100.0, 0.75, 1.4);
        assert_eq!(left.x, -75.0);
        assert!(left.y > 0.0);
    }

    #[test]
    fn fish_after_a_right_side_jump_comes_from_the_left_quarter() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(GameConfig::default())
            .insert_resource(Playfield::new(1280.0, 720.0))
            .insert_resource(FishSpawnTimer(Timer::from_seconds(2.0, TimerMode::Repeating)))
            .insert_resource(LastFish(Some((300.0, -1.0))))
            .add_systems(Update, spawn_fish_system);

        advance_to(&mut app, 2.1);

        let mut jumping = app.world_mut().query::<(&Fish, &Transform)>();
        let (fish, transform) = jumping.single(app.world()).unwrap();
        assert_eq!(fish.facing, Facing::Right);
        assert!((-640.0..=-320.0).contains(&transform.translation.x));
        assert_eq!(transform.translation.z, 0.0);

        let spit = fish.spit;
        assert!(app.world().get::<Spit>(spit).is_some());
        assert_eq!(app.world().get::<Visibility>(spit), Some(&Visibility::Hidden));
        assert_eq!(
            app.world().resource::<LastFish>().0,
            Some((transform.translation.x, 0.0))
        );
    }

    fn advance_to(app: &mut App, seconds: f32) {
        let now = app.world().resource::<Time>().elapsed_secs();
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(seconds - now));
        app.world_mut().run_schedule(Update);
    }

    #[test]
    fn spit_launches_at_the_top_and_outlives_the_fish() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(GameConfig::default())
            .insert_resource(Playfield::new(1280.0, 720.0))
            .add_systems(Update, fish_leap_system);

        let spit = app
            .world_mut()
            .spawn((Spit, AnimationType::SpitIdle, Visibility::Hidden))
            .id();
        let fish = app
            .world_mut()
            .spawn((
                Fish {
                    facing: Facing::Right,
                    timing: TIMING,
                    spawned_at: 0.0,
                    base_y: -388.8,
                    rise: 72.0,
                    spit,
                    spit_launched: false,
                },
                Transform::from_xyz(0.0, -388.8, 0.0),
            ))
            .id();

        advance_to(&mut app, 1.0);
        assert!(app.world().get::<Velocity>(spit).is_none());
        let y = app.world().get::<Transform>(fish).unwrap().translation.y;
        assert!((y - (-352.8)).abs() < 0.01);

        advance_to(&mut app, 2.05);
        let velocity = app.world().get::<Velocity>(spit).unwrap().0;
        assert!(velocity.x > 0.0 && velocity.y > 0.0);
        assert_eq!(app.world().get::<Visibility>(spit), Some(&Visibility::Visible));
        assert_eq!(app.world().get::<AnimationType>(spit), Some(&AnimationType::SpitLaunch));
        assert!(app.world().get::<DamageSource>(spit).is_some());

        advance_to(&mut app, 4.5);
        assert!(app.world().get_entity(fish).is_err());
        assert!(app.world().get_entity(spit).is_ok());
    }
}
