use bevy::prelude::*;

use crate::{
    animation::{AnimationType, SheetId},
    config::{BatConfig, GameConfig},
    food::Food,
    physics::{AffectedByGravity, Collider, PhysicsSet, Velocity},
    playfield::Playfield,
    resources::{GameState, RoundEntity},
    water::Splashes,
};

pub struct BatPlugin;

impl Plugin for BatPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Playing), spawn_bat)
            .add_systems(
                Update,
                bat_control_system
                    .before(PhysicsSet)
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                (
                    keep_in_bounds_system,
                    drain_energy_system,
                    eat_food_system,
                    take_damage_system,
                    exhaustion_system,
                )
                    .chain()
                    .after(PhysicsSet)
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(Update, select_animation_system.after(PhysicsSet));
    }
}

#[derive(Component)]
pub struct Bat;

/// Energy drains over time, flies refill it and hazards take chunks out.
/// `current` always stays within `0..=max`.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Energy {
    pub current: f32,
    pub max: f32,
}

impl Energy {
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Energy { current: max, max }
    }

    pub fn drain(&mut self, amount: f32) {
        self.current = (self.current - amount).clamp(0.0, self.max);
    }

    pub fn eat(&mut self, amount: f32) {
        self.current = (self.current + amount).clamp(0.0, self.max);
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.drain(amount);
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }

    pub fn is_exhausted(&self) -> bool {
        self.current <= 0.0
    }
}

/// Dash bookkeeping, as timestamps in seconds since startup.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Dash {
    pub duration: f32,
    pub cooldown: f32,
    pub end: f32,
    pub next_available: f32,
}

impl Dash {
    pub fn new(duration: f32, cooldown: f32) -> Self {
        Dash {
            duration,
            cooldown,
            end: 0.0,
            next_available: 0.0,
        }
    }

    /// Starts a dash unless one is still recharging.
    pub fn try_start(&mut self, now: f32) -> bool {
        if now < self.next_available {
            return false;
        }
        self.end = now + self.duration;
        self.next_available = self.end + self.cooldown;
        true
    }

    pub fn is_active(&self, now: f32) -> bool {
        now < self.end
    }

    /// 1.0 right after a dash ends, 0.0 once the next one is available.
    pub fn recharge_remaining(&self, now: f32) -> f32 {
        let total = self.next_available - self.end;
        if total <= 0.0 {
            return 0.0;
        }
        ((self.next_available - now) / total).clamp(0.0, 1.0)
    }
}

/// When the bat last ate, for the eating animation.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct Appetite {
    pub last_meal: Option<f32>,
}

impl Appetite {
    pub fn is_eating(&self, now: f32, eating_duration: f32) -> bool {
        self.last_meal
            .is_some_and(|meal| now >= meal && now - meal < eating_duration)
    }
}

/// Anything that hurts the bat on contact.
///
/// Sources with `destroy_on_hit` (fish spit) disappear when they land a hit.
/// The rest (sheep) only lose this component, so each one hurts once.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DamageSource {
    pub amount: f32,
    pub destroy_on_hit: bool,
}

/// Fired whenever the bat loses energy to a hazard.
#[derive(Event)]
pub struct BatDamaged {
    pub bat: Entity,
    pub amount: f32,
}

/// What the bat is aware of this frame, for picking its animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatSenses {
    pub dashing: bool,
    pub eating: bool,
    pub food_nearby: bool,
    pub energy_fraction: f32,
}

/// Priority: dash, then eating, then food close by, then how tired it is.
pub fn select_bat_animation(senses: &BatSenses, tired_fraction: f32) -> AnimationType {
    if senses.dashing {
        AnimationType::BatDash
    } else if senses.eating {
        AnimationType::BatEat
    } else if senses.food_nearby {
        AnimationType::BatMouthOpen
    } else if senses.energy_fraction < tired_fraction {
        AnimationType::BatTired
    } else {
        AnimationType::BatFly
    }
}

/// -1, 0 or 1 along one axis. The negative key wins when both are held.
fn axis(negative: bool, positive: bool) -> f32 {
    if negative {
        -1.0
    } else if positive {
        1.0
    } else {
        0.0
    }
}

/// Arrow keys or WASD. Left beats right and up beats down.
pub fn steering(keys: &ButtonInput<KeyCode>) -> Vec2 {
    let left = keys.any_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]);
    let right = keys.any_pressed([KeyCode::ArrowRight, KeyCode::KeyD]);
    let up = keys.any_pressed([KeyCode::ArrowUp, KeyCode::KeyW]);
    let down = keys.any_pressed([KeyCode::ArrowDown, KeyCode::KeyS]);
    Vec2::new(axis(left, right), -axis(up, down))
}

/// Velocity for this frame's input. Each axis moves at full speed on its own,
/// so diagonals are faster. A dash with no input goes the way the bat faces.
pub fn bat_velocity(steer: Vec2, dashing: bool, facing_left: bool, config: &BatConfig, playfield: &Playfield) -> Vec2 {
    let speed = playfield.speed(if dashing {
        config.dash_speed
    } else {
        config.base_speed
    });
    let direction = if dashing && steer == Vec2::ZERO {
        Vec2::new(if facing_left { -1.0 } else { 1.0 }, 0.0)
    } else {
        steer
    };
    direction * speed
}

fn spawn_bat(mut commands: Commands, config: Res<GameConfig>, playfield: Res<Playfield>) {
    let frame = SheetId::Bat.frame_size().as_vec2();
    let scale = playfield.scale_for(frame.x, config.bat.scale);
    let hitbox = Collider::circle_in_frame(
        frame,
        frame.x * 0.3,
        Vec2::new(frame.x * 0.2, frame.y * 0.06),
        scale,
    );

    commands.spawn((
        Bat,
        RoundEntity,
        AnimationType::BatFly,
        Transform::from_xyz(0.0, 0.0, 5.0).with_scale(Vec3::splat(scale)),
        Velocity::default(),
        hitbox,
        Energy::new(config.bat.max_energy),
        Dash::new(config.bat.dash_duration, config.bat.dash_cooldown),
        Appetite::default(),
        Splashes,
    ));
    info!("Round started: bat has {} energy", config.bat.max_energy);
}

fn bat_control_system(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    config: Res<GameConfig>,
    playfield: Res<Playfield>,
    mut query: Query<(&mut Velocity, &mut Sprite, &mut Dash), With<Bat>>,
) {
    let now = time.elapsed_secs();
    for (mut velocity, mut sprite, mut dash) in &mut query {
        if keys.just_pressed(KeyCode::Space) && dash.try_start(now) {
            debug!("Dash until {:.2}s", dash.end);
        }

        let steer = steering(&keys);
        if steer.x < 0.0 {
            sprite.flip_x = true;
        } else if steer.x > 0.0 {
            sprite.flip_x = false;
        }

        velocity.0 = bat_velocity(steer, dash.is_active(now), sprite.flip_x, &config.bat, &playfield);
    }
}

fn keep_in_bounds_system(
    playfield: Res<Playfield>,
    mut query: Query<(&mut Transform, &Collider), With<Bat>>,
) {
    let cam = playfield.camera_box();
    for (mut transform, collider) in &mut query {
        let radius = collider.radius();
        let min = Vec2::new(cam.left + radius, cam.bottom + radius) - collider.offset;
        let max = Vec2::new(cam.right - radius, cam.top - radius) - collider.offset;
        if min.x > max.x || min.y > max.y {
            continue;
        }
        let clamped = transform.translation.truncate().clamp(min, max);
        transform.translation.x = clamped.x;
        transform.translation.y = clamped.y;
    }
}

pub fn drain_energy_system(
    time: Res<Time>,
    config: Res<GameConfig>,
    mut query: Query<&mut Energy, With<Bat>>,
) {
    let loss = config.bat.energy_loss_per_second * time.delta_secs();
    for mut energy in &mut query {
        energy.drain(loss);
    }
}

pub fn eat_food_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    mut bats: Query<(&Transform, &Collider, &mut Energy, &mut Appetite), With<Bat>>,
    food: Query<(Entity, &Transform, &Collider), (With<Food>, Without<Bat>)>,
) {
    let now = time.elapsed_secs();
    for (transform, collider, mut energy, mut appetite) in &mut bats {
        let position = transform.translation.truncate();
        for (fly, fly_transform, fly_collider) in &food {
            if collider.overlaps(position, fly_collider, fly_transform.translation.truncate()) {
                commands.entity(fly).despawn();
                energy.eat(config.bat.energy_per_food);
                appetite.last_meal = Some(now);
                debug!("Ate a fly, energy now {:.0}", energy.current);
            }
        }
    }
}

pub fn take_damage_system(
    mut commands: Commands,
    mut bats: Query<(Entity, &Transform, &Collider, &mut Energy), With<Bat>>,
    sources: Query<(Entity, &Transform, &Collider, &DamageSource), Without<Bat>>,
) {
    for (bat, transform, collider, mut energy) in &mut bats {
        let position = transform.translation.truncate();
        for (source, source_transform, source_collider, damage) in &sources {
            if !collider.overlaps(position, source_collider, source_transform.translation.truncate()) {
                continue;
            }
            energy.take_damage(damage.amount);
            if damage.destroy_on_hit {
                commands.entity(source).despawn();
            } else {
                commands.entity(source).remove::<DamageSource>();
            }
            commands.trigger(BatDamaged {
                bat,
                amount: damage.amount,
            });
            debug!("Bat hit for {}, energy now {:.0}", damage.amount, energy.current);
        }
    }
}

/// Out of energy: hand control over to gravity and end the round.
fn exhaustion_system(
    mut commands: Commands,
    mut next_state: ResMut<NextState<GameState>>,
    mut query: Query<(Entity, &Energy, &mut Velocity), With<Bat>>,
) {
    for (bat, energy, mut velocity) in &mut query {
        if energy.is_exhausted() {
            velocity.0 = Vec2::ZERO;
            commands.entity(bat).insert(AffectedByGravity);
            next_state.set(GameState::GameOver);
            info!("Bat ran out of energy");
        }
    }
}

fn select_animation_system(
    time: Res<Time>,
    config: Res<GameConfig>,
    playfield: Res<Playfield>,
    mut bats: Query<(&Transform, &Energy, &Dash, &Appetite, &mut AnimationType), With<Bat>>,
    food: Query<&Transform, (With<Food>, Without<Bat>)>,
) {
    let now = time.elapsed_secs();
    let proximity = playfield.px_w(config.bat.proximity);
    for (transform, energy, dash, appetite, mut animation) in &mut bats {
        let position = transform.translation.truncate();
        let senses = BatSenses {
            dashing: dash.is_active(now),
            eating: appetite.is_eating(now, config.bat.eating_duration),
            food_nearby: food
                .iter()
                .any(|fly| fly.translation.truncate().distance(position) < proximity),
            energy_fraction: energy.fraction(),
        };
        let chosen = select_bat_animation(&senses, config.bat.tired_fraction);
        // Only write on change, otherwise the clip restarts every frame
        if *animation != chosen {
            *animation = chosen;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn senses() -> BatSenses {
        BatSenses {
            dashing: false,
            eating: false,
            food_nearby: false,
            energy_fraction: 1.0,
        }
    }

    #[test]
    fn energy_never_exceeds_max() {
        let mut energy = Energy::new(1000.0);
        energy.drain(400.0);
        for _ in 0..10 {
            energy.eat(150.0);
        }
        assert_eq!(energy.current, 1000.0);
    }

    #[test]
    fn energy_never_goes_negative() {
        let mut energy = Energy::new(100.0);
        energy.take_damage(50.0);
        energy.take_damage(75.0);
        assert_eq!(energy.current, 0.0);
        assert!(energy.is_exhausted());
        energy.drain(10.0);
        assert_eq!(energy.current, 0.0);
    }

    #[test]
    fn dash_waits_for_cooldown() {
        let mut dash = Dash::new(0.5, 3.0);
        assert!(dash.try_start(10.0));
        assert!(dash.is_active(10.2));
        assert!(!dash.is_active(10.5));
        assert!(!dash.try_start(12.0));
        assert!(dash.try_start(13.5));
        assert_eq!(dash.end, 14.0);
        assert_eq!(dash.next_available, 17.0);
    }

    #[test]
    fn dash_bar_drains_while_recharging() {
        let mut dash = Dash::new(0.5, 3.0);
        assert_eq!(dash.recharge_remaining(0.0), 0.0);
        dash.try_start(1.0);
        // Still dashing: bar full
        assert_eq!(dash.recharge_remaining(1.2), 1.0);
        assert!((dash.recharge_remaining(3.0) - 0.5).abs() < 1e-5);
        assert_eq!(dash.recharge_remaining(5.0), 0.0);
    }

    #[test]
    fn animation_priority_order() {
        let all = BatSenses {
            dashing: true,
            eating: true,
            food_nearby: true,
            energy_fraction: 0.1,
        };
        assert_eq!(select_bat_animation(&all, 0.25), AnimationType::BatDash);

        let not_dashing = BatSenses { dashing: false, ..all };
        assert_eq!(select_bat_animation(&not_dashing, 0.25), AnimationType::BatEat);

        let not_eating = BatSenses { eating: false, ..not_dashing };
        assert_eq!(select_bat_animation(&not_eating, 0.25), AnimationType::BatMouthOpen);

        let nothing_near = BatSenses { food_nearby: false, ..not_eating };
        assert_eq!(select_bat_animation(&nothing_near, 0.25), AnimationType::BatTired);

        assert_eq!(select_bat_animation(&senses(), 0.25), AnimationType::BatFly);
    }

    #[test]
    fn eating_lasts_a_moment() {
        let appetite = Appetite { last_meal: Some(5.0) };
        assert!(appetite.is_eating(5.1, 0.4));
        assert!(!appetite.is_eating(5.5, 0.4));
        assert!(!Appetite::default().is_eating(5.1, 0.4));
    }

    #[test]
    fn velocity_follows_input_and_dash() {
        let config = BatConfig::default();
        let playfield = Playfield::new(1000.0, 562.5);

        let cruising = bat_velocity(Vec2::new(1.0, -1.0), false, false, &config, &playfield);
        assert_eq!(cruising, Vec2::new(300.0, -300.0));

        let idle = bat_velocity(Vec2::ZERO, false, true, &config, &playfield);
        assert_eq!(idle, Vec2::ZERO);

        let dash_facing_left = bat_velocity(Vec2::ZERO, true, true, &config, &playfield);
        assert_eq!(dash_facing_left, Vec2::new(-600.0, 0.0));
    }

    #[test]
    fn left_and_up_win_ties() {
        let mut keys = ButtonInput::<KeyCode>::default();
        keys.press(KeyCode::ArrowLeft);
        keys.press(KeyCode::KeyD);
        keys.press(KeyCode::KeyW);
        keys.press(KeyCode::ArrowDown);
        assert_eq!(steering(&keys), Vec2::new(-1.0, 1.0));
    }

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(GameConfig::default());
        app
    }

    fn advance(app: &mut App, seconds: f32) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(seconds));
        app.world_mut().run_schedule(Update);
    }

    #[test]
    fn bat_stays_on_screen() {
        let mut app = test_app();
        app.insert_resource(Playfield::new(1280.0, 720.0))
            .add_systems(Update, keep_in_bounds_system);
        let bat = app
            .world_mut()
            .spawn((Bat, Transform::from_xyz(2000.0, -2000.0, 5.0), Collider::circle(20.0)))
            .id();

        advance(&mut app, 0.1);

        let translation = app.world().get::<Transform>(bat).unwrap().translation;
        assert_eq!(translation, Vec3::new(620.0, -340.0, 5.0));
    }

    #[test]
    fn running_dry_drops_the_bat_and_ends_the_round() {
        let mut app = test_app();
        app.add_plugins(bevy::state::app::StatesPlugin)
            .init_state::<GameState>()
            .add_systems(Update, exhaustion_system.run_if(in_state(GameState::Playing)));
        let bat = app
            .world_mut()
            .spawn((
                Bat,
                Energy { current: 0.0, max: 1000.0 },
                Velocity(Vec2::new(100.0, 0.0)),
            ))
            .id();

        app.update();
        app.update();

        assert_eq!(app.world().resource::<State<GameState>>().get(), &GameState::GameOver);
        assert!(app.world().get::<AffectedByGravity>(bat).is_some());
        assert_eq!(app.world().get::<Velocity>(bat).unwrap().0, Vec2::ZERO);
    }

    #[test]
    fn energy_drains_per_second() {
        let mut app = test_app();
        app.add_systems(Update, drain_energy_system);
        let bat = app.world_mut().spawn((Bat, Energy::new(1000.0))).id();

        advance(&mut app, 2.0);

        let energy = app.world().get::<Energy>(bat).unwrap();
        assert!((energy.current - 800.0).abs() < 0.01);
    }

    #[test]
    fn eating_a_fly_removes_it_and_refills() {
        let mut app = test_app();
        app.add_systems(Update, eat_food_system);
        let bat = app
            .world_mut()
            .spawn((
                Bat,
                Transform::default(),
                Collider::circle(20.0),
                Energy { current: 100.0, max: 1000.0 },
                Appetite::default(),
            ))
            .id();
        let fly = app
            .world_mut()
            .spawn((Food, Transform::from_xyz(15.0, 0.0, 0.0), Collider::circle(5.0)))
            .id();
        let far_fly = app
            .world_mut()
            .spawn((Food, Transform::from_xyz(200.0, 0.0, 0.0), Collider::circle(5.0)))
            .id();

        advance(&mut app, 0.1);

        assert!(app.world().get_entity(fly).is_err());
        assert!(app.world().get_entity(far_fly).is_ok());
        assert_eq!(app.world().get::<Energy>(bat).unwrap().current, 250.0);
        assert!(app.world().get::<Appetite>(bat).unwrap().last_meal.is_some());
    }

    #[test]
    fn hazards_hurt_once() {
        let mut app = test_app();
        app.add_systems(Update, take_damage_system);
        let bat = app
            .world_mut()
            .spawn((
                Bat,
                Transform::default(),
                Collider::circle(20.0),
                Energy::new(1000.0),
            ))
            .id();
        let sheep = app
            .world_mut()
            .spawn((
                Transform::from_xyz(10.0, 0.0, 0.0),
                Collider::circle(10.0),
                DamageSource {
                    amount: 50.0,
                    destroy_on_hit: false,
                },
            ))
            .id();
        let spit = app
            .world_mut()
            .spawn((
                Transform::from_xyz(-10.0, 0.0, 0.0),
                Collider::circle(10.0),
                DamageSource {
                    amount: 25.0,
                    destroy_on_hit: true,
                },
            ))
            .id();

        advance(&mut app, 0.1);
        advance(&mut app, 0.1);

        assert_eq!(app.world().get::<Energy>(bat).unwrap().current, 925.0);
        assert!(app.world().get::<DamageSource>(sheep).is_none());
        assert!(app.world().get_entity(sheep).is_ok());
        assert!(app.world().get_entity(spit).is_err());
    }
}
