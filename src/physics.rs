use bevy::prelude::*;

use crate::{config::GameConfig, playfield::Playfield};

/// Just enough arcade physics for the game: velocity, gravity, overlap tests
/// and landing on the cliffs. Nothing here resolves stacks or rotations.
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_gravity).add_systems(
            Update,
            (
                apply_gravity_system,
                integrate_velocity_system,
                land_on_platforms_system,
            )
                .chain()
                .in_set(PhysicsSet),
        );
    }
}

/// Everything that reads positions after movement runs `.after(PhysicsSet)`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhysicsSet;

#[derive(Component, Copy, Clone, Debug, Default, PartialEq)]
pub struct Velocity(pub Vec2);

/// World gravity in units per second².
#[derive(Resource, Copy, Clone, Debug, PartialEq)]
pub struct Gravity(pub Vec2);

/// Only bodies with this marker fall. The bat, flies and the frog float.
#[derive(Component)]
pub struct AffectedByGravity;

/// Share of vertical speed kept when landing on a platform. 1.0 bounces
/// back to the same height, 0.0 stops dead.
#[derive(Component, Copy, Clone, Debug, PartialEq)]
pub struct Bounce(pub f32);

/// Static ground. Only bodies with `LandsOnPlatforms` collide with it.
#[derive(Component)]
pub struct Platform;

#[derive(Component)]
pub struct LandsOnPlatforms;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { half_size: Vec2 },
}

/// Hit shape in world units, centred at the entity's translation plus `offset`.
#[derive(Component, Copy, Clone, Debug, PartialEq)]
pub struct Collider {
    pub shape: Shape,
    pub offset: Vec2,
}

impl Collider {
    pub fn circle(radius: f32) -> Self {
        Collider {
            shape: Shape::Circle { radius },
            offset: Vec2::ZERO,
        }
    }

    pub fn rect(size: Vec2) -> Self {
        Collider {
            shape: Shape::Rect {
                half_size: size / 2.0,
            },
            offset: Vec2::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// A circle described the way sprite sheets describe hitboxes: radius and
    /// top-left offset in frame texels, measured from the frame's top-left
    /// corner. `scale` converts texels to world units.
    pub fn circle_in_frame(frame: Vec2, radius: f32, offset: Vec2, scale: f32) -> Self {
        let centre_from_top_left = offset + Vec2::splat(radius);
        let from_frame_centre = centre_from_top_left - frame / 2.0;
        // Frames count rows downwards, the world counts upwards.
        Collider::circle(radius * scale).with_offset(Vec2::new(
            from_frame_centre.x * scale,
            -from_frame_centre.y * scale,
        ))
    }

    pub fn centre(&self, position: Vec2) -> Vec2 {
        position + self.offset
    }

    /// Half the vertical extent of the shape.
    pub fn half_height(&self) -> f32 {
        match self.shape {
            Shape::Circle { radius } => radius,
            Shape::Rect { half_size } => half_size.y,
        }
    }

    pub fn radius(&self) -> f32 {
        match self.shape {
            Shape::Circle { radius } => radius,
            Shape::Rect { half_size } => half_size.x.min(half_size.y),
        }
    }

    pub fn overlaps(&self, position: Vec2, other: &Collider, other_position: Vec2) -> bool {
        let a = self.centre(position);
        let b = other.centre(other_position);
        match (self.shape, other.shape) {
            (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
                a.distance_squared(b) < (ra + rb) * (ra + rb)
            }
            (Shape::Circle { radius }, Shape::Rect { half_size }) => {
                circle_touches_rect(a, radius, b, half_size)
            }
            (Shape::Rect { half_size }, Shape::Circle { radius }) => {
                circle_touches_rect(b, radius, a, half_size)
            }
            (Shape::Rect { half_size: ha }, Shape::Rect { half_size: hb }) => {
                let gap = (a - b).abs();
                gap.x < ha.x + hb.x && gap.y < ha.y + hb.y
            }
        }
    }
}

fn circle_touches_rect(centre: Vec2, radius: f32, rect_centre: Vec2, half_size: Vec2) -> bool {
    let closest = centre.clamp(rect_centre - half_size, rect_centre + half_size);
    closest.distance_squared(centre) < radius * radius
}

/// How far circle A has to move to stop overlapping circle B, if at all.
pub fn push_out(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> Option<Vec2> {
    let diff = a - b;
    let distance = diff.length();
    let min_distance = a_radius + b_radius;
    if distance >= min_distance {
        return None;
    }
    // Dead centre: push straight up rather than dividing by zero
    let direction = if distance > 0.001 { diff / distance } else { Vec2::Y };
    Some(direction * (min_distance - distance))
}

/// Motion constants authored as "units per frame at 60 fps" are multiplied
/// by this so they behave the same at any frame rate.
pub fn frame_scaled(delta_secs: f32) -> f32 {
    delta_secs * 60.0
}

fn setup_gravity(mut commands: Commands, config: Res<GameConfig>, playfield: Res<Playfield>) {
    commands.insert_resource(Gravity(Vec2::new(0.0, -playfield.speed(config.gravity))));
}

pub fn apply_gravity_system(
    mut query: Query<&mut Velocity, With<AffectedByGravity>>,
    gravity: Option<Res<Gravity>>,
    time: Res<Time>,
) {
    let Some(gravity) = gravity else {
        return;
    };
    let delta = time.delta_secs();
    for mut velocity in &mut query {
        velocity.0 += gravity.0 * delta;
    }
}

pub fn integrate_velocity_system(mut query: Query<(&Velocity, &mut Transform)>, time: Res<Time>) {
    let delta = time.delta_secs();
    for (velocity, mut transform) in &mut query {
        transform.translation += velocity.0.extend(0.0) * delta;
    }
}

/// Falling bodies that overlap a platform while above its surface are put
/// back on top of it and bounced.
pub fn land_on_platforms_system(
    mut bodies: Query<
        (&mut Transform, &mut Velocity, &Collider, Option<&Bounce>),
        (With<LandsOnPlatforms>, Without<Platform>),
    >,
    platforms: Query<(&Transform, &Collider), With<Platform>>,
) {
    for (mut transform, mut velocity, collider, bounce) in &mut bodies {
        if velocity.0.y > 0.0 {
            continue;
        }
        for (platform_transform, platform_collider) in &platforms {
            let position = transform.translation.truncate();
            let platform_position = platform_transform.translation.truncate();
            if !collider.overlaps(position, platform_collider, platform_position) {
                continue;
            }

            let surface = platform_collider.centre(platform_position).y + platform_collider.half_height();
            let centre = collider.centre(position);
            if centre.y < surface {
                // Hitting the side or underside; let it keep falling
                continue;
            }

            let bottom = centre.y - collider.half_height();
            transform.translation.y += surface - bottom;
            velocity.0.y = -velocity.0.y * bounce.map_or(0.0, |b| b.0);
            break;
        }
    }
}
