use bevy::prelude::*;

pub struct SpriteModificationsPlugin;

impl Plugin for SpriteModificationsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, pop_in_system);
    }
}

/// Grows a freshly spawned sprite up to `target_scale`, overshooting a
/// little on the way.
#[derive(Component)]
pub struct PopIn {
    pub target_scale: f32,
    pub timer: Timer,
}

impl PopIn {
    pub fn new(target_scale: f32, seconds: f32) -> Self {
        PopIn {
            target_scale,
            timer: Timer::from_seconds(seconds, TimerMode::Once),
        }
    }

    /// Scale at `t` in [0, 1] of the timer: from 25% to 100% of the target,
    /// BackOut going past 100% before settling.
    pub fn scale_at(&self, t: f32) -> f32 {
        let eased_t = EaseFunction::BackOut.sample_clamped(t);
        self.target_scale * (0.25 + (1.0 - 0.25) * eased_t)
    }
}

fn pop_in_system(
    mut commands: Commands,
    mut query: Query<(Entity, &mut Transform, &mut PopIn)>,
    time: Res<Time>,
) {
    for (entity, mut transform, mut pop_in) in query.iter_mut() {
        pop_in.timer.tick(time.delta());

        if pop_in.timer.just_finished() {
            // Snap to exact final scale and remove the component
            transform.scale = Vec3::splat(pop_in.target_scale);
            commands.entity(entity).remove::<PopIn>();
        } else {
            let scale = pop_in.scale_at(pop_in.timer.fraction());
            transform.scale = Vec3::splat(scale);
        }
    }
}
