use bevy::color::{Mix, Srgba};
use bevy::prelude::*;

use crate::bat::BatDamaged;

pub struct ShadersLitePlugin;

impl Plugin for ShadersLitePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, damage_tint_system)
            .add_observer(on_bat_damaged);
    }
}

const TINT_SECONDS: f32 = 0.15;
const TINT: Srgba = Srgba::new(1.0, 0.55, 0.55, 1.0);

/// Red flash on a freshly hurt sprite, easing back to white.
#[derive(Component, Default)]
pub struct DamageTint(pub Timer);

/// Sprite colour `fraction` of the way through the flash.
pub fn tint_at(fraction: f32) -> Color {
    TINT.mix(&Srgba::WHITE, fraction.clamp(0.0, 1.0)).into()
}

fn on_bat_damaged(trigger: On<BatDamaged>, mut commands: Commands, mut sprites: Query<&mut Sprite>) {
    let event = trigger.event();
    let Ok(mut sprite) = sprites.get_mut(event.bat) else {
        return;
    };
    trace!("Tinting bat {:?} after {} damage", event.bat, event.amount);
    sprite.color = tint_at(0.0);
    // Re-inserting restarts the flash when hits come in quick succession
    commands
        .entity(event.bat)
        .insert(DamageTint(Timer::from_seconds(TINT_SECONDS, TimerMode::Once)));
}

fn damage_tint_system(
    mut commands: Commands,
    time: Res<Time>,
    mut tinted: Query<(Entity, &mut Sprite, &mut DamageTint)>,
) {
    for (entity, mut sprite, mut tint) in &mut tinted {
        tint.0.tick(time.delta());
        sprite.color = tint_at(tint.0.fraction());
        if tint.0.is_finished() {
            sprite.color = Color::WHITE;
            commands.entity(entity).remove::<DamageTint>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tint_eases_back_to_white() {
        assert_eq!(tint_at(0.0), Color::from(TINT));
        let end = tint_at(1.0).to_srgba();
        assert!((end.green - 1.0).abs() < 1e-5 && (end.blue - 1.0).abs() < 1e-5);
        let halfway = tint_at(0.5).to_srgba();
        assert!(halfway.green > TINT.green && halfway.green < 1.0);
    }

    #[test]
    fn damage_flashes_the_bat_then_fades() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_observer(on_bat_damaged)
            .add_systems(Update, damage_tint_system);
        let bat = app.world_mut().spawn(Sprite::default()).id();

        app.world_mut().trigger(BatDamaged { bat, amount: 25.0 });
        app.world_mut().flush();
        assert_eq!(app.world().get::<Sprite>(bat).unwrap().color, Color::from(TINT));
        assert!(app.world().get::<DamageTint>(bat).is_some());

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(0.075));
        app.world_mut().run_schedule(Update);
        let color = app.world().get::<Sprite>(bat).unwrap().color;
        assert_ne!(color, Color::from(TINT));
        assert_ne!(color, Color::WHITE);

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(0.1));
        app.world_mut().run_schedule(Update);
        assert_eq!(app.world().get::<Sprite>(bat).unwrap().color, Color::WHITE);
        assert!(app.world().get::<DamageTint>(bat).is_none());
    }
}
