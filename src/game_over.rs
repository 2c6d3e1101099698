use bevy::prelude::*;

use crate::{
    config::{GameConfig, GameOverConfig},
    resources::{GameState, RoundEntity},
};

pub struct GameOverPlugin;

impl Plugin for GameOverPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::GameOver), start_game_over)
            .add_systems(
                Update,
                (overlay_system, play_again_button_system).run_if(in_state(GameState::GameOver)),
            )
            .add_systems(OnExit(GameState::GameOver), cleanup_round);
    }
}

/// When the bat gave out, in seconds since startup.
#[derive(Resource)]
pub struct GameOverClock {
    pub started_at: f32,
    pub text_shown: bool,
}

/// The black screen that fades in over the last moments of a round.
#[derive(Component)]
pub struct GameOverOverlay;

#[derive(Component)]
pub struct PlayAgainButton;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayPhase {
    /// The world keeps going while the bat falls.
    Waiting,
    Fading { alpha: f32 },
    Faded,
    ShowText,
}

pub fn phase_at(elapsed: f32, config: &GameOverConfig) -> OverlayPhase {
    if elapsed < config.delay {
        OverlayPhase::Waiting
    } else if elapsed < config.delay + config.fade {
        OverlayPhase::Fading {
            alpha: ((elapsed - config.delay) / config.fade).clamp(0.0, 1.0),
        }
    } else if elapsed < config.delay + config.fade + config.text_delay {
        OverlayPhase::Faded
    } else {
        OverlayPhase::ShowText
    }
}

fn start_game_over(mut commands: Commands, time: Res<Time>, config: Res<GameConfig>) {
    commands.insert_resource(GameOverClock {
        started_at: time.elapsed_secs(),
        text_shown: false,
    });
    commands.spawn((
        GameOverOverlay,
        RoundEntity,
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            flex_direction: FlexDirection::Column,
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            row_gap: Val::Px(40.0),
            ..default()
        },
        BackgroundColor(Color::BLACK.with_alpha(0.0)),
        GlobalZIndex(10),
    ));
    info!(
        "Game over, fading out in {:.1}s",
        config.game_over.delay
    );
}

fn overlay_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    clock: Option<ResMut<GameOverClock>>,
    mut overlays: Query<(Entity, &mut BackgroundColor), With<GameOverOverlay>>,
) {
    let Some(mut clock) = clock else {
        return;
    };
    let Ok((overlay, mut background)) = overlays.single_mut() else {
        return;
    };

    let alpha = match phase_at(time.elapsed_secs() - clock.started_at, &config.game_over) {
        OverlayPhase::Waiting => 0.0,
        OverlayPhase::Fading { alpha } => alpha,
        OverlayPhase::Faded => 1.0,
        OverlayPhase::ShowText => {
            if !clock.text_shown {
                clock.text_shown = true;
                commands.entity(overlay).with_children(spawn_game_over_text);
            }
            1.0
        }
    };
    background.0 = Color::BLACK.with_alpha(alpha);
}

fn spawn_game_over_text(parent: &mut ChildSpawnerCommands) {
    parent.spawn((
        Text::new("Game Over"),
        TextFont {
            font_size: 72.0,
            ..default()
        },
        TextColor(Color::WHITE),
    ));

    parent
        .spawn((
            Button,
            PlayAgainButton,
            Node {
                width: Val::Px(250.0),
                height: Val::Px(80.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                border: UiRect::all(Val::Px(3.0)),
                ..default()
            },
            BackgroundColor(Color::srgb(0.1, 0.3, 0.1)),
            BorderColor::all(Color::srgb(0.3, 0.8, 0.3)),
        ))
        .with_children(|button| {
            button.spawn((
                Text::new("Play Again"),
                TextFont {
                    font_size: 36.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

fn play_again_button_system(
    query: Query<&Interaction, (Changed<Interaction>, With<PlayAgainButton>)>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for interaction in &query {
        if *interaction == Interaction::Pressed {
            next_state.set(GameState::Playing);
            info!("Starting a new round");
        }
    }
}

/// Clears out everything from the finished round. The next round is spawned
/// by each plugin's OnEnter(Playing) system.
pub fn cleanup_round(mut commands: Commands, query: Query<Entity, With<RoundEntity>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
    commands.remove_resource::<GameOverClock>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn overlay_waits_fades_then_shows_text() {
        let config = GameOverConfig::default();
        assert_eq!(phase_at(1.0, &config), OverlayPhase::Waiting);
        assert_eq!(phase_at(3.0, &config), OverlayPhase::Fading { alpha: 0.5 });
        assert_eq!(phase_at(4.0, &config), OverlayPhase::ShowText);
    }

    #[test]
    fn text_delay_holds_a_black_screen() {
        let config = GameOverConfig {
            delay: 1.0,
            fade: 1.0,
            text_delay: 2.0,
        };
        assert_eq!(phase_at(3.0, &config), OverlayPhase::Faded);
        assert_eq!(phase_at(4.0, &config), OverlayPhase::ShowText);
    }

    #[test]
    fn text_and_button_appear_once() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(GameConfig::default())
            .insert_resource(GameOverClock {
                started_at: 0.0,
                text_shown: false,
            })
            .add_systems(Update, overlay_system);
        let overlay = app
            .world_mut()
            .spawn((
                GameOverOverlay,
                Node::default(),
                BackgroundColor(Color::BLACK.with_alpha(0.0)),
            ))
            .id();

        for _ in 0..3 {
            app.world_mut()
                .resource_mut::<Time>()
                .advance_by(Duration::from_secs_f32(2.0));
            app.world_mut().run_schedule(Update);
        }

        let mut buttons = app.world_mut().query_filtered::<(), With<PlayAgainButton>>();
        assert_eq!(buttons.iter(app.world()).count(), 1);
        let background = app.world().get::<BackgroundColor>(overlay).unwrap();
        assert_eq!(background.0.alpha(), 1.0);
    }

    #[test]
    fn cleanup_keeps_only_persistent_entities() {
        let mut app = App::new();
        app.add_systems(Update, cleanup_round);
        let sky = app.world_mut().spawn(Transform::default()).id();
        let sheep = app.world_mut().spawn((RoundEntity, Transform::default())).id();

        app.update();

        assert!(app.world().get_entity(sky).is_ok());
        assert!(app.world().get_entity(sheep).is_err());
    }
}
