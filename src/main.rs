// Babs the Bat: keep a bat fed on flies over a pond full of hazards.
//
// GameState::Playing  the player steers the bat; sheep, fish and the frog do
//                     their thing around it
// GameState::GameOver the bat ran out of energy; the pond keeps going while
//                     the screen fades to black and offers another round
//
// Every module is a plugin. Round entities are spawned on OnEnter(Playing)
// and swept up on OnExit(GameOver).

use bevy::prelude::*;
use bevy::window::WindowResolution;

use crate::playfield::Playfield;
use crate::resources::{GameState, Score};

fn main() {
    // Read before the app exists since the window size comes from it. Where
    // it came from is logged once logging is up.
    let (config, source) = config::load();
    let playfield = Playfield::from_config(&config);

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Babs the Bat".into(),
                resolution: WindowResolution::new(config.width, config.height),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(config)
        .insert_resource(source)
        .insert_resource(playfield)
        .add_plugins(GamePlugin)
        .run();
}

/// The whole game minus windowing and rendering. Expects the config,
/// `ConfigSource` and `Playfield` resources to be in place already.
struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .init_resource::<Score>()
            .add_systems(Startup, config::log_config_source_system)
            .add_plugins((
                playfield::PlayfieldPlugin,
                physics::PhysicsPlugin,
                animation::AnimationPlugin,
                sprite_modifications::SpriteModificationsPlugin,
                shaders_lite::ShadersLitePlugin,
                scenery::SceneryPlugin,
                water::WaterPlugin,
                bat::BatPlugin,
                food::FoodPlugin,
                sheep::SheepPlugin,
                fish::FishPlugin,
                frog::FrogPlugin,
                hud::HudPlugin,
                game_over::GameOverPlugin,
            ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;

    use crate::{
        bat::{Bat, Energy},
        config::{ConfigSource, GameConfig},
        frog::Frog,
        game_over::GameOverOverlay,
        hud::ScoreText,
        physics::Platform,
        water::{WaterHitbox, WaterLayer},
    };

    fn headless_app() -> App {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            bevy::asset::AssetPlugin::default(),
            StatesPlugin,
            bevy::input::InputPlugin,
        ))
        .init_asset::<Image>()
        .init_asset::<TextureAtlasLayout>()
        .insert_resource(GameConfig::default())
        .insert_resource(ConfigSource::Defaults)
        .insert_resource(Playfield::new(1280.0, 720.0))
        .add_plugins(GamePlugin);
        app
    }

    fn count<F: bevy::ecs::query::QueryFilter>(app: &mut App) -> usize {
        let mut query = app.world_mut().query_filtered::<(), F>();
        query.iter(app.world()).count()
    }

    #[test]
    fn first_frame_spawns_a_round() {
        let mut app = headless_app();
        app.update();

        assert_eq!(app.world().resource::<State<GameState>>().get(), &GameState::Playing);
        assert_eq!(count::<With<Bat>>(&mut app), 1);
        assert_eq!(count::<With<WaterLayer>>(&mut app), 3);
        assert_eq!(count::<With<WaterHitbox>>(&mut app), 1);
        assert_eq!(count::<With<Frog>>(&mut app), 1);
        assert_eq!(count::<With<Platform>>(&mut app), 2);
        assert_eq!(count::<With<ScoreText>>(&mut app), 1);
    }

    #[test]
    fn play_again_replaces_the_round() {
        let mut app = headless_app();
        app.update();

        app.world_mut()
            .resource_mut::<NextState<GameState>>()
            .set(GameState::GameOver);
        app.update();
        assert_eq!(app.world().resource::<State<GameState>>().get(), &GameState::GameOver);
        assert_eq!(count::<With<GameOverOverlay>>(&mut app), 1);

        app.world_mut()
            .resource_mut::<NextState<GameState>>()
            .set(GameState::Playing);
        app.update();

        assert_eq!(app.world().resource::<State<GameState>>().get(), &GameState::Playing);
        assert_eq!(count::<With<GameOverOverlay>>(&mut app), 0);
        assert_eq!(count::<With<Bat>>(&mut app), 1);
        assert_eq!(count::<With<WaterLayer>>(&mut app), 3);
        assert_eq!(count::<With<Platform>>(&mut app), 2);
        assert_eq!(count::<With<ScoreText>>(&mut app), 1);

        let mut bats = app.world_mut().query_filtered::<&Energy, With<Bat>>();
        let energy = bats.single(app.world()).unwrap();
        assert!(energy.fraction() > 0.99);
    }
}

mod animation;
mod bat;
mod config;
mod fish;
mod food;
mod frog;
mod game_over;
mod hud;
mod physics;
mod playfield;
mod resources;
mod scenery;
mod shaders_lite;
mod sheep;
mod sprite_modifications;
mod water;
