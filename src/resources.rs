// resources.rs - Global game state shared by every plugin
// Resources exist once for the entire game, unlike components which are per-entity.

use bevy::prelude::*;

/// Playing: the bat is under player control.
/// GameOver: the bat ran out of energy; the world keeps moving while the
/// screen fades out and offers a restart.
#[derive(States, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GameState {
    #[default]
    Playing,
    GameOver,
}

/// Sheep the bat bumped versus sheep that fell past untouched.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub hits: u32,
    pub misses: u32,
}

impl Score {
    pub fn label(&self) -> String {
        format!("Hits: {}, Misses: {}", self.hits, self.misses)
    }
}

/// Everything spawned for one round carries this so a restart can despawn
/// the round in one sweep. The camera and the sky outlive rounds.
#[derive(Component)]
pub struct RoundEntity;
