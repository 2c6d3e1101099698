use bevy::prelude::*;
use bevy::sprite::Anchor;

use crate::{
    physics::{Collider, Platform},
    playfield::Playfield,
    resources::{GameState, RoundEntity},
};

pub struct SceneryPlugin;

impl Plugin for SceneryPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_sky)
            .add_systems(OnEnter(GameState::Playing), spawn_cliffs);
    }
}

/// Texel size of cliff_right.png.
const CLIFF_TEXTURE: Vec2 = Vec2::new(1024.0, 1536.0);
/// Cliff width as a share of the playfield width.
const CLIFF_WIDTH: f32 = 0.25;

/// How far the cliff tops sit below the top of the screen.
pub fn cliff_top(playfield: &Playfield) -> f32 {
    playfield.camera_box().top - playfield.px_w(0.1)
}

fn spawn_sky(mut commands: Commands, asset_server: Res<AssetServer>, playfield: Res<Playfield>) {
    commands.spawn((
        Sprite {
            image: asset_server.load("backgrounds/sky.png"),
            custom_size: Some(Vec2::new(playfield.width, playfield.height)),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, -10.0),
    ));
}

/// Two cliffs hanging off the top corners. Sheep land on their top edge.
fn spawn_cliffs(mut commands: Commands, asset_server: Res<AssetServer>, playfield: Res<Playfield>) {
    let cam = playfield.camera_box();
    let image: Handle<Image> = asset_server.load("backgrounds/cliff_right.png");
    let width = playfield.px_w(CLIFF_WIDTH);
    let size = Vec2::new(width, width * CLIFF_TEXTURE.y / CLIFF_TEXTURE.x);
    let top = cliff_top(&playfield);

    // The walkable strip starts a little below the drawn edge
    let ledge = Vec2::new(width, playfield.px_h(0.05));
    let ledge_drop = playfield.px_h(0.01) + ledge.y / 2.0;

    for left_side in [true, false] {
        let (x, anchor, ledge_x) = if left_side {
            (cam.left, Anchor::TOP_LEFT, width / 2.0)
        } else {
            (cam.right, Anchor::TOP_RIGHT, -width / 2.0)
        };
        commands.spawn((
            RoundEntity,
            Platform,
            Sprite {
                image: image.clone(),
                custom_size: Some(size),
                flip_x: left_side,
                ..default()
            },
            anchor,
            Transform::from_xyz(x, top, -3.0),
            Collider::rect(ledge).with_offset(Vec2::new(ledge_x, -ledge_drop)),
        ));
    }
}
