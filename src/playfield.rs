use bevy::camera::ScalingMode;
use bevy::prelude::*;

use crate::config::GameConfig;

pub struct PlayfieldPlugin;

impl Plugin for PlayfieldPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera);
    }
}

/// The logical screen every size and speed is measured against.
///
/// World units are logical pixels with the origin at the centre of the
/// screen and +y pointing up. Game code never hardcodes pixel amounts; it
/// asks for "a tenth of the width" so everything scales with the playfield.
#[derive(Resource, Copy, Clone, Debug, PartialEq)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

/// The visible area in world coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraBox {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

impl Playfield {
    pub fn new(width: f32, height: f32) -> Self {
        Playfield { width, height }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Playfield::new(config.width as f32, config.height as f32)
    }

    /// `fraction` of the playfield width, in world units.
    pub fn px_w(&self, fraction: f32) -> f32 {
        fraction * self.width
    }

    /// `fraction` of the playfield height, in world units.
    pub fn px_h(&self, fraction: f32) -> f32 {
        fraction * self.height
    }

    /// Speeds are always measured against the width, in units per second.
    pub fn speed(&self, fraction: f32) -> f32 {
        fraction * self.width
    }

    pub fn camera_box(&self) -> CameraBox {
        let half_width = self.width / 2.0;
        let half_height = self.height / 2.0;
        CameraBox {
            left: -half_width,
            right: half_width,
            top: half_height,
            bottom: -half_height,
            width: self.width,
            height: self.height,
        }
    }

    /// Uniform scale that makes a sprite frame `frame_width` texels wide
    /// cover `fraction` of the playfield width.
    pub fn scale_for(&self, frame_width: f32, fraction: f32) -> f32 {
        if frame_width <= 0.0 {
            return 1.0;
        }
        self.px_w(fraction) / frame_width
    }
}

/// The camera always shows the whole playfield and letterboxes the rest.
fn spawn_camera(mut commands: Commands, playfield: Res<Playfield>) {
    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scaling_mode: ScalingMode::AutoMin {
                min_width: playfield.width,
                min_height: playfield.height,
            },
            ..OrthographicProjection::default_2d()
        }),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_box_is_centred() {
        let field = Playfield::new(1280.0, 720.0);
        let cam = field.camera_box();
        assert_eq!(cam.left, -640.0);
        assert_eq!(cam.right, 640.0);
        assert_eq!(cam.top, 360.0);
        assert_eq!(cam.bottom, -360.0);
        assert_eq!(cam.width, 1280.0);
    }

    #[test]
    fn sizes_follow_the_screen() {
        let small = Playfield::new(640.0, 360.0);
        let big = Playfield::new(1920.0, 1080.0);
        assert_eq!(small.px_w(0.25), 160.0);
        assert_eq!(big.px_h(0.1), 108.0);
        assert_eq!(big.speed(0.3) / small.speed(0.3), 3.0);
    }

    #[test]
    fn scale_for_hits_target_width() {
        let field = Playfield::new(1000.0, 562.5);
        let scale = field.scale_for(794.0, 0.1);
        assert!((794.0 * scale - 100.0).abs() < 1e-3);
        assert_eq!(field.scale_for(0.0, 0.1), 1.0);
    }
}
