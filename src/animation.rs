use bevy::prelude::*;

pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreStartup, load_sprite_sheets).add_systems(
            Update,
            (
                switch_animation_system,
                animation_system,
                despawn_finished_system,
            )
                .chain(),
        );
    }
}

#[derive(Component, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[require(AnimationState, Sprite)]
pub enum AnimationType {
    BatFly,
    BatDash,
    BatEat,
    BatMouthOpen,
    BatTired,
    SheepRun,
    FishSwim,
    // Launch plays once, then the spit keeps spinning with SpitIdle
    SpitLaunch,
    SpitIdle,
    FlyIdle,
    FrogIdle,
    FrogCroak,
    FrogTongue,
    LilyPad,
    WaterSplash,
}

/// The sprite sheets on disk. Several animations can share one sheet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SheetId {
    Bat,
    Sheep,
    FishYellow,
    Spit,
    Fly,
    FrogIdle,
    FrogCroak,
    FrogTongue,
    LilyPad,
    Splash,
}

impl SheetId {
    pub const ALL: [SheetId; 10] = [
        SheetId::Bat,
        SheetId::Sheep,
        SheetId::FishYellow,
        SheetId::Spit,
        SheetId::Fly,
        SheetId::FrogIdle,
        SheetId::FrogCroak,
        SheetId::FrogTongue,
        SheetId::LilyPad,
        SheetId::Splash,
    ];

    pub fn path(self) -> &'static str {
        match self {
            SheetId::Bat => "bat/sprite_sheet.png",
            SheetId::Sheep => "sheep/sprite_sheet.png",
            SheetId::FishYellow => "fish/yellow_sprite_sheet.png",
            SheetId::Spit => "fish/fishspit.png",
            SheetId::Fly => "fly/fly_idle_sheet.png",
            SheetId::FrogIdle => "frog/frog_idle_sheet.png",
            SheetId::FrogCroak => "frog/frog_croak_sheet.png",
            SheetId::FrogTongue => "frog/frog_tongue_sheet.png",
            SheetId::LilyPad => "frog/lily_pad_sheet.png",
            SheetId::Splash => "splash_sheet.png",
        }
    }

    /// Size of one frame in texels.
    pub fn frame_size(self) -> UVec2 {
        match self {
            SheetId::Bat => UVec2::new(794, 550),
            SheetId::Sheep => UVec2::new(504, 556),
            SheetId::FishYellow => UVec2::new(579, 508),
            SheetId::Spit => UVec2::new(325, 404),
            SheetId::Fly => UVec2::new(160, 166),
            SheetId::FrogIdle | SheetId::FrogCroak => UVec2::new(759, 719),
            SheetId::FrogTongue => UVec2::new(759, 2142),
            SheetId::LilyPad => UVec2::new(708, 192),
            SheetId::Splash => UVec2::new(1802, 855),
        }
    }

    /// Grid of the sheet as (columns, rows).
    fn grid(self) -> (u32, u32) {
        match self {
            SheetId::Bat | SheetId::FishYellow => (4, 1),
            SheetId::Sheep => (4, 4),
            SheetId::Spit => (5, 1),
            SheetId::Fly | SheetId::FrogIdle | SheetId::FrogCroak | SheetId::LilyPad => (3, 1),
            SheetId::FrogTongue => (9, 1),
            SheetId::Splash => (11, 4),
        }
    }
}

/// How one animation plays: which frames of which sheet, how fast, and
/// what happens at the end.
#[derive(Clone, Debug, PartialEq)]
pub struct Clip {
    pub sheet: SheetId,
    pub frames: Vec<usize>,
    pub fps: f32,
    pub looping: bool,
    /// Played automatically when a non-looping clip finishes.
    pub next: Option<AnimationType>,
}

/// `a..=b`, counting down when `b < a` so clips can play frames backwards.
fn span(a: usize, b: usize) -> impl Iterator<Item = usize> {
    let up = (a <= b).then(|| a..=b).into_iter().flatten();
    let down = (b < a).then(|| (b..=a).rev()).into_iter().flatten();
    up.chain(down)
}

fn frames(spans: &[(usize, usize)]) -> Vec<usize> {
    spans.iter().flat_map(|&(a, b)| span(a, b)).collect()
}

impl AnimationType {
    pub fn clip(self) -> Clip {
        let (sheet, frames, fps, looping, next) = match self {
            AnimationType::BatFly => (SheetId::Bat, frames(&[(0, 3)]), 5.0, true, None),
            AnimationType::BatDash => (SheetId::Bat, frames(&[(0, 3)]), 15.0, true, None),
            AnimationType::BatEat => (SheetId::Bat, frames(&[(2, 3), (3, 2)]), 12.0, true, None),
            AnimationType::BatMouthOpen => (SheetId::Bat, frames(&[(1, 2)]), 8.0, true, None),
            AnimationType::BatTired => (SheetId::Bat, frames(&[(0, 3)]), 3.0, true, None),
            AnimationType::SheepRun => (SheetId::Sheep, frames(&[(0, 15)]), 15.0, true, None),
            AnimationType::FishSwim => (SheetId::FishYellow, frames(&[(0, 3)]), 15.0, true, None),
            AnimationType::SpitLaunch => (
                SheetId::Spit,
                frames(&[(0, 4)]),
                15.0,
                false,
                Some(AnimationType::SpitIdle),
            ),
            AnimationType::SpitIdle => (SheetId::Spit, frames(&[(2, 4)]), 15.0, true, None),
            AnimationType::FlyIdle => (SheetId::Fly, frames(&[(0, 2), (1, 1)]), 18.0, true, None),
            AnimationType::FrogIdle => (SheetId::FrogIdle, frames(&[(0, 2), (1, 1)]), 9.0, true, None),
            AnimationType::FrogCroak => (SheetId::FrogCroak, frames(&[(0, 2), (1, 1)]), 9.0, false, None),
            AnimationType::FrogTongue => (SheetId::FrogTongue, frames(&[(0, 8), (7, 1)]), 9.0, false, None),
            AnimationType::LilyPad => (SheetId::LilyPad, frames(&[(0, 2), (1, 1)]), 9.0, true, None),
            AnimationType::WaterSplash => (
                SheetId::Splash,
                frames(&[
                    (0, 0),
                    (11, 11),
                    (22, 22),
                    (29, 34),
                    (1, 10),
                    (12, 21),
                    (23, 28),
                ]),
                18.0,
                false,
                None,
            ),
        };
        Clip {
            sheet,
            frames,
            fps,
            looping,
            next,
        }
    }
}

#[derive(Component, Default, Debug)]
pub struct AnimationState {
    /// Position in the clip's frame list, not the atlas index.
    pub frame_index: usize,
    pub frame_timer: f32,
    pub frame_duration: f32, // seconds per frame
    total_frames: usize,
    pub looping: bool,  // Whether animation should loop
    pub finished: bool, // True when non-looping animation completes
    /// Atlas indices, copied from the clip when it starts.
    pub frames: Vec<usize>,
    pub next: Option<AnimationType>,
}

impl AnimationState {
    pub fn new(frame_duration: f32, total_frames: usize, looping: bool) -> Self {
        AnimationState {
            frame_index: 0,
            frame_timer: 0.0,
            frame_duration,
            looping,
            finished: false,
            total_frames,
            frames: Vec::new(),
            next: None,
        }
    }

    pub fn for_clip(clip: Clip) -> Self {
        let mut state = AnimationState::new(1.0 / clip.fps, clip.frames.len(), clip.looping);
        state.frames = clip.frames;
        state.next = clip.next;
        state
    }

    pub fn atlas_index(&self) -> Option<usize> {
        self.frames.get(self.frame_index).copied()
    }

    /// Advances the clock. Returns true on the frame a non-looping clip ends.
    pub fn update(&mut self, delta_time: f32) -> bool {
        if self.finished || self.total_frames == 0 || self.frame_duration <= 0.0 {
            return false;
        }

        self.frame_timer += delta_time;

        while self.frame_timer >= self.frame_duration {
            self.frame_timer -= self.frame_duration;
            self.frame_index += 1;

            if self.frame_index >= self.total_frames {
                if self.looping {
                    self.frame_index = 0;
                } else {
                    self.frame_index = self.total_frames - 1; // Stay on last frame
                    self.finished = true;
                    return true;
                }
            }
        }
        false
    }
}

#[derive(Clone, Debug)]
pub struct Sheet {
    pub image: Handle<Image>,
    pub layout: Handle<TextureAtlasLayout>,
}

/// Loaded once so spawning never hits the asset server again.
#[derive(Resource)]
pub struct SpriteSheets {
    pub bat: Sheet,
    pub sheep: Sheet,
    pub fish_yellow: Sheet,
    pub spit: Sheet,
    pub fly: Sheet,
    pub frog_idle: Sheet,
    pub frog_croak: Sheet,
    pub frog_tongue: Sheet,
    pub lily_pad: Sheet,
    pub splash: Sheet,
}

impl SpriteSheets {
    pub fn get(&self, id: SheetId) -> &Sheet {
        match id {
            SheetId::Bat => &self.bat,
            SheetId::Sheep => &self.sheep,
            SheetId::FishYellow => &self.fish_yellow,
            SheetId::Spit => &self.spit,
            SheetId::Fly => &self.fly,
            SheetId::FrogIdle => &self.frog_idle,
            SheetId::FrogCroak => &self.frog_croak,
            SheetId::FrogTongue => &self.frog_tongue,
            SheetId::LilyPad => &self.lily_pad,
            SheetId::Splash => &self.splash,
        }
    }
}

/// Plays the clip once and despawns the entity (splashes).
#[derive(Component)]
pub struct DespawnWhenFinished;

pub fn animation_system(
    mut query: Query<(&mut AnimationState, &mut Sprite, &mut AnimationType, Entity)>,
    time: Res<Time>,
    mut commands: Commands,
) {
    for (mut anim_state, mut sprite, mut animation_type, entity) in query.iter_mut() {
        let finished = anim_state.update(time.delta_secs());
        if finished {
            commands.trigger(AnimationFinishedEvent {
                entity,
                animation_type: *animation_type,
            });
            if let Some(next) = anim_state.next {
                // Picked up by switch_animation_system next frame
                *animation_type = next;
            }
        }

        if let (Some(atlas), Some(frame)) = (sprite.texture_atlas.as_mut(), anim_state.atlas_index()) {
            atlas.index = frame;
        }
    }
}

/// Swaps image, atlas and clock whenever an entity's AnimationType changes
/// (including when it is first spawned).
pub fn switch_animation_system(
    mut query: Query<(&mut AnimationState, &mut Sprite, &AnimationType), Changed<AnimationType>>,
    sprite_sheets: Res<SpriteSheets>,
) {
    for (mut anim_state, mut sprite, animation_type) in query.iter_mut() {
        let clip = animation_type.clip();
        let sheet = sprite_sheets.get(clip.sheet);
        sprite.image = sheet.image.clone();
        sprite.texture_atlas = Some(TextureAtlas {
            layout: sheet.layout.clone(),
            index: clip.frames.first().copied().unwrap_or_default(),
        });
        *anim_state = AnimationState::for_clip(clip);
    }
}

fn despawn_finished_system(
    mut commands: Commands,
    query: Query<(Entity, &AnimationState), With<DespawnWhenFinished>>,
) {
    for (entity, animation_state) in query.iter() {
        if animation_state.finished {
            commands.entity(entity).despawn();
        }
    }
}

pub fn load_sprite_sheets(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut texture_atlas_layouts: ResMut<Assets<TextureAtlasLayout>>,
) {
    let mut load = |id: SheetId| {
        let (columns, rows) = id.grid();
        Sheet {
            image: asset_server.load(id.path()),
            layout: texture_atlas_layouts.add(TextureAtlasLayout::from_grid(
                id.frame_size(),
                columns,
                rows,
                None,
                None,
            )),
        }
    };

    commands.insert_resource(SpriteSheets {
        bat: load(SheetId::Bat),
        sheep: load(SheetId::Sheep),
        fish_yellow: load(SheetId::FishYellow),
        spit: load(SheetId::Spit),
        fly: load(SheetId::Fly),
        frog_idle: load(SheetId::FrogIdle),
        frog_croak: load(SheetId::FrogCroak),
        frog_tongue: load(SheetId::FrogTongue),
        lily_pad: load(SheetId::LilyPad),
        splash: load(SheetId::Splash),
    });
    debug!("Queued {} sprite sheets", SheetId::ALL.len());
}

#[derive(Event)]
pub struct AnimationFinishedEvent {
    pub entity: Entity,
    pub animation_type: AnimationType,
}
