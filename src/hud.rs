use bevy::prelude::*;

use crate::{
    bat::{Bat, Dash, Energy},
    resources::{GameState, RoundEntity, Score},
};

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Playing), spawn_hud).add_systems(
            Update,
            (
                energy_bar_system,
                dash_bar_system,
                score_text_system.run_if(resource_changed::<Score>),
            ),
        );
    }
}

const ENERGY_COLOR: Color = Color::srgb(0.0, 0.8, 0.2);
const DASH_COLOR: Color = Color::srgb(0.85, 0.1, 0.1);

#[derive(Component)]
pub struct EnergyBarFill;

#[derive(Component)]
pub struct DashBarFill;

#[derive(Component)]
pub struct ScoreText;

/// Width of a bar's fill inside its outline. Fills shrink towards the right.
pub fn fill_width(fraction: f32) -> Val {
    Val::Percent(fraction.clamp(0.0, 1.0) * 100.0)
}

fn spawn_bar(parent: &mut ChildSpawnerCommands, width: Val, height: Val, color: Color, fill: impl Bundle) {
    parent
        .spawn((
            Node {
                width,
                height,
                border: UiRect::all(Val::Px(1.0)),
                justify_content: JustifyContent::FlexEnd,
                ..default()
            },
            BackgroundColor(Color::BLACK),
            BorderColor::all(Color::BLACK),
        ))
        .with_children(|outline| {
            outline.spawn((
                fill,
                Node {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    ..default()
                },
                BackgroundColor(color),
            ));
        });
}

pub fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            RoundEntity,
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(0.0),
                right: Val::Px(0.0),
                padding: UiRect::all(Val::Px(10.0)),
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::FlexEnd,
                row_gap: Val::Px(10.0),
                ..default()
            },
        ))
        .with_children(|parent| {
            spawn_bar(parent, Val::Vw(33.0), Val::Vh(5.0), ENERGY_COLOR, EnergyBarFill);
            spawn_bar(parent, Val::Vw(10.0), Val::Vh(2.5), DASH_COLOR, DashBarFill);
        });

    commands.spawn((
        RoundEntity,
        ScoreText,
        Text::new(Score::default().label()),
        TextFont {
            font_size: 24.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
    ));
}

fn energy_bar_system(bats: Query<&Energy, With<Bat>>, mut fills: Query<&mut Node, With<EnergyBarFill>>) {
    let Ok(energy) = bats.single() else {
        return;
    };
    for mut node in &mut fills {
        node.width = fill_width(energy.fraction());
    }
}

fn dash_bar_system(
    time: Res<Time>,
    bats: Query<&Dash, With<Bat>>,
    mut fills: Query<&mut Node, With<DashBarFill>>,
) {
    let Ok(dash) = bats.single() else {
        return;
    };
    let remaining = dash.recharge_remaining(time.elapsed_secs());
    for mut node in &mut fills {
        node.width = fill_width(remaining);
    }
}

fn score_text_system(score: Res<Score>, mut texts: Query<&mut Text, With<ScoreText>>) {
    for mut text in &mut texts {
        text.0 = score.label();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_clamped() {
        assert_eq!(fill_width(0.5), Val::Percent(50.0));
        assert_eq!(fill_width(1.5), Val::Percent(100.0));
        assert_eq!(fill_width(-0.1), Val::Percent(0.0));
    }

    #[test]
    fn bars_and_score_follow_the_round() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Score>()
            .add_systems(Startup, spawn_hud)
            .add_systems(Update, (energy_bar_system, dash_bar_system, score_text_system));
        app.world_mut().spawn((
            Bat,
            Energy {
                current: 250.0,
                max: 1000.0,
            },
            Dash::new(0.5, 3.0),
        ));
        app.world_mut().run_schedule(Startup);
        app.world_mut().resource_mut::<Score>().hits = 2;
        app.world_mut().run_schedule(Update);

        let mut energy = app.world_mut().query_filtered::<&Node, With<EnergyBarFill>>();
        assert_eq!(energy.single(app.world()).unwrap().width, Val::Percent(25.0));

        let mut dash = app.world_mut().query_filtered::<&Node, With<DashBarFill>>();
        assert_eq!(dash.single(app.world()).unwrap().width, Val::Percent(0.0));

        let mut text = app.world_mut().query_filtered::<&Text, With<ScoreText>>();
        assert_eq!(text.single(app.world()).unwrap().0, "Hits: 2, Misses: 0");
    }
}
