use bevy::prelude::*;

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ControlState>()
            .add_message::<GameCommand>()
            .add_systems(FixedPreUpdate, sample_controls)
            .add_systems(Update, collect_game_commands);
    }
}

/// Held controls, sampled once per simulation tick
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    pub jump_held: bool,
    /// -1.0 = left, 0.0 = idle, 1.0 = right
    pub move_axis: f32,
}

/// One-shot requests from the keyboard
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameCommand {
    Restart,
    Advance,
    ReturnToMenu,
    /// Start the level at this catalog index
    SelectLevel(usize),
    /// Freeze or resume the simulation
    Pause,
    ToggleMute,
    VolumeUp,
    VolumeDown,
}

const JUMP_KEYS: [KeyCode; 3] = [KeyCode::ArrowUp, KeyCode::Space, KeyCode::KeyW];
const LEFT_KEYS: [KeyCode; 2] = [KeyCode::ArrowLeft, KeyCode::KeyA];
const RIGHT_KEYS: [KeyCode; 2] = [KeyCode::ArrowRight, KeyCode::KeyD];
const LEVEL_KEYS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

/// Levels, not edges: edge detection belongs to the progression controller
fn sample_controls(keys: Res<ButtonInput<KeyCode>>, mut controls: ResMut<ControlState>) {
    let left = keys.any_pressed(LEFT_KEYS);
    let right = keys.any_pressed(RIGHT_KEYS);

    controls.jump_held = keys.any_pressed(JUMP_KEYS);
    controls.move_axis = match (left, right) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    };
}

fn collect_game_commands(keys: Res<ButtonInput<KeyCode>>, mut out: MessageWriter<GameCommand>) {
    if keys.just_pressed(KeyCode::KeyR) {
        out.write(GameCommand::Restart);
    }
    if keys.any_just_pressed([KeyCode::Enter, KeyCode::KeyN]) {
        out.write(GameCommand::Advance);
    }
    if keys.just_pressed(KeyCode::Escape) {
        out.write(GameCommand::ReturnToMenu);
    }
    if keys.just_pressed(KeyCode::KeyP) {
        out.write(GameCommand::Pause);
    }
    if keys.just_pressed(KeyCode::KeyM) {
        out.write(GameCommand::ToggleMute);
    }
    if keys.just_pressed(KeyCode::Equal) {
        out.write(GameCommand::VolumeUp);
    }
    if keys.just_pressed(KeyCode::Minus) {
        out.write(GameCommand::VolumeDown);
    }
    for (index, key) in LEVEL_KEYS.iter().enumerate() {
        if keys.just_pressed(*key) {
            out.write(GameCommand::SelectLevel(index));
        }
    }
}
