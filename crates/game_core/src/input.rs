use {
    bevy::prelude::*,
    blocks::Block,
    common::{
        CancelSelection, GameStage, GameState, RestartGame, SelectBlock, SpawnBlock,
        UpgradeGunDamage, UpgradeGunRateOfFire, UpgradeSelectedBlock,
    },
    upgrades::Selection,
};

/// Maps keys to player intents for the windowed game.
///
/// `1` / `2` upgrade gun damage / rate of fire, `B` buys a block, arrow keys
/// walk the selection up and down the tower, `U` upgrades the selected
/// block, `Esc` clears the selection and `R` restarts after game over.
pub struct KeyboardControlsPlugin;

impl Plugin for KeyboardControlsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                read_play_keys.in_set(GameStage::FrameStart),
                read_restart_key.run_if(in_state(GameState::GameOver)),
            ),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Up,
    Down,
}

/// Next block in `column` (sorted bottom to top) after `current`, wrapping
/// around. With nothing selected, `Up` starts at the bottom and `Down` at
/// the top.
fn step_selection(column: &[Entity], current: Option<Entity>, step: Step) -> Option<Entity> {
    if column.is_empty() {
        return None;
    }
    let last = column.len() - 1;
    let index = match current.and_then(|entity| column.iter().position(|e| *e == entity)) {
        Some(index) => match step {
            Step::Up if index == last => 0,
            Step::Up => index + 1,
            Step::Down if index == 0 => last,
            Step::Down => index - 1,
        },
        None => match step {
            Step::Up => 0,
            Step::Down => last,
        },
    };
    Some(column[index])
}

// Systems

fn read_play_keys(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    blocks: Query<(Entity, &Transform), With<Block>>,
    selection: Res<Selection>,
    mut gun_damage: MessageWriter<UpgradeGunDamage>,
    mut gun_rate: MessageWriter<UpgradeGunRateOfFire>,
    mut spawn_block: MessageWriter<SpawnBlock>,
    mut select: MessageWriter<SelectBlock>,
    mut upgrade_selected: MessageWriter<UpgradeSelectedBlock>,
    mut cancel: MessageWriter<CancelSelection>,
) {
    if keyboard_input.just_pressed(KeyCode::Digit1) {
        gun_damage.write(UpgradeGunDamage);
    }
    if keyboard_input.just_pressed(KeyCode::Digit2) {
        gun_rate.write(UpgradeGunRateOfFire);
    }
    if keyboard_input.just_pressed(KeyCode::KeyB) {
        spawn_block.write(SpawnBlock);
    }

    let step = if keyboard_input.just_pressed(KeyCode::ArrowUp) {
        Some(Step::Up)
    } else if keyboard_input.just_pressed(KeyCode::ArrowDown) {
        Some(Step::Down)
    } else {
        None
    };
    if let Some(step) = step {
        let mut column: Vec<(Entity, f32)> = blocks
            .iter()
            .map(|(entity, transform)| (entity, transform.translation.y))
            .collect();
        column.sort_by(|a, b| a.1.total_cmp(&b.1));
        let column: Vec<Entity> = column.into_iter().map(|(entity, _)| entity).collect();
        if let Some(block) = step_selection(&column, selection.current(), step) {
            select.write(SelectBlock { block });
        }
    }

    if keyboard_input.just_pressed(KeyCode::KeyU) {
        upgrade_selected.write(UpgradeSelectedBlock);
    }
    if keyboard_input.just_pressed(KeyCode::Escape) {
        cancel.write(CancelSelection);
    }
}

fn read_restart_key(keyboard_input: Res<ButtonInput<KeyCode>>, mut restart: MessageWriter<RestartGame>) {
    if keyboard_input.just_pressed(KeyCode::KeyR) {
        restart.write(RestartGame);
    }
}
