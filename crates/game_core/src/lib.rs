#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]

use {
    bevy::prelude::*,
    bevy_common_assets::ron::RonAssetPlugin,
    blocks::{Block, BlocksPlugin, TowerSettings, block_bundle},
    common::{
        DamageStep, GameState, GameStage, Health, Player, RestartGame, RoundEntity, UpgradeConfig,
        UpgradeTables, apply_damage, despawn_dead,
    },
    effects::EffectsPlugin,
    gun::{GunPlugin, GunSettings, PlayerGun, gun_bundle},
    ledger::{Ledger, LedgerPlugin},
    turrets::{AvailableWeapons, TurretsPlugin, weapon_bundle},
    upgrades::{Selection, UpgradesPlugin},
    zombies::{WaveConfig, WaveScheduler, ZombiesPlugin},
};

pub mod config;
pub mod input;

pub use {
    config::{
        ConfigHandles, GameConfig, PlayerSettings, WeaponMount, collect_weapons, validate_configs,
    },
    input::KeyboardControlsPlugin,
};

/// The whole game: config loading plus gameplay.
pub struct ZombieStackPlugin;

impl Plugin for ZombieStackPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            RonAssetPlugin::<GameConfig>::new(&["game.ron"]),
            RonAssetPlugin::<UpgradeConfig>::new(&["upgrades.ron"]),
            RonAssetPlugin::<WaveConfig>::new(&["waves.ron"]),
        ));

        app.init_resource::<ConfigHandles>();
        app.add_systems(Startup, config::start_loading);
        app.add_systems(
            Update,
            config::check_assets_ready.run_if(in_state(GameState::Loading)),
        );

        app.add_plugins((GameplayPlugin, KeyboardControlsPlugin));

        info!("Zombie Stack core initialized");
    }
}

/// Everything that runs once configs are in place.
pub struct GameplayPlugin;

impl Plugin for GameplayPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>();
        common::configure_stages(app);

        app.register_type::<Player>()
            .register_type::<Health>()
            .register_type::<RoundEntity>()
            .register_type::<GameConfig>();

        app.add_message::<RestartGame>();

        app.add_plugins((
            LedgerPlugin,
            BlocksPlugin,
            ZombiesPlugin,
            GunPlugin,
            TurretsPlugin,
            UpgradesPlugin,
            EffectsPlugin,
        ));

        app.add_systems(OnEnter(GameState::Playing), start_round);
        app.add_systems(OnEnter(GameState::GameOver), announce_game_over);

        app.add_systems(
            Update,
            (
                apply_damage.in_set(GameStage::Effect).in_set(DamageStep),
                (rest_player_on_tower, check_player_death, despawn_dead)
                    .chain()
                    .in_set(GameStage::FrameEnd),
            ),
        );
        app.add_systems(
            Update,
            handle_restart.run_if(in_state(GameState::GameOver)),
        );
    }
}

// Systems

fn start_round(
    mut commands: Commands,
    game: Res<GameConfig>,
    tables: Res<UpgradeTables>,
    gun_settings: Res<GunSettings>,
    tower: Res<TowerSettings>,
    waves: Res<WaveConfig>,
    weapons: Res<AvailableWeapons>,
    mut ledger: ResMut<Ledger>,
    mut selection: ResMut<Selection>,
) {
    ledger.reset(game.starting_balance);
    selection.clear();
    commands.insert_resource(WaveScheduler::new(waves.clone()));

    let player_position = game.player.position();
    commands.spawn((
        Player,
        Health::new(game.player.health),
        Transform::from_translation(player_position),
        RoundEntity,
    ));
    commands.spawn(gun_bundle(&gun_settings, &tables, player_position));

    let ground = tower.spawn_point();
    for index in 0..tower.initial_blocks {
        let position = ground + Vec3::Y * (index as f32 * tower.block_height);
        commands.spawn(block_bundle(&tables, &tower, position));
    }

    for mount in &game.weapons {
        let Some(data) = weapons.find(&mount.weapon) else {
            warn!("Unknown tower weapon '{}', skipping", mount.weapon);
            continue;
        };
        let position = Vec3::new(mount.position[0], mount.position[1], 0.0);
        commands.spawn(weapon_bundle(data.clone(), position));
    }

    info!(
        "Round started: {} blocks, {} weapons, balance {}",
        tower.initial_blocks,
        game.weapons.len(),
        ledger.balance()
    );
}

/// The player stands on top of the column and drops with it as blocks are
/// destroyed; the gun follows.
fn rest_player_on_tower(
    tower: Res<TowerSettings>,
    gun_settings: Res<GunSettings>,
    blocks: Query<(), With<Block>>,
    mut player: Query<&mut Transform, With<Player>>,
    mut guns: Query<&mut Transform, (With<PlayerGun>, Without<Player>)>,
) {
    let Ok(mut player_transform) = player.single_mut() else {
        return;
    };
    let y = tower.spawn_point[1] + blocks.iter().count() as f32 * tower.block_height;
    if player_transform.translation.y != y {
        player_transform.translation.y = y;
    }

    let muzzle = player_transform.translation
        + Vec3::new(gun_settings.offset[0], gun_settings.offset[1], 0.0);
    for mut gun in guns.iter_mut() {
        if gun.translation != muzzle {
            gun.translation = muzzle;
        }
    }
}

fn check_player_death(
    player: Query<&Health, With<Player>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if player.iter().any(Health::is_depleted) {
        next_state.set(GameState::GameOver);
    }
}

fn announce_game_over(blocks: Query<(), With<Block>>) {
    info!("Game over with {} blocks standing", blocks.iter().count());
}

fn handle_restart(
    mut commands: Commands,
    mut requests: MessageReader<RestartGame>,
    round: Query<Entity, With<RoundEntity>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if requests.read().count() == 0 {
        return;
    }
    for entity in round.iter() {
        commands.entity(entity).despawn();
    }
    info!("Restarting round");
    next_state.set(GameState::Playing);
}

#[cfg(test)]
mod tests_integration;
