use {
    anyhow::{Context, ensure},
    bevy::{asset::LoadedFolder, prelude::*},
    blocks::TowerSettings,
    common::{GameState, UpgradeConfig, UpgradeTables},
    gun::GunSettings,
    serde::Deserialize,
    turrets::{AvailableWeapons, WeaponData},
    zombies::{WaveConfig, ZombieSettings},
};

// Configs

#[derive(Deserialize, Asset, Clone, Debug, Resource, Reflect)]
pub struct GameConfig {
    pub starting_balance: u32,
    pub player: PlayerSettings,
    pub gun: GunSettings,
    pub tower: TowerSettings,
    pub zombie: ZombieSettings,
    #[serde(default)]
    pub weapons: Vec<WeaponMount>,
}

#[derive(Deserialize, Clone, Debug, Reflect)]
pub struct PlayerSettings {
    pub position: [f32; 2],
    pub health: f32,
}

impl PlayerSettings {
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], 0.0)
    }
}

/// A tower weapon placed at round start, by weapon name.
#[derive(Deserialize, Clone, Debug, Reflect)]
pub struct WeaponMount {
    pub weapon: String,
    pub position: [f32; 2],
}

// Resources

#[derive(Resource, Default)]
pub struct ConfigHandles {
    pub game: Handle<GameConfig>,
    pub upgrades: Handle<UpgradeConfig>,
    pub waves: Handle<WaveConfig>,
    pub weapons_folder: Handle<LoadedFolder>,
}

/// Checks the loaded configs against each other and builds the upgrade
/// tables. Anything wrong here would otherwise surface mid-round.
pub fn validate_configs(
    game: &GameConfig,
    upgrades: &UpgradeConfig,
    waves: &WaveConfig,
) -> anyhow::Result<UpgradeTables> {
    let tables = upgrades
        .build_tables()
        .context("configs/main.upgrades.ron")?;

    ensure!(
        !waves.spawn_points.is_empty(),
        "configs/main.waves.ron: no zombie spawn points"
    );
    ensure!(
        waves.spawn_rate_multiplier > 0.0,
        "configs/main.waves.ron: spawn_rate_multiplier must be positive"
    );
    ensure!(
        game.tower.block_height > 0.0,
        "configs/main.game.ron: block_height must be positive"
    );
    ensure!(
        game.player.health > 0.0,
        "configs/main.game.ron: player health must be positive"
    );

    Ok(tables)
}

/// Resolves every weapon in the folder and checks that each mount names
/// one of them.
pub fn collect_weapons(
    game: &GameConfig,
    folder: &LoadedFolder,
    weapon_assets: &Assets<WeaponData>,
) -> anyhow::Result<Vec<WeaponData>> {
    let mut weapons = Vec::with_capacity(folder.handles.len());
    for handle in &folder.handles {
        let path = handle
            .path()
            .map(|path| path.to_string())
            .unwrap_or_else(|| format!("{:?}", handle.id()));
        let typed_handle = handle
            .clone()
            .try_typed::<WeaponData>()
            .with_context(|| format!("configs/weapons: {path} is not a weapon"))?;
        let weapon = weapon_assets
            .get(&typed_handle)
            .with_context(|| format!("configs/weapons: {path} did not load"))?;
        weapons.push(weapon.clone());
    }

    for mount in &game.weapons {
        ensure!(
            weapons.iter().any(|weapon| weapon.name == mount.weapon),
            "configs/main.game.ron: unknown tower weapon '{}'",
            mount.weapon
        );
    }
    Ok(weapons)
}

// Systems

pub(crate) fn start_loading(asset_server: Res<AssetServer>, mut handles: ResMut<ConfigHandles>) {
    handles.game = asset_server.load("configs/main.game.ron");
    handles.upgrades = asset_server.load("configs/main.upgrades.ron");
    handles.waves = asset_server.load("configs/main.waves.ron");
    handles.weapons_folder = asset_server.load_folder("configs/weapons");
    debug!("Config loading started");
}

pub(crate) fn check_assets_ready(
    mut commands: Commands,
    handles: Res<ConfigHandles>,
    game_configs: Res<Assets<GameConfig>>,
    upgrade_configs: Res<Assets<UpgradeConfig>>,
    wave_configs: Res<Assets<WaveConfig>>,
    asset_server: Res<AssetServer>,
    loaded_folders: Res<Assets<LoadedFolder>>,
    weapon_assets: Res<Assets<WeaponData>>,
    mut available_weapons: ResMut<AvailableWeapons>,
    mut next_state: ResMut<NextState<GameState>>,
    mut exit: MessageWriter<AppExit>,
) {
    let (Some(game), Some(upgrades), Some(waves), Some(weapons_folder)) = (
        game_configs.get(&handles.game),
        upgrade_configs.get(&handles.upgrades),
        wave_configs.get(&handles.waves),
        loaded_folders.get(&handles.weapons_folder),
    ) else {
        return;
    };
    // The folder asset lands before the files it lists.
    if !asset_server.is_loaded_with_dependencies(&handles.weapons_folder) {
        return;
    }

    let loaded = validate_configs(game, upgrades, waves).and_then(|tables| {
        let weapons = collect_weapons(game, weapons_folder, &weapon_assets)?;
        Ok((tables, weapons))
    });
    let (tables, weapons) = match loaded {
        Ok(loaded) => loaded,
        Err(err) => {
            error!("Invalid game configuration: {:#}", err);
            exit.write(AppExit::error());
            return;
        }
    };

    available_weapons.0 = weapons;
    info!("Loaded {} tower weapons", available_weapons.0.len());

    commands.insert_resource(tables);
    commands.insert_resource(game.gun.clone());
    commands.insert_resource(game.tower.clone());
    commands.insert_resource(game.zombie.clone());
    commands.insert_resource(waves.clone());
    commands.insert_resource(game.clone());

    info!("Configs loaded. Transitioning to Playing.");
    next_state.set(GameState::Playing);
}
