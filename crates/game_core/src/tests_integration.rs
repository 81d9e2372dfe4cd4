use {
    crate::*,
    bevy::{asset::LoadedFolder, state::app::StatesPlugin, time::TimePlugin},
    common::{
        DamageMessage, GrowthStrategy, LevelRecord, RequestBlockUpgrade, StatTableConfig,
        UpgradeTrack, ZombieKilled,
    },
    gun::{GunUpgrades, PlayerGun},
    turrets::{TowerWeapon, WeaponData, WeaponKind},
    zombies::{Zombie, ZombieSettings, zombie_bundle},
};

fn upgrade_config() -> UpgradeConfig {
    ron::from_str(include_str!("../../../assets/configs/main.upgrades.ron")).unwrap()
}

fn wave_config() -> WaveConfig {
    ron::from_str(include_str!("../../../assets/configs/main.waves.ron")).unwrap()
}

fn game_config() -> GameConfig {
    ron::from_str(include_str!("../../../assets/configs/main.game.ron")).unwrap()
}

fn chainsaw() -> WeaponData {
    ron::from_str(include_str!("../../../assets/configs/weapons/chainsaw.weapon.ron")).unwrap()
}

// Same resources the loading state would install, minus the asset server round trip.
fn setup_app(starting_balance: u32) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins.build().disable::<TimePlugin>(), StatesPlugin))
        .add_plugins(AssetPlugin::default());
    app.insert_resource(Time::<()>::default());
    app.add_plugins(GameplayPlugin);

    let mut game = game_config();
    game.starting_balance = starting_balance;
    let upgrades = upgrade_config();
    let waves = wave_config();
    let tables = validate_configs(&game, &upgrades, &waves).unwrap();

    app.insert_resource(tables)
        .insert_resource(game.gun.clone())
        .insert_resource(game.tower.clone())
        .insert_resource(game.zombie.clone())
        .insert_resource(waves)
        .insert_resource(AvailableWeapons(vec![chainsaw()]))
        .insert_resource(game);

    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::Playing);
    app.update();
    app
}

fn blocks(app: &mut App) -> Vec<(Entity, u32)> {
    let mut query = app.world_mut().query::<(Entity, &Block, &Transform)>();
    let mut found: Vec<_> = query
        .iter(app.world())
        .map(|(e, b, t)| (e, b.upgrade.level(), t.translation.y))
        .collect();
    found.sort_by(|a, b| a.2.total_cmp(&b.2));
    found.into_iter().map(|(e, level, _)| (e, level)).collect()
}

fn player(app: &mut App) -> Entity {
    let mut query = app.world_mut().query_filtered::<Entity, With<Player>>();
    query.single(app.world()).unwrap()
}

fn balance(app: &App) -> u32 {
    app.world().resource::<Ledger>().balance()
}

fn state(app: &App) -> GameState {
    app.world().resource::<State<GameState>>().get().clone()
}

#[test]
fn shipped_configs_are_valid() {
    let tables = validate_configs(&game_config(), &upgrade_config(), &wave_config()).unwrap();
    assert_eq!(tables.table(UpgradeTrack::GunDamage).max_level(), 10);
    assert_eq!(tables.table(UpgradeTrack::GunRateOfFire).max_level(), 10);
    assert_eq!(tables.table(UpgradeTrack::BlockMaxHealth).max_level(), 3);
    assert_eq!(tables.gun_damage.value_at(1), 10.0);
    assert_eq!(tables.gun_rate_of_fire.value_at(1), 2.0);
    assert_eq!(tables.block_max_health.cost_to_advance(1), Some(200));
}

#[test]
fn broken_configs_are_rejected() {
    let game = game_config();
    let waves = wave_config();

    let mut upgrades = upgrade_config();
    upgrades.block_max_health = StatTableConfig::Levels(vec![
        LevelRecord::new(1, 100.0, None),
        LevelRecord::new(2, 150.0, None),
        LevelRecord::new(3, 250.0, None),
    ]);
    let err = validate_configs(&game, &upgrades, &waves).unwrap_err();
    assert!(format!("{err:#}").contains("block_max_health"));

    let mut upgrades = upgrade_config();
    upgrades.gun_damage = StatTableConfig::Scaled {
        max_level: 3,
        value: GrowthStrategy::Static(1.0),
        cost: GrowthStrategy::Static(1.0),
    };
    assert!(validate_configs(&game, &upgrades, &waves).is_err());

    let mut no_spawns = wave_config();
    no_spawns.spawn_points.clear();
    assert!(validate_configs(&game, &upgrade_config(), &no_spawns).is_err());
}

#[test]
fn round_starts_with_fresh_state() {
    let mut app = setup_app(350);
    let game = game_config();

    assert_eq!(state(&app), GameState::Playing);
    assert_eq!(balance(&app), 350);
    assert!(app.world().get_resource::<WaveScheduler>().is_some());

    let blocks = blocks(&mut app);
    assert_eq!(blocks.len(), game.tower.initial_blocks as usize);
    assert!(blocks.iter().all(|(_, level)| *level == 1));

    let mut guns = app.world_mut().query::<(&PlayerGun, &GunUpgrades)>();
    let (gun, upgrades) = guns.single(app.world()).unwrap();
    assert_eq!(upgrades.damage.level(), 1);
    assert_eq!(upgrades.rate_of_fire.level(), 1);
    assert_eq!(gun.damage, 10.0);
    assert_eq!(gun.rate_of_fire, 2.0);

    let mut weapons = app.world_mut().query::<&TowerWeapon>();
    let mounted: Vec<WeaponKind> = weapons.iter(app.world()).map(|w| w.data.kind).collect();
    assert_eq!(mounted, vec![WeaponKind::Chainsaw]);
}

#[test]
fn kills_pay_for_block_upgrade() {
    let mut app = setup_app(190);
    let zombie = app
        .world_mut()
        .spawn(zombie_bundle(&ZombieSettings::default(), Vec3::new(30.0, 0.0, 0.0)))
        .id();
    let source = player(&mut app);

    app.world_mut()
        .resource_mut::<Messages<DamageMessage>>()
        .write(DamageMessage {
            source,
            target: zombie,
            amount: 50.0,
        });
    app.update();
    app.update();

    assert!(app.world().get::<Zombie>(zombie).is_none());
    assert_eq!(balance(&app), 200);

    let (bottom, _) = blocks(&mut app)[0];
    app.world_mut()
        .resource_mut::<Messages<RequestBlockUpgrade>>()
        .write(RequestBlockUpgrade { block: bottom });
    app.update();

    assert_eq!(balance(&app), 0);
    assert_eq!(blocks(&mut app)[0], (bottom, 2));
    assert_eq!(app.world().get::<Health>(bottom).unwrap(), &Health::new(150.0));
}

#[test]
fn reward_messages_credit_ledger() {
    let mut app = setup_app(0);
    let zombie = app.world_mut().spawn_empty().id();
    app.world_mut()
        .resource_mut::<Messages<ZombieKilled>>()
        .write(ZombieKilled {
            entity: zombie,
            reward: 75,
        });
    app.update();
    assert_eq!(balance(&app), 75);
}

#[test]
fn player_death_ends_round_and_restart_resets_everything() {
    let mut app = setup_app(500);
    let (first_block, _) = blocks(&mut app)[0];
    app.world_mut()
        .resource_mut::<Messages<RequestBlockUpgrade>>()
        .write(RequestBlockUpgrade { block: first_block });
    app.update();
    assert_eq!(balance(&app), 300);

    let player_entity = player(&mut app);
    app.world_mut()
        .get_mut::<Health>(player_entity)
        .unwrap()
        .take_damage(10_000.0);
    app.update();
    app.update();
    assert_eq!(state(&app), GameState::GameOver);

    app.world_mut()
        .resource_mut::<Messages<RestartGame>>()
        .write(RestartGame);
    app.update();
    app.update();

    assert_eq!(state(&app), GameState::Playing);
    assert_eq!(balance(&app), 500);
    assert!(app.world().get_entity(player_entity).is_err());
    assert!(app.world().get_entity(first_block).is_err());

    let fresh_player = player(&mut app);
    assert!(!app.world().get::<Health>(fresh_player).unwrap().is_depleted());
    let blocks = blocks(&mut app);
    assert_eq!(blocks.len(), game_config().tower.initial_blocks as usize);
    assert!(blocks.iter().all(|(_, level)| *level == 1));
    assert_eq!(app.world().resource::<Selection>().current(), None);
}

#[test]
fn player_drops_as_blocks_are_destroyed() {
    let mut app = setup_app(0);
    let player_entity = player(&mut app);
    app.update();
    let height = |app: &App| app.world().get::<Transform>(player_entity).unwrap().translation.y;
    assert_eq!(height(&app), 3.0);

    let (top, _) = *blocks(&mut app).last().unwrap();
    app.world_mut().get_mut::<Health>(top).unwrap().take_damage(1_000.0);
    app.update();
    app.update();

    assert_eq!(blocks(&mut app).len(), 2);
    assert_eq!(height(&app), 2.0);

    let mut guns = app.world_mut().query_filtered::<&Transform, With<PlayerGun>>();
    let gun_y = guns.single(app.world()).unwrap().translation.y;
    assert_eq!(gun_y, 2.5);
}

#[test]
fn weapon_folder_must_resolve_completely() {
    let game = game_config();
    let mut weapon_assets = Assets::<WeaponData>::default();
    let chainsaw_handle = weapon_assets.add(chainsaw()).untyped();

    let folder = LoadedFolder {
        handles: vec![chainsaw_handle.clone()],
    };
    let weapons = collect_weapons(&game, &folder, &weapon_assets).unwrap();
    assert_eq!(weapons.len(), 1);
    assert_eq!(weapons[0].kind, WeaponKind::Chainsaw);

    let still_loading = LoadedFolder {
        handles: vec![chainsaw_handle, Handle::<WeaponData>::default().untyped()],
    };
    let err = collect_weapons(&game, &still_loading, &weapon_assets).unwrap_err();
    assert!(format!("{err:#}").contains("did not load"));
}

#[test]
fn mount_naming_missing_weapon_is_rejected() {
    let mut game = game_config();
    game.weapons.push(WeaponMount {
        weapon: "railgun".into(),
        position: [2.0, 0.0],
    });
    let mut weapon_assets = Assets::<WeaponData>::default();
    let folder = LoadedFolder {
        handles: vec![weapon_assets.add(chainsaw()).untyped()],
    };

    let err = collect_weapons(&game, &folder, &weapon_assets).unwrap_err();
    assert!(err.to_string().contains("railgun"));
}
