use {
    crate::*,
    bevy::{state::app::StatesPlugin, time::TimePlugin},
    blocks::{TowerSettings, block_bundle},
    common::{GUN_MAX_LEVEL, GameState, GrowthStrategy, LevelRecord, StatTable},
    gun::{GunSettings, ProjectileTier, gun_bundle},
};

#[derive(Resource, Default)]
struct Seen {
    levels: Vec<LevelChanged>,
    rejections: Vec<UpgradeRejected>,
}

fn record(
    mut levels: MessageReader<LevelChanged>,
    mut rejections: MessageReader<UpgradeRejected>,
    mut seen: ResMut<Seen>,
) {
    seen.levels.extend(levels.read().cloned());
    seen.rejections.extend(rejections.read().cloned());
}

fn tables() -> UpgradeTables {
    let gun = |name: &str, base: f32, step: f32| {
        StatTable::from_growth(
            name,
            GUN_MAX_LEVEL,
            &GrowthStrategy::Incremental { base, step },
            &GrowthStrategy::Static(100.0),
        )
        .unwrap()
    };
    UpgradeTables {
        gun_damage: gun("gun_damage", 10.0, 5.0),
        gun_rate_of_fire: gun("gun_rate_of_fire", 2.0, 0.5),
        block_max_health: StatTable::new(
            "block_max_health",
            vec![
                LevelRecord::new(1, 100.0, Some(200)),
                LevelRecord::new(2, 150.0, Some(400)),
                LevelRecord::new(3, 250.0, None),
            ],
        )
        .unwrap(),
    }
}

fn setup_app(balance: u32) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins.build().disable::<TimePlugin>(), StatesPlugin));
    app.insert_resource(Time::<()>::default());
    app.init_state::<GameState>();
    common::configure_stages(&mut app);

    app.insert_resource(Ledger::new(balance))
        .insert_resource(tables())
        .init_resource::<Seen>()
        .add_plugins(UpgradesPlugin)
        .add_systems(PostUpdate, record);

    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::Playing);
    app.update();
    app
}

fn spawn_block(app: &mut App) -> Entity {
    let bundle = block_bundle(&tables(), &TowerSettings::default(), Vec3::ZERO);
    app.world_mut().spawn(bundle).id()
}

fn spawn_gun(app: &mut App) -> Entity {
    let bundle = gun_bundle(&GunSettings::default(), &tables(), Vec3::ZERO);
    app.world_mut().spawn(bundle).id()
}

fn send<M: Message>(app: &mut App, message: M) {
    app.world_mut().resource_mut::<Messages<M>>().write(message);
    app.update();
}

fn balance(app: &App) -> u32 {
    app.world().resource::<Ledger>().balance()
}

fn block_level(app: &App, block: Entity) -> u32 {
    app.world().get::<Block>(block).unwrap().upgrade.level()
}

#[test]
fn selected_block_upgrade_spends_exact_balance() {
    let mut app = setup_app(200);
    let block = spawn_block(&mut app);
    app.world_mut()
        .get_mut::<Health>(block)
        .unwrap()
        .take_damage(30.0);

    send(&mut app, SelectBlock { block });
    assert_eq!(app.world().resource::<Selection>().current(), Some(block));

    send(&mut app, UpgradeSelectedBlock);

    assert_eq!(balance(&app), 0);
    assert_eq!(block_level(&app, block), 2);
    assert_eq!(app.world().get::<Health>(block).unwrap(), &Health::new(150.0));
    assert_eq!(app.world().resource::<Selection>().current(), None);
    assert_eq!(
        app.world().resource::<Seen>().levels,
        vec![LevelChanged {
            entity: block,
            track: UpgradeTrack::BlockMaxHealth,
            level: 2,
            at_max: false,
        }]
    );
}

#[test]
fn insufficient_funds_keeps_selection_and_state() {
    let mut app = setup_app(199);
    let block = spawn_block(&mut app);

    send(&mut app, SelectBlock { block });
    send(&mut app, UpgradeSelectedBlock);

    assert_eq!(balance(&app), 199);
    assert_eq!(block_level(&app, block), 1);
    assert_eq!(app.world().resource::<Selection>().current(), Some(block));

    let seen = app.world().resource::<Seen>();
    assert!(seen.levels.is_empty());
    assert_eq!(
        seen.rejections,
        vec![UpgradeRejected {
            entity: Some(block),
            track: UpgradeTrack::BlockMaxHealth,
            reason: UpgradeError::InsufficientFunds {
                cost: 200,
                balance: 199
            },
        }]
    );
}

#[test]
fn upgrade_without_selection_is_target_not_found() {
    let mut app = setup_app(1_000);
    spawn_block(&mut app);

    send(&mut app, UpgradeSelectedBlock);

    assert_eq!(balance(&app), 1_000);
    let rejections = &app.world().resource::<Seen>().rejections;
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].entity, None);
    assert_eq!(rejections[0].reason, UpgradeError::TargetNotFound);
}

#[test]
fn despawned_selection_is_target_not_found() {
    let mut app = setup_app(1_000);
    let block = spawn_block(&mut app);
    send(&mut app, SelectBlock { block });
    app.world_mut().despawn(block);

    send(&mut app, UpgradeSelectedBlock);

    assert_eq!(balance(&app), 1_000);
    let rejections = &app.world().resource::<Seen>().rejections;
    assert_eq!(rejections[0].reason, UpgradeError::TargetNotFound);
}

#[test]
fn cancel_clears_selection() {
    let mut app = setup_app(0);
    let block = spawn_block(&mut app);
    send(&mut app, SelectBlock { block });
    send(&mut app, CancelSelection);
    assert_eq!(app.world().resource::<Selection>().current(), None);
}

#[test]
fn cancel_wins_over_select_in_the_same_frame() {
    let mut app = setup_app(0);
    let first = spawn_block(&mut app);
    let second = spawn_block(&mut app);
    send(&mut app, SelectBlock { block: first });

    app.world_mut()
        .resource_mut::<Messages<CancelSelection>>()
        .write(CancelSelection);
    send(&mut app, SelectBlock { block: second });

    assert_eq!(app.world().resource::<Selection>().current(), None);
}

#[test]
fn block_button_selects_and_upgrades_that_block() {
    let mut app = setup_app(600);
    let first = spawn_block(&mut app);
    let second = spawn_block(&mut app);
    send(&mut app, SelectBlock { block: first });

    send(&mut app, RequestBlockUpgrade { block: second });
    send(&mut app, RequestBlockUpgrade { block: second });

    assert_eq!(block_level(&app, first), 1);
    assert_eq!(block_level(&app, second), 3);
    assert_eq!(balance(&app), 0);
    let levels = &app.world().resource::<Seen>().levels;
    assert!(levels.last().unwrap().at_max);
}

#[test]
fn gun_damage_upgrade_pushes_value_into_gun() {
    let mut app = setup_app(1_000);
    let gun = spawn_gun(&mut app);

    for _ in 0..4 {
        send(&mut app, UpgradeGunDamage);
    }

    let player_gun = app.world().get::<PlayerGun>(gun).unwrap();
    assert_eq!(player_gun.damage, 30.0);
    assert_eq!(player_gun.tier, ProjectileTier::B);
    assert_eq!(balance(&app), 600);
    assert_eq!(app.world().get::<GunUpgrades>(gun).unwrap().damage.level(), 5);
}

#[test]
fn gun_at_max_level_is_rejected_without_charge() {
    let mut app = setup_app(10_000);
    let gun = spawn_gun(&mut app);

    for _ in 1..GUN_MAX_LEVEL {
        send(&mut app, UpgradeGunRateOfFire);
    }
    assert_eq!(balance(&app), 9_100);
    assert_eq!(app.world().get::<PlayerGun>(gun).unwrap().rate_of_fire, 6.5);

    send(&mut app, UpgradeGunRateOfFire);

    assert_eq!(balance(&app), 9_100);
    let seen = app.world().resource::<Seen>();
    assert_eq!(seen.levels.len(), 9);
    assert_eq!(
        seen.rejections,
        vec![UpgradeRejected {
            entity: Some(gun),
            track: UpgradeTrack::GunRateOfFire,
            reason: UpgradeError::AlreadyMaxLevel { level: 10 },
        }]
    );
}

#[test]
fn gun_upgrade_without_gun_is_target_not_found() {
    let mut app = setup_app(1_000);
    send(&mut app, UpgradeGunDamage);

    assert_eq!(balance(&app), 1_000);
    let rejections = &app.world().resource::<Seen>().rejections;
    assert_eq!(rejections[0].entity, None);
    assert_eq!(rejections[0].track, UpgradeTrack::GunDamage);
}

#[test]
fn gun_damage_at_level_ten_is_rejected_without_charge() {
    let mut app = setup_app(10_000);
    let gun = spawn_gun(&mut app);

    for _ in 1..GUN_MAX_LEVEL {
        send(&mut app, UpgradeGunDamage);
    }
    assert_eq!(balance(&app), 9_100);

    send(&mut app, UpgradeGunDamage);

    assert_eq!(balance(&app), 9_100);
    let player_gun = app.world().get::<PlayerGun>(gun).unwrap();
    assert_eq!(player_gun.damage, 55.0);
    assert_eq!(player_gun.tier, ProjectileTier::C);
    assert_eq!(app.world().get::<GunUpgrades>(gun).unwrap().damage.level(), 10);
    assert_eq!(
        app.world().resource::<Seen>().rejections,
        vec![UpgradeRejected {
            entity: Some(gun),
            track: UpgradeTrack::GunDamage,
            reason: UpgradeError::AlreadyMaxLevel { level: 10 },
        }]
    );
}
