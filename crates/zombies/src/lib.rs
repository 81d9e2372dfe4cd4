#![allow(clippy::type_complexity)]

use {
    bevy::prelude::*,
    blocks::Block,
    common::{
        DamageMessage, GameStage, Health, Player, RoundEntity, WaveStarted, ZombieKilled,
        find_nearest_in_range,
    },
    rand::Rng,
    serde::Deserialize,
};

pub mod waves;

pub use waves::{WaveConfig, WaveScheduler, WaveTick};

pub struct ZombiesPlugin;

impl Plugin for ZombiesPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Zombie>()
            .register_type::<Bounty>()
            .register_type::<ZombieSettings>()
            .register_type::<WaveConfig>();

        app.add_message::<DamageMessage>()
            .add_message::<ZombieKilled>()
            .add_message::<WaveStarted>();

        app.add_systems(
            Update,
            (
                spawn_zombies.in_set(GameStage::FrameStart),
                move_and_attack.in_set(GameStage::Actions),
                check_zombie_deaths.in_set(GameStage::FrameEnd),
            ),
        );
    }
}

// Configs

#[derive(Deserialize, Clone, Debug, Resource, Reflect)]
pub struct ZombieSettings {
    pub speed: f32,
    pub contact_damage: f32,
    pub health: f32,
    pub attack_interval: f32,
    pub contact_range: f32,
    pub reward: u32,
}

impl Default for ZombieSettings {
    fn default() -> Self {
        Self {
            speed: 2.0,
            contact_damage: 10.0,
            health: 50.0,
            attack_interval: 1.0,
            contact_range: 1.0,
            reward: 10,
        }
    }
}

// Components

#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct Zombie {
    pub speed: f32,
    pub contact_damage: f32,
    pub contact_range: f32,
    pub attack_interval: f32,
    /// Counts down every frame; a hit lands once it reaches zero.
    pub attack_cooldown: f32,
}

#[derive(Component, Reflect, Default, Debug)]
#[reflect(Component)]
pub struct Bounty(pub u32);

pub fn zombie_bundle(settings: &ZombieSettings, position: Vec3) -> impl Bundle {
    (
        Zombie {
            speed: settings.speed,
            contact_damage: settings.contact_damage,
            contact_range: settings.contact_range,
            attack_interval: settings.attack_interval,
            attack_cooldown: 0.0,
        },
        Health::new(settings.health),
        Bounty(settings.reward),
        Transform::from_translation(position),
        RoundEntity,
    )
}

// Systems

fn spawn_zombies(
    mut commands: Commands,
    time: Res<Time>,
    settings: Res<ZombieSettings>,
    mut scheduler: ResMut<WaveScheduler>,
    mut wave_started: MessageWriter<WaveStarted>,
) {
    if scheduler.is_finished() {
        return;
    }
    let tick = scheduler.tick(time.delta_secs());

    if let Some(wave) = tick.wave_started {
        info!("Wave {}/{} started", wave, scheduler.config().total_waves);
        wave_started.write(WaveStarted { wave });
    }
    if scheduler.is_finished() {
        info!("All {} waves spawned", scheduler.current_wave());
    }
    if tick.spawns == 0 {
        return;
    }

    let points = &scheduler.config().spawn_points;
    if points.is_empty() {
        warn!("No zombie spawn points configured, dropping {} spawns", tick.spawns);
        return;
    }

    let mut rng = rand::rng();
    for _ in 0..tick.spawns {
        let [x, y] = points[rng.random_range(0..points.len())];
        commands.spawn(zombie_bundle(&settings, Vec3::new(x, y, 0.0)));
        debug!("Zombie spawned at ({}, {})", x, y);
    }
}

/// Zombies walk along x toward the player. A zombie touching a block
/// attacks the block, otherwise one touching the player attacks the player.
fn move_and_attack(
    time: Res<Time>,
    mut zombies: Query<(Entity, &mut Transform, &mut Zombie), Without<Player>>,
    blocks: Query<(Entity, &Transform), (With<Block>, Without<Zombie>)>,
    player: Query<(Entity, &Transform), (With<Player>, Without<Zombie>)>,
    mut damage: MessageWriter<DamageMessage>,
) {
    let Ok((player_entity, player_transform)) = player.single() else {
        return;
    };
    let player_position = player_transform.translation;
    let dt = time.delta_secs();
    let block_positions: Vec<(Entity, Vec3)> =
        blocks.iter().map(|(e, t)| (e, t.translation)).collect();

    for (entity, mut transform, mut zombie) in zombies.iter_mut() {
        zombie.attack_cooldown -= dt;
        let position = transform.translation;

        let target = find_nearest_in_range(
            position,
            zombie.contact_range,
            block_positions.iter().copied(),
        )
        .or_else(|| {
            find_nearest_in_range(
                position,
                zombie.contact_range,
                [(player_entity, player_position)],
            )
        })
        .map(|(target, _)| target);

        if let Some(target) = target {
            if zombie.attack_cooldown <= 0.0 {
                damage.write(DamageMessage {
                    source: entity,
                    target,
                    amount: zombie.contact_damage,
                });
                zombie.attack_cooldown = zombie.attack_interval;
            }
            continue;
        }

        let dx = player_position.x - position.x;
        let step = (zombie.speed * dt).min(dx.abs());
        transform.translation.x += dx.signum() * step;
    }
}

fn check_zombie_deaths(
    mut commands: Commands,
    query: Query<(Entity, &Health, &Bounty), With<Zombie>>,
    mut kills: MessageWriter<ZombieKilled>,
) {
    for (entity, health, bounty) in query.iter() {
        if health.is_depleted() {
            kills.write(ZombieKilled {
                entity,
                reward: bounty.0,
            });
            commands.entity(entity).despawn();
            debug!("Zombie {:?} killed, bounty {}", entity, bounty.0);
        }
    }
}
