#![allow(clippy::type_complexity)]

use {
    bevy::prelude::*,
    common::{
        DamageMessage, EffectKind, GameStage, RoundEntity, SpawnEffect, UpgradeTables,
        UpgradeTrack, Upgradeable, find_nearest_in_range,
    },
    serde::Deserialize,
    zombies::Zombie,
};

const MIN_RATE_OF_FIRE: f32 = 0.0001;

pub struct GunPlugin;

impl Plugin for GunPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<PlayerGun>()
            .register_type::<GunUpgrades>()
            .register_type::<Projectile>()
            .register_type::<GunSettings>();

        app.add_message::<DamageMessage>()
            .add_message::<SpawnEffect>();

        app.add_systems(
            Update,
            (fire_gun, move_projectiles, projectile_collision)
                .chain()
                .in_set(GameStage::Actions),
        );
    }
}

// Configs

#[derive(Deserialize, Clone, Debug, Resource, Reflect)]
pub struct GunSettings {
    /// Fire point relative to the player.
    pub offset: [f32; 2],
    pub detection_radius: f32,
    pub base_projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub hit_radius: f32,
}

impl Default for GunSettings {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.5],
            detection_radius: 12.0,
            base_projectile_speed: 6.0,
            projectile_lifetime: 4.0,
            hit_radius: 0.5,
        }
    }
}

// Components

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum ProjectileTier {
    #[default]
    A,
    B,
    C,
}

impl ProjectileTier {
    /// Levels 1-4 fire tier A, 5-7 tier B, 8 and up tier C.
    pub fn for_damage_level(level: u32) -> Self {
        match level {
            0..=4 => Self::A,
            5..=7 => Self::B,
            _ => Self::C,
        }
    }
}

#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct PlayerGun {
    pub damage: f32,
    pub rate_of_fire: f32,
    pub detection_radius: f32,
    pub base_projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub hit_radius: f32,
    pub cooldown: f32,
    pub tier: ProjectileTier,
}

impl PlayerGun {
    pub fn new(settings: &GunSettings, damage: f32, rate_of_fire: f32) -> Self {
        Self {
            damage,
            rate_of_fire,
            detection_radius: settings.detection_radius,
            base_projectile_speed: settings.base_projectile_speed,
            projectile_lifetime: settings.projectile_lifetime,
            hit_radius: settings.hit_radius,
            cooldown: 0.0,
            tier: ProjectileTier::A,
        }
    }

    pub fn shot_interval(&self) -> f32 {
        1.0 / self.rate_of_fire.max(MIN_RATE_OF_FIRE)
    }

    /// Faster firing also means faster bullets.
    pub fn projectile_speed(&self) -> f32 {
        self.base_projectile_speed * self.rate_of_fire.max(MIN_RATE_OF_FIRE)
    }

    pub fn set_damage(&mut self, damage: f32, level: u32) {
        self.damage = damage;
        self.tier = ProjectileTier::for_damage_level(level);
    }

    pub fn set_rate_of_fire(&mut self, rate_of_fire: f32) {
        self.rate_of_fire = rate_of_fire;
    }
}

/// Upgrade tracks that exist on the player gun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum GunTrack {
    Damage,
    RateOfFire,
}

impl GunTrack {
    pub fn upgrade_track(self) -> UpgradeTrack {
        match self {
            Self::Damage => UpgradeTrack::GunDamage,
            Self::RateOfFire => UpgradeTrack::GunRateOfFire,
        }
    }
}

/// The two upgrade tracks of the player gun.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct GunUpgrades {
    pub damage: Upgradeable,
    pub rate_of_fire: Upgradeable,
}

impl GunUpgrades {
    pub fn from_tables(tables: &UpgradeTables) -> Self {
        Self {
            damage: Upgradeable::from_table(&tables.gun_damage),
            rate_of_fire: Upgradeable::from_table(&tables.gun_rate_of_fire),
        }
    }

    pub fn track(&self, track: GunTrack) -> &Upgradeable {
        match track {
            GunTrack::Damage => &self.damage,
            GunTrack::RateOfFire => &self.rate_of_fire,
        }
    }
}

#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct Projectile {
    pub source: Entity,
    pub velocity: Vec3,
    pub damage: f32,
    pub lifetime: Timer,
    pub hit_radius: f32,
    pub hit_effect: Option<EffectKind>,
    pub tier: Option<ProjectileTier>,
}

pub fn gun_bundle(settings: &GunSettings, tables: &UpgradeTables, player_position: Vec3) -> impl Bundle {
    let upgrades = GunUpgrades::from_tables(tables);
    let mut gun = PlayerGun::new(settings, upgrades.damage.value(), upgrades.rate_of_fire.value());
    gun.tier = ProjectileTier::for_damage_level(upgrades.damage.level());
    let offset = Vec3::new(settings.offset[0], settings.offset[1], 0.0);
    (
        gun,
        upgrades,
        Transform::from_translation(player_position + offset),
        RoundEntity,
    )
}

// Systems

fn fire_gun(
    mut commands: Commands,
    time: Res<Time>,
    mut guns: Query<(Entity, &Transform, &mut PlayerGun)>,
    zombies: Query<(Entity, &Transform), With<Zombie>>,
) {
    let dt = time.delta_secs();

    for (entity, transform, mut gun) in guns.iter_mut() {
        gun.cooldown -= dt;

        let origin = transform.translation;
        let Some((target, _)) = find_nearest_in_range(
            origin,
            gun.detection_radius,
            zombies.iter().map(|(e, t)| (e, t.translation)),
        ) else {
            continue;
        };
        if gun.cooldown > 0.0 {
            continue;
        }
        let Ok((_, target_transform)) = zombies.get(target) else {
            continue;
        };

        let direction = (target_transform.translation - origin).normalize_or_zero();
        commands.spawn((
            Projectile {
                source: entity,
                velocity: direction * gun.projectile_speed(),
                damage: gun.damage,
                lifetime: Timer::from_seconds(gun.projectile_lifetime, TimerMode::Once),
                hit_radius: gun.hit_radius,
                hit_effect: Some(EffectKind::Hit),
                tier: Some(gun.tier),
            },
            Transform::from_translation(origin),
            RoundEntity,
        ));
        gun.cooldown = gun.shot_interval();
        debug!("Gun fired at {:?} ({:?})", target, gun.tier);
    }
}

pub fn move_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    mut projectile_query: Query<(Entity, &mut Transform, &mut Projectile)>,
) {
    for (entity, mut transform, mut projectile) in projectile_query.iter_mut() {
        projectile.lifetime.tick(time.delta());
        if projectile.lifetime.is_finished() {
            commands.entity(entity).despawn();
            continue;
        }

        transform.translation += projectile.velocity * time.delta_secs();
    }
}

/// First zombie within a projectile's hit radius takes its damage.
pub fn projectile_collision(
    mut commands: Commands,
    projectile_query: Query<(Entity, &Transform, &Projectile)>,
    zombie_query: Query<(Entity, &Transform), With<Zombie>>,
    mut damage: MessageWriter<DamageMessage>,
    mut effects: MessageWriter<SpawnEffect>,
) {
    for (proj_entity, proj_transform, projectile) in projectile_query.iter() {
        let position = proj_transform.translation;
        let hit = zombie_query
            .iter()
            .find(|(_, t)| position.truncate().distance(t.translation.truncate()) < projectile.hit_radius);

        if let Some((target, _)) = hit {
            damage.write(DamageMessage {
                source: projectile.source,
                target,
                amount: projectile.damage,
            });
            if let Some(kind) = projectile.hit_effect {
                effects.write(SpawnEffect {
                    kind,
                    ..SpawnEffect::hit(position)
                });
            }
            commands.entity(proj_entity).despawn();
        }
    }
}
