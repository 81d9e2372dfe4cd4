#![allow(clippy::type_complexity)]

use {
    bevy::prelude::*,
    bevy_common_assets::ron::RonAssetPlugin,
    common::{
        DamageMessage, EffectKind, GameStage, RoundEntity, SpawnEffect, find_nearest_in_range,
    },
    gun::Projectile,
    rand::Rng,
    serde::Deserialize,
    zombies::Zombie,
};

const MIN_RATE_OF_FIRE: f32 = 0.0001;

pub struct TurretsPlugin;

impl Plugin for TurretsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<WeaponData>::new(&["weapon.ron"]));

        app.register_type::<TowerWeapon>()
            .register_type::<WeaponData>();

        app.init_resource::<AvailableWeapons>();

        app.add_message::<DamageMessage>()
            .add_message::<SpawnEffect>();

        app.add_systems(Update, operate_weapons.in_set(GameStage::Actions));
    }
}

// Configs

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum WeaponKind {
    /// Shoots a projectile at the nearest zombie.
    Turret,
    /// Hits every zombie in range at once.
    Chainsaw,
    /// Sprays short-lived flames inside a cone.
    Flamethrower,
}

#[derive(Deserialize, Asset, Clone, Debug, Resource, Reflect)]
pub struct WeaponData {
    pub name: String,
    pub kind: WeaponKind,
    pub damage: f32,
    pub range: f32,
    pub rate_of_fire: f32,
    #[serde(default)]
    pub projectile_speed: f32,
    #[serde(default)]
    pub projectile_lifetime: f32,
    /// Full cone width in degrees.
    #[serde(default)]
    pub cone_angle: f32,
    #[serde(default)]
    pub attack_duration: f32,
}

impl WeaponData {
    pub fn shot_interval(&self) -> f32 {
        1.0 / self.rate_of_fire.max(MIN_RATE_OF_FIRE)
    }
}

#[derive(Resource, Default)]
pub struct AvailableWeapons(pub Vec<WeaponData>);

impl AvailableWeapons {
    pub fn find(&self, name: &str) -> Option<&WeaponData> {
        self.0.iter().find(|weapon| weapon.name == name)
    }
}

// Components

#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct TowerWeapon {
    pub data: WeaponData,
    pub cooldown: f32,
}

impl TowerWeapon {
    pub fn new(data: WeaponData) -> Self {
        Self {
            data,
            cooldown: 0.0,
        }
    }

    /// Counts the cooldown down. Returns true, and restarts the cooldown,
    /// when the weapon may act this frame with a target in range.
    pub fn tick(&mut self, dt: f32, has_target: bool) -> bool {
        self.cooldown -= dt;
        if !has_target || self.cooldown > 0.0 {
            return false;
        }
        self.cooldown = self.data.shot_interval();
        true
    }
}

pub fn weapon_bundle(data: WeaponData, position: Vec3) -> impl Bundle {
    (
        TowerWeapon::new(data),
        Transform::from_translation(position),
        RoundEntity,
    )
}

/// Rotates `direction` by a random angle inside a cone of `cone_angle`
/// degrees centred on it.
pub fn spread_within_cone(direction: Vec3, cone_angle: f32, rng: &mut impl Rng) -> Vec3 {
    let half = (cone_angle * 0.5).abs();
    let offset = if half > 0.0 {
        rng.random_range(-half..=half)
    } else {
        0.0
    };
    Quat::from_rotation_z(offset.to_radians()) * direction
}

// Systems

fn operate_weapons(
    mut commands: Commands,
    time: Res<Time>,
    mut weapons: Query<(Entity, &Transform, &mut TowerWeapon)>,
    zombies: Query<(Entity, &Transform), With<Zombie>>,
    mut damage: MessageWriter<DamageMessage>,
    mut effects: MessageWriter<SpawnEffect>,
) {
    let dt = time.delta_secs();
    let mut rng = rand::rng();

    for (entity, transform, mut weapon) in weapons.iter_mut() {
        let origin = transform.translation;
        let nearest = find_nearest_in_range(
            origin,
            weapon.data.range,
            zombies.iter().map(|(e, t)| (e, t.translation)),
        );
        if !weapon.tick(dt, nearest.is_some()) {
            continue;
        }
        let Some((target, _)) = nearest else {
            continue;
        };
        let Ok((_, target_transform)) = zombies.get(target) else {
            continue;
        };
        let aim = (target_transform.translation - origin).normalize_or_zero();
        let data = &weapon.data;

        match data.kind {
            WeaponKind::Turret => {
                commands.spawn((
                    Projectile {
                        source: entity,
                        velocity: aim * data.projectile_speed,
                        damage: data.damage,
                        lifetime: Timer::from_seconds(data.projectile_lifetime, TimerMode::Once),
                        hit_radius: 0.5,
                        hit_effect: Some(EffectKind::Hit),
                        tier: None,
                    },
                    Transform::from_translation(origin),
                    RoundEntity,
                ));
                debug!("{} fired at {:?}", data.name, target);
            }
            WeaponKind::Flamethrower => {
                let direction = spread_within_cone(aim, data.cone_angle, &mut rng);
                commands.spawn((
                    Projectile {
                        source: entity,
                        velocity: direction * data.projectile_speed,
                        damage: data.damage,
                        lifetime: Timer::from_seconds(data.projectile_lifetime, TimerMode::Once),
                        hit_radius: 0.5,
                        hit_effect: None,
                        tier: None,
                    },
                    Transform::from_translation(origin),
                    RoundEntity,
                ));
                effects.write(SpawnEffect {
                    kind: EffectKind::Flame,
                    location: origin,
                    duration: data.projectile_lifetime,
                });
            }
            WeaponKind::Chainsaw => {
                let in_range = zombies.iter().filter(|(_, t)| {
                    origin.truncate().distance(t.translation.truncate()) <= data.range
                });
                for (zombie, _) in in_range {
                    damage.write(DamageMessage {
                        source: entity,
                        target: zombie,
                        amount: data.damage,
                    });
                }
                effects.write(SpawnEffect {
                    kind: EffectKind::ChainsawSwipe,
                    location: origin,
                    duration: data.attack_duration,
                });
            }
        }
    }
}
