use {
    crate::{error::UpgradeError, stats::UpgradeTrack},
    bevy::prelude::*,
};

// Combat

#[derive(Message, Debug, Clone)]
pub struct DamageMessage {
    pub source: Entity,
    pub target: Entity,
    pub amount: f32,
}

#[derive(Message, Debug, Clone)]
pub struct ZombieKilled {
    pub entity: Entity,
    pub reward: u32,
}

#[derive(Message, Debug, Clone)]
pub struct WaveStarted {
    pub wave: u32,
}

#[derive(Message, Debug, Clone)]
pub struct BlockDestroyed {
    pub block: Entity,
}

// Economy

#[derive(Message, Debug, Clone, PartialEq)]
pub struct BalanceChanged {
    pub balance: u32,
}

#[derive(Message, Debug, Clone, PartialEq)]
pub struct LevelChanged {
    pub entity: Entity,
    pub track: UpgradeTrack,
    pub level: u32,
    pub at_max: bool,
}

#[derive(Message, Debug, Clone, PartialEq)]
pub struct UpgradeRejected {
    /// `None` when no target could be resolved.
    pub entity: Option<Entity>,
    pub track: UpgradeTrack,
    pub reason: UpgradeError,
}

// Player intents

#[derive(Message, Debug, Clone)]
pub struct UpgradeGunDamage;

#[derive(Message, Debug, Clone)]
pub struct UpgradeGunRateOfFire;

#[derive(Message, Debug, Clone)]
pub struct SelectBlock {
    pub block: Entity,
}

#[derive(Message, Debug, Clone)]
pub struct CancelSelection;

#[derive(Message, Debug, Clone)]
pub struct UpgradeSelectedBlock;

/// Per-block button: selects `block` and upgrades it.
#[derive(Message, Debug, Clone)]
pub struct RequestBlockUpgrade {
    pub block: Entity,
}

#[derive(Message, Debug, Clone)]
pub struct SpawnBlock;

#[derive(Message, Debug, Clone)]
pub struct RestartGame;

// Effects

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum EffectKind {
    Hit,
    Flame,
    ChainsawSwipe,
    BlockDestroyed,
}

#[derive(Message, Debug, Clone)]
pub struct SpawnEffect {
    pub kind: EffectKind,
    pub location: Vec3,
    pub duration: f32,
}

impl SpawnEffect {
    pub fn hit(location: Vec3) -> Self {
        Self {
            kind: EffectKind::Hit,
            location,
            duration: 2.0,
        }
    }
}
