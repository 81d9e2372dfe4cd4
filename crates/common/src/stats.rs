use {
    crate::error::UpgradeError,
    anyhow::{Context, ensure},
    bevy::prelude::*,
    serde::Deserialize,
};

pub const GUN_MAX_LEVEL: u32 = 10;
pub const BLOCK_MAX_LEVEL: u32 = 3;

#[derive(Debug, Clone, Reflect, Deserialize, PartialEq)]
pub enum GrowthStrategy {
    /// Returns the same value regardless of level.
    Static(f32),
    /// Calculation: base + (step * coefficient)
    Linear { base: f32, coefficient: f32 },
    /// Calculation: base * (factor ^ step)
    Exponential { base: f32, factor: f32 },
    /// Calculation: base + (step * step_size)
    Incremental { base: f32, step: f32 },
    /// Calculation: base + floor(step / interval) * step_size
    Chunked {
        base: f32,
        interval: f32,
        step: f32,
    },
}

impl Default for GrowthStrategy {
    fn default() -> Self {
        Self::Static(0.0)
    }
}

impl GrowthStrategy {
    /// `step` is zero-based: level 1 evaluates at 0.
    pub fn calculate(&self, step: f32) -> f32 {
        match self {
            Self::Static(val) => *val,
            Self::Linear { base, coefficient } => base + (step * coefficient),
            Self::Exponential { base, factor } => base * factor.powf(step),
            Self::Incremental { base, step: size } => base + (step * size),
            Self::Chunked {
                base,
                interval,
                step: size,
            } => base + (step / interval).floor() * size,
        }
    }

    pub fn at_level(&self, level: u32) -> f32 {
        self.calculate(level.saturating_sub(1) as f32)
    }
}

#[derive(Debug, Clone, Reflect, Deserialize, PartialEq)]
pub struct LevelRecord {
    pub level: u32,
    pub value: f32,
    /// Price of leaving this level. Absent on the last level.
    #[serde(default)]
    pub cost_to_next: Option<u32>,
}

impl LevelRecord {
    pub fn new(level: u32, value: f32, cost_to_next: Option<u32>) -> Self {
        Self {
            level,
            value,
            cost_to_next,
        }
    }
}

/// Immutable per-level values and prices for one upgrade track.
#[derive(Debug, Clone, Reflect, PartialEq)]
pub struct StatTable {
    name: String,
    records: Vec<LevelRecord>,
}

impl StatTable {
    pub fn new(name: impl Into<String>, mut records: Vec<LevelRecord>) -> Result<Self, UpgradeError> {
        let name = name.into();
        let missing = |level| UpgradeError::ConfigurationMissing {
            table: name.clone(),
            level,
        };

        if records.is_empty() {
            return Err(missing(1));
        }

        let last = records.len() as u32;
        for (idx, record) in records.iter_mut().enumerate() {
            let expected = idx as u32 + 1;
            if record.level != expected {
                return Err(missing(expected));
            }
            if expected == last {
                record.cost_to_next = None;
            } else if record.cost_to_next.is_none() {
                return Err(missing(expected));
            }
        }

        Ok(Self { name, records })
    }

    pub fn from_growth(
        name: impl Into<String>,
        max_level: u32,
        value: &GrowthStrategy,
        cost: &GrowthStrategy,
    ) -> Result<Self, UpgradeError> {
        let records = (1..=max_level)
            .map(|level| {
                let cost_to_next = (level < max_level)
                    .then(|| cost.at_level(level).round().max(0.0) as u32);
                LevelRecord::new(level, value.at_level(level), cost_to_next)
            })
            .collect();
        Self::new(name, records)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_level(&self) -> u32 {
        self.records.len() as u32
    }

    pub fn records(&self) -> &[LevelRecord] {
        &self.records
    }

    fn record(&self, level: u32) -> &LevelRecord {
        assert!(
            (1..=self.max_level()).contains(&level),
            "level {level} outside table '{}' (1..={})",
            self.name,
            self.max_level()
        );
        &self.records[level as usize - 1]
    }

    /// Panics when `level` is outside `1..=max_level`.
    pub fn value_at(&self, level: u32) -> f32 {
        self.record(level).value
    }

    /// Cost of going from `level` to `level + 1`, `None` at max level.
    /// Panics when `level` is outside `1..=max_level`.
    pub fn cost_to_advance(&self, level: u32) -> Option<u32> {
        self.record(level).cost_to_next
    }
}

#[derive(Debug, Clone, Reflect, Deserialize, PartialEq)]
pub enum StatTableConfig {
    Levels(Vec<LevelRecord>),
    Scaled {
        max_level: u32,
        value: GrowthStrategy,
        cost: GrowthStrategy,
    },
}

impl StatTableConfig {
    pub fn build(&self, name: &str) -> Result<StatTable, UpgradeError> {
        match self {
            Self::Levels(records) => StatTable::new(name, records.clone()),
            Self::Scaled {
                max_level,
                value,
                cost,
            } => StatTable::from_growth(name, *max_level, value, cost),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum UpgradeTrack {
    GunDamage,
    GunRateOfFire,
    BlockMaxHealth,
}

impl UpgradeTrack {
    pub fn name(self) -> &'static str {
        match self {
            Self::GunDamage => "gun_damage",
            Self::GunRateOfFire => "gun_rate_of_fire",
            Self::BlockMaxHealth => "block_max_health",
        }
    }

    pub fn max_level(self) -> u32 {
        match self {
            Self::GunDamage | Self::GunRateOfFire => GUN_MAX_LEVEL,
            Self::BlockMaxHealth => BLOCK_MAX_LEVEL,
        }
    }
}

// Configs

#[derive(Deserialize, Asset, Clone, Debug, Resource, Reflect)]
pub struct UpgradeConfig {
    pub gun_damage: StatTableConfig,
    pub gun_rate_of_fire: StatTableConfig,
    pub block_max_health: StatTableConfig,
}

impl UpgradeConfig {
    pub fn build_tables(&self) -> anyhow::Result<UpgradeTables> {
        Ok(UpgradeTables {
            gun_damage: build_track(&self.gun_damage, UpgradeTrack::GunDamage)?,
            gun_rate_of_fire: build_track(&self.gun_rate_of_fire, UpgradeTrack::GunRateOfFire)?,
            block_max_health: build_track(&self.block_max_health, UpgradeTrack::BlockMaxHealth)?,
        })
    }
}

fn build_track(config: &StatTableConfig, track: UpgradeTrack) -> anyhow::Result<StatTable> {
    let table = config
        .build(track.name())
        .with_context(|| format!("invalid upgrade table '{}'", track.name()))?;
    ensure!(
        table.max_level() == track.max_level(),
        "upgrade table '{}' has {} levels, expected {}",
        track.name(),
        table.max_level(),
        track.max_level()
    );
    Ok(table)
}

// Resources

#[derive(Resource, Debug, Clone)]
pub struct UpgradeTables {
    pub gun_damage: StatTable,
    pub gun_rate_of_fire: StatTable,
    pub block_max_health: StatTable,
}

impl UpgradeTables {
    pub fn table(&self, track: UpgradeTrack) -> &StatTable {
        match track {
            UpgradeTrack::GunDamage => &self.gun_damage,
            UpgradeTrack::GunRateOfFire => &self.gun_rate_of_fire,
            UpgradeTrack::BlockMaxHealth => &self.block_max_health,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    AlreadyMax,
}

/// Level and cached stat value of one upgrade track on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Upgradeable {
    level: u32,
    max_level: u32,
    value: f32,
}

impl Default for Upgradeable {
    fn default() -> Self {
        Self {
            level: 1,
            max_level: 1,
            value: 0.0,
        }
    }
}

impl Upgradeable {
    pub fn from_table(table: &StatTable) -> Self {
        Self {
            level: 1,
            max_level: table.max_level(),
            value: table.value_at(1),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_max(&self) -> bool {
        self.level >= self.max_level
    }

    pub fn apply_upgrade(&mut self, new_level: u32, value: f32) -> ApplyOutcome {
        if self.is_max() {
            return ApplyOutcome::AlreadyMax;
        }
        debug_assert_eq!(new_level, self.level + 1, "upgrades advance one level at a time");
        self.level = new_level.min(self.max_level);
        self.value = value;
        ApplyOutcome::Applied
    }
}
