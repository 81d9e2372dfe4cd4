#![allow(clippy::type_complexity)]

use {
    bevy::prelude::*,
    common::{
        BlockDestroyed, DamageStep, Dead, GameStage, Health, RoundEntity, SpawnBlock, SpawnEffect,
        UpgradeTables, Upgradeable, messages::EffectKind,
    },
    ledger::Ledger,
    serde::Deserialize,
};

pub struct BlocksPlugin;

impl Plugin for BlocksPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Block>()
            .register_type::<HealthBar>()
            .register_type::<TowerSettings>();

        app.add_message::<SpawnBlock>()
            .add_message::<BlockDestroyed>()
            .add_message::<SpawnEffect>();

        app.add_systems(
            Update,
            (
                spawn_blocks.in_set(GameStage::Actions),
                (check_block_deaths, sync_health_bars)
                    .chain()
                    .in_set(GameStage::Effect)
                    .after(DamageStep),
                (settle_column, animate_health_bars).in_set(GameStage::FrameEnd),
            ),
        );
    }
}

// Configs

#[derive(Deserialize, Clone, Debug, Resource, Reflect)]
pub struct TowerSettings {
    /// Column x and ground y.
    pub spawn_point: [f32; 2],
    pub spawn_offset: [f32; 2],
    pub initial_blocks: u32,
    pub block_height: f32,
    pub block_cost: u32,
    pub search_width: f32,
    pub search_height: f32,
    pub spawn_y_offset: f32,
    pub destroy_delay: f32,
    pub health_bar_smooth_time: f32,
}

impl Default for TowerSettings {
    fn default() -> Self {
        Self {
            spawn_point: [0.0, 0.0],
            spawn_offset: [0.0, 0.0],
            initial_blocks: 3,
            block_height: 1.0,
            block_cost: 200,
            search_width: 0.5,
            search_height: 50.0,
            spawn_y_offset: 0.02,
            destroy_delay: 0.1,
            health_bar_smooth_time: 0.25,
        }
    }
}

impl TowerSettings {
    pub fn spawn_point(&self) -> Vec3 {
        Vec3::new(self.spawn_point[0], self.spawn_point[1], 0.0)
    }

    fn in_column(&self, position: Vec3) -> bool {
        (position.x - self.spawn_point[0]).abs() <= self.search_width * 0.5
    }

    /// Inside the thin search box standing on the spawn point.
    fn in_search_box(&self, position: Vec3) -> bool {
        let base = self.spawn_point[1];
        self.in_column(position) && position.y >= base && position.y <= base + self.search_height
    }
}

// Components

#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct Block {
    pub upgrade: Upgradeable,
}

/// Displayed health, eased toward the latest value over `smooth_time`.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct HealthBar {
    pub displayed: f32,
    from: f32,
    to: f32,
    elapsed: f32,
    smooth_time: f32,
}

impl HealthBar {
    pub fn new(value: f32, smooth_time: f32) -> Self {
        Self {
            displayed: value,
            from: value,
            to: value,
            elapsed: smooth_time,
            smooth_time,
        }
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    /// Restarts the animation from the previous target.
    pub fn retarget(&mut self, value: f32) {
        self.from = self.to;
        self.to = value;
        self.elapsed = 0.0;
        self.displayed = self.from;
    }

    pub fn tick(&mut self, dt: f32) {
        if self.is_settled() {
            return;
        }
        self.elapsed += dt;
        if self.smooth_time <= 0.0 || self.elapsed >= self.smooth_time {
            self.elapsed = self.smooth_time;
            self.displayed = self.to;
            return;
        }
        let t = (self.elapsed / self.smooth_time).clamp(0.0, 1.0);
        self.displayed = self.from + (self.to - self.from) * t;
    }

    pub fn is_settled(&self) -> bool {
        self.elapsed >= self.smooth_time && self.displayed == self.to
    }
}

pub fn block_bundle(tables: &UpgradeTables, settings: &TowerSettings, position: Vec3) -> impl Bundle {
    let upgrade = Upgradeable::from_table(&tables.block_max_health);
    let max = upgrade.value();
    (
        Block { upgrade },
        Health::new(max),
        HealthBar::new(max, settings.health_bar_smooth_time),
        Transform::from_translation(position),
        RoundEntity,
    )
}

/// Where a new block goes: one block height under the lowest block found in
/// the search box above the spawn point, or the spawn point itself when the
/// column is empty.
pub fn spawn_position(settings: &TowerSettings, blocks: impl IntoIterator<Item = Vec3>) -> Vec3 {
    let base = settings.spawn_point();
    let offset = Vec3::new(settings.spawn_offset[0], settings.spawn_offset[1], 0.0);

    let lowest = blocks
        .into_iter()
        .filter(|position| settings.in_search_box(*position))
        .map(|position| position.y)
        .reduce(f32::min);

    let mut position = match lowest {
        Some(min_y) => Vec3::new(base.x + offset.x, min_y - settings.block_height + offset.y, base.z),
        None => base + offset,
    };
    position.y += settings.spawn_y_offset;
    position
}

// Systems

fn spawn_blocks(
    mut commands: Commands,
    mut requests: MessageReader<SpawnBlock>,
    mut ledger: ResMut<Ledger>,
    tables: Res<UpgradeTables>,
    settings: Res<TowerSettings>,
    blocks: Query<&Transform, With<Block>>,
) {
    let mut spawned: Vec<Vec3> = Vec::new();

    for _ in requests.read() {
        if !ledger.can_afford(settings.block_cost) {
            warn!(
                "Cannot spawn block: need {}, have {}",
                settings.block_cost,
                ledger.balance()
            );
            continue;
        }
        ledger.deduct(settings.block_cost);

        let existing = blocks.iter().map(|t| t.translation).chain(spawned.iter().copied());
        let position = spawn_position(&settings, existing);
        commands.spawn(block_bundle(&tables, &settings, position));
        spawned.push(position);
        info!("Block spawned at {:?}. Balance: {}", position, ledger.balance());
    }
}

fn check_block_deaths(
    mut commands: Commands,
    settings: Res<TowerSettings>,
    query: Query<(Entity, &Health, &Transform), (With<Block>, Without<Dead>)>,
    mut destroyed: MessageWriter<BlockDestroyed>,
    mut effects: MessageWriter<SpawnEffect>,
) {
    for (entity, health, transform) in query.iter() {
        if !health.is_depleted() {
            continue;
        }
        commands
            .entity(entity)
            .remove::<Block>()
            .insert(Dead::after(settings.destroy_delay));
        destroyed.write(BlockDestroyed { block: entity });
        effects.write(SpawnEffect {
            kind: EffectKind::BlockDestroyed,
            location: transform.translation,
            duration: 1.0,
        });
        info!("Block {:?} destroyed", entity);
    }
}

fn sync_health_bars(mut query: Query<(&Health, &mut HealthBar), Changed<Health>>) {
    for (health, mut bar) in query.iter_mut() {
        if bar.target() != health.current {
            bar.retarget(health.current);
        }
    }
}

fn animate_health_bars(time: Res<Time>, mut query: Query<&mut HealthBar>) {
    let dt = time.delta_secs();
    for mut bar in query.iter_mut() {
        bar.tick(dt);
    }
}

/// Rests the column on the ground: blocks keep their order and stack
/// upward from the spawn point without gaps.
fn settle_column(settings: Res<TowerSettings>, mut blocks: Query<&mut Transform, With<Block>>) {
    let mut column: Vec<Mut<Transform>> = blocks
        .iter_mut()
        .filter(|t| settings.in_column(t.translation))
        .collect();
    column.sort_by(|a, b| a.translation.y.total_cmp(&b.translation.y));

    let ground = settings.spawn_point[1];
    for (index, transform) in column.iter_mut().enumerate() {
        let y = ground + index as f32 * settings.block_height;
        if transform.translation.y != y {
            transform.translation.y = y;
        }
    }
}
