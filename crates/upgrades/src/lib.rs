#![allow(clippy::type_complexity)]

use {
    bevy::{ecs::system::SystemParam, prelude::*},
    blocks::Block,
    common::{
        CancelSelection, GameStage, Health, LevelChanged, RequestBlockUpgrade, SelectBlock,
        UpgradeError, UpgradeGunDamage, UpgradeGunRateOfFire, UpgradeRejected,
        UpgradeSelectedBlock, UpgradeTables, UpgradeTrack,
    },
    gun::{GunTrack, GunUpgrades, PlayerGun},
    ledger::Ledger,
};

pub mod controller;
pub mod selection;

pub use {
    controller::{BlockTarget, GunTarget, UpgradeReceipt, UpgradeTarget, try_upgrade},
    selection::Selection,
};

pub struct UpgradesPlugin;

impl Plugin for UpgradesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Selection>();

        app.add_message::<UpgradeGunDamage>()
            .add_message::<UpgradeGunRateOfFire>()
            .add_message::<SelectBlock>()
            .add_message::<CancelSelection>()
            .add_message::<UpgradeSelectedBlock>()
            .add_message::<RequestBlockUpgrade>()
            .add_message::<LevelChanged>()
            .add_message::<UpgradeRejected>();

        app.add_systems(
            Update,
            (
                handle_selection.in_set(GameStage::ResolveIntent),
                (handle_gun_upgrades, handle_block_upgrades)
                    .chain()
                    .in_set(GameStage::Actions),
            ),
        );
    }
}

/// Everything an upgrade touches, bundled for the request handlers.
#[derive(SystemParam)]
pub struct UpgradeController<'w, 's> {
    pub tables: Res<'w, UpgradeTables>,
    pub ledger: ResMut<'w, Ledger>,
    pub selection: ResMut<'w, Selection>,
    guns: Query<'w, 's, (Entity, &'static mut PlayerGun, &'static mut GunUpgrades)>,
    blocks: Query<'w, 's, (&'static mut Block, &'static mut Health)>,
    level_changed: MessageWriter<'w, LevelChanged>,
    rejected: MessageWriter<'w, UpgradeRejected>,
}

impl UpgradeController<'_, '_> {
    pub fn upgrade_gun(&mut self, track: GunTrack) -> Result<UpgradeReceipt, UpgradeError> {
        let table = self.tables.table(track.upgrade_track());
        let (entity, result) = match self.guns.single_mut() {
            Ok((entity, mut gun, mut upgrades)) => {
                let mut target = GunTarget {
                    track,
                    gun: &mut gun,
                    upgrades: &mut upgrades,
                };
                (Some(entity), try_upgrade(Some(&mut target), table, &mut self.ledger))
            }
            Err(_) => (None, try_upgrade::<GunTarget>(None, table, &mut self.ledger)),
        };
        self.report(entity, track.upgrade_track(), result)
    }

    pub fn upgrade_block(&mut self, block: Entity) -> Result<UpgradeReceipt, UpgradeError> {
        let table = &self.tables.block_max_health;
        let result = match self.blocks.get_mut(block) {
            Ok((mut block, mut health)) => {
                let mut target = BlockTarget {
                    block: &mut block,
                    health: &mut health,
                };
                try_upgrade(Some(&mut target), table, &mut self.ledger)
            }
            Err(_) => try_upgrade::<BlockTarget>(None, table, &mut self.ledger),
        };
        self.report(Some(block), UpgradeTrack::BlockMaxHealth, result)
    }

    /// Clears the selection on success only.
    pub fn upgrade_selected_block(&mut self) -> Result<UpgradeReceipt, UpgradeError> {
        let Some(block) = self.selection.current() else {
            let result = Err(UpgradeError::TargetNotFound);
            return self.report(None, UpgradeTrack::BlockMaxHealth, result);
        };
        let receipt = self.upgrade_block(block)?;
        self.selection.clear();
        Ok(receipt)
    }

    fn report(
        &mut self,
        entity: Option<Entity>,
        track: UpgradeTrack,
        result: Result<UpgradeReceipt, UpgradeError>,
    ) -> Result<UpgradeReceipt, UpgradeError> {
        match &result {
            Ok(receipt) => {
                info!(
                    "Upgraded {} on {:?} to level {} ({}) for {}. Balance: {}",
                    track.name(),
                    entity,
                    receipt.to,
                    receipt.value,
                    receipt.cost,
                    self.ledger.balance()
                );
                if let Some(entity) = entity {
                    self.level_changed.write(LevelChanged {
                        entity,
                        track,
                        level: receipt.to,
                        at_max: receipt.at_max,
                    });
                }
            }
            Err(reason) => {
                warn!("Upgrade of {} on {:?} rejected: {}", track.name(), entity, reason);
                self.rejected.write(UpgradeRejected {
                    entity,
                    track,
                    reason: reason.clone(),
                });
            }
        }
        result
    }
}

// Systems

/// Separate message types carry no shared order, so within one frame a
/// `CancelSelection` beats any `SelectBlock`.
fn handle_selection(
    mut selects: MessageReader<SelectBlock>,
    mut cancels: MessageReader<CancelSelection>,
    mut selection: ResMut<Selection>,
) {
    for request in selects.read() {
        selection.select(request.block);
        debug!("Block {:?} selected", request.block);
    }
    if cancels.read().count() > 0 {
        selection.clear();
        debug!("Selection cleared");
    }
}

fn handle_gun_upgrades(
    mut damage_requests: MessageReader<UpgradeGunDamage>,
    mut rate_requests: MessageReader<UpgradeGunRateOfFire>,
    mut controller: UpgradeController,
) {
    for _ in damage_requests.read() {
        let _ = controller.upgrade_gun(GunTrack::Damage);
    }
    for _ in rate_requests.read() {
        let _ = controller.upgrade_gun(GunTrack::RateOfFire);
    }
}

fn handle_block_upgrades(
    mut block_buttons: MessageReader<RequestBlockUpgrade>,
    mut selected_requests: MessageReader<UpgradeSelectedBlock>,
    mut controller: UpgradeController,
) {
    for request in block_buttons.read() {
        controller.selection.select(request.block);
        let _ = controller.upgrade_selected_block();
    }
    for _ in selected_requests.read() {
        let _ = controller.upgrade_selected_block();
    }
}

#[cfg(test)]
mod tests_controller;
