use {
    blocks::Block,
    common::{ApplyOutcome, Health, StatTable, UpgradeError, Upgradeable},
    gun::{GunTrack, GunUpgrades, PlayerGun},
    ledger::Ledger,
};

/// Something with a leveled stat that can be bought up one level.
pub trait UpgradeTarget {
    fn upgradeable(&self) -> &Upgradeable;

    /// Writes the new level and value, plus anything that caches the value.
    fn apply_upgrade(&mut self, new_level: u32, value: f32) -> ApplyOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpgradeReceipt {
    pub from: u32,
    pub to: u32,
    pub cost: u32,
    pub value: f32,
    pub at_max: bool,
}

/// Validate, pay, apply. Either every step happens or nothing changes.
///
/// The cost is the one stored on the level being left.
pub fn try_upgrade<T: UpgradeTarget + ?Sized>(
    target: Option<&mut T>,
    table: &StatTable,
    ledger: &mut Ledger,
) -> Result<UpgradeReceipt, UpgradeError> {
    let target = target.ok_or(UpgradeError::TargetNotFound)?;

    let current = *target.upgradeable();
    if current.is_max() {
        return Err(UpgradeError::AlreadyMaxLevel {
            level: current.level(),
        });
    }

    let new_level = current.level() + 1;
    let missing = |level| UpgradeError::ConfigurationMissing {
        table: table.name().to_string(),
        level,
    };
    if new_level > table.max_level() {
        return Err(missing(new_level));
    }
    let cost = table
        .cost_to_advance(current.level())
        .ok_or_else(|| missing(current.level()))?;

    if !ledger.can_afford(cost) {
        return Err(UpgradeError::InsufficientFunds {
            cost,
            balance: ledger.balance(),
        });
    }

    let value = table.value_at(new_level);
    let taken = ledger.deduct(cost);

    match target.apply_upgrade(new_level, value) {
        ApplyOutcome::Applied => Ok(UpgradeReceipt {
            from: current.level(),
            to: new_level,
            cost,
            value,
            at_max: target.upgradeable().is_max(),
        }),
        ApplyOutcome::AlreadyMax => {
            ledger.credit(taken);
            Err(UpgradeError::AlreadyMaxLevel {
                level: current.level(),
            })
        }
    }
}

/// A tower block's max-health track. Upgrading refills the block.
pub struct BlockTarget<'a> {
    pub block: &'a mut Block,
    pub health: &'a mut Health,
}

impl UpgradeTarget for BlockTarget<'_> {
    fn upgradeable(&self) -> &Upgradeable {
        &self.block.upgrade
    }

    fn apply_upgrade(&mut self, new_level: u32, value: f32) -> ApplyOutcome {
        let outcome = self.block.upgrade.apply_upgrade(new_level, value);
        if outcome == ApplyOutcome::Applied {
            self.health.reset_to_max(value);
        }
        outcome
    }
}

/// One of the player gun's tracks. The gun caches the current value.
pub struct GunTarget<'a> {
    pub track: GunTrack,
    pub gun: &'a mut PlayerGun,
    pub upgrades: &'a mut GunUpgrades,
}

impl UpgradeTarget for GunTarget<'_> {
    fn upgradeable(&self) -> &Upgradeable {
        self.upgrades.track(self.track)
    }

    fn apply_upgrade(&mut self, new_level: u32, value: f32) -> ApplyOutcome {
        match self.track {
            GunTrack::RateOfFire => {
                let outcome = self.upgrades.rate_of_fire.apply_upgrade(new_level, value);
                if outcome == ApplyOutcome::Applied {
                    self.gun.set_rate_of_fire(value);
                }
                outcome
            }
            GunTrack::Damage => {
                let outcome = self.upgrades.damage.apply_upgrade(new_level, value);
                if outcome == ApplyOutcome::Applied {
                    self.gun.set_damage(value, new_level);
                }
                outcome
            }
        }
    }
}
