#![allow(clippy::type_complexity)]

use {
    bevy::prelude::*,
    common::{BalanceChanged, GameStage, ZombieKilled},
};

pub struct LedgerPlugin;

impl Plugin for LedgerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Ledger>()
            .add_message::<BalanceChanged>()
            .add_message::<ZombieKilled>()
            .add_systems(
                Update,
                (
                    credit_zombie_kills.in_set(GameStage::Effect),
                    announce_balance_changes.in_set(GameStage::FrameEnd),
                ),
            );
    }
}

/// The score balance spent on upgrades and blocks.
#[derive(Resource, Default, Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    balance: u32,
}

impl Ledger {
    pub fn new(balance: u32) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> u32 {
        self.balance
    }

    /// A zero cost is always affordable.
    pub fn can_afford(&self, cost: u32) -> bool {
        cost == 0 || self.balance >= cost
    }

    /// Saturates at zero. Returns what was actually taken.
    pub fn deduct(&mut self, cost: u32) -> u32 {
        let taken = cost.min(self.balance);
        self.balance -= taken;
        taken
    }

    pub fn credit(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(amount);
    }

    pub fn reset(&mut self, balance: u32) {
        self.balance = balance;
    }
}

// Systems

fn credit_zombie_kills(mut kills: MessageReader<ZombieKilled>, mut ledger: ResMut<Ledger>) {
    for kill in kills.read() {
        ledger.credit(kill.reward);
        debug!(
            "Zombie {:?} paid {}. Balance: {}",
            kill.entity,
            kill.reward,
            ledger.balance()
        );
    }
}

pub fn announce_balance_changes(
    ledger: Res<Ledger>,
    mut last_announced: Local<Option<u32>>,
    mut writer: MessageWriter<BalanceChanged>,
) {
    let balance = ledger.balance();
    if *last_announced != Some(balance) {
        *last_announced = Some(balance);
        writer.write(BalanceChanged { balance });
    }
}
