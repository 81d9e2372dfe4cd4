use {crate::messages::DamageMessage, bevy::prelude::*};

#[derive(Component, Reflect, Default, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Non-positive amounts are ignored. Returns the health lost.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current - amount).max(0.0);
        before - self.current
    }

    pub fn heal_to(&mut self, value: f32) {
        self.current = value.clamp(0.0, self.max);
    }

    /// Sets a new max and refills to it.
    pub fn reset_to_max(&mut self, max: f32) {
        self.max = max.max(0.0);
        self.current = self.max;
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

#[derive(Component, Reflect, Default)]
#[reflect(Component)]
pub struct Dead {
    pub despawn_timer: Timer,
}

impl Dead {
    pub fn after(secs: f32) -> Self {
        Self {
            despawn_timer: Timer::from_seconds(secs, TimerMode::Once),
        }
    }
}

#[derive(Component, Reflect, Default, Debug)]
#[reflect(Component)]
pub struct Player;

/// Everything spawned for one round; despawned on restart.
#[derive(Component, Reflect, Default, Debug)]
#[reflect(Component)]
pub struct RoundEntity;

pub fn despawn_dead(mut commands: Commands, time: Res<Time>, mut query: Query<(Entity, &mut Dead)>) {
    for (entity, mut dead) in query.iter_mut() {
        dead.despawn_timer.tick(time.delta());
        if dead.despawn_timer.is_finished() {
            commands.entity(entity).despawn();
        }
    }
}

pub fn apply_damage(mut messages: MessageReader<DamageMessage>, mut query: Query<&mut Health>) {
    for msg in messages.read() {
        match query.get_mut(msg.target) {
            Ok(mut health) => {
                let lost = health.take_damage(msg.amount);
                debug!("{:?} hit {:?} for {}", msg.source, msg.target, lost);
            }
            Err(_) => debug!("Damage for missing target {:?} dropped", msg.target),
        }
    }
}
