use {
    bevy::prelude::*,
    common::{EffectKind, GameStage, RoundEntity, SpawnEffect},
};

pub struct EffectsPlugin;

impl Plugin for EffectsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SpawnEffect>();

        app.register_type::<Effect>();

        app.add_systems(
            Update,
            (
                spawn_effects.in_set(GameStage::Effect),
                expire_effects.in_set(GameStage::FrameEnd),
            ),
        );
    }
}

// Components

/// A fire-and-forget visual. Whatever renders it keys off `kind`.
#[derive(Component, Reflect, Debug)]
#[reflect(Component)]
pub struct Effect {
    pub kind: EffectKind,
    pub lifetime: Timer,
}

// Systems

fn spawn_effects(mut commands: Commands, mut messages: MessageReader<SpawnEffect>) {
    for msg in messages.read() {
        commands.spawn((
            Effect {
                kind: msg.kind,
                lifetime: Timer::from_seconds(msg.duration.max(0.0), TimerMode::Once),
            },
            Transform::from_translation(msg.location),
            RoundEntity,
        ));
    }
}

fn expire_effects(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Effect)>,
) {
    for (entity, mut effect) in query.iter_mut() {
        effect.lifetime.tick(time.delta());
        if effect.lifetime.is_finished() {
            commands.entity(entity).despawn();
        }
    }
}
