use bevy::prelude::*;

pub mod components;
pub mod error;
pub mod messages;
pub mod stats;
pub mod targeting;

pub use {components::*, error::*, messages::*, stats::*, targeting::*};

#[derive(Clone, Eq, PartialEq, Debug, Hash, Default, States)]
pub enum GameState {
    #[default]
    Loading,
    Playing,
    GameOver,
}

/// Ordered stages of a gameplay frame. Chained and gated on
/// `GameState::Playing` by the app plugin.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameStage {
    FrameStart,
    ResolveIntent,
    Actions,
    Effect,
    FrameEnd,
}

/// Where `apply_damage` runs inside `GameStage::Effect`. Death checks in the
/// same stage go after it.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct DamageStep;

/// Chains the gameplay stages and gates them on `GameState::Playing`.
pub fn configure_stages(app: &mut App) {
    app.configure_sets(
        Update,
        (
            GameStage::FrameStart,
            GameStage::ResolveIntent,
            GameStage::Actions,
            GameStage::Effect,
            GameStage::FrameEnd,
        )
            .chain()
            .run_if(in_state(GameState::Playing)),
    );
}
