use {bevy::prelude::*, game_core::ZombieStackPlugin};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Zombie Stack".into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(ZombieStackPlugin)
        .run();
}
