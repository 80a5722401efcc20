//! Исходящие события для presentation слоя (scene graph, audio, overlays).
//!
//! Симуляция только пишет эти события. Engine bridge читает их и
//! выполняет fire-and-forget: ответа симуляция не ждёт.

use bevy::prelude::*;

/// Команда scene graph'у (addChild / removeFromParent / анимации).
#[derive(Event, Debug, Clone, PartialEq)]
pub enum SceneCommand {
    AddChild { parent: String, child: String },
    RemoveFromParent { node: String },
    /// Обновить collision mask detection body
    SetInteraction { node: String, contact_groups: u32 },
    FlashColor { node: String, color: [f32; 4] },
    PlayAnimation { node: String, animation: String },
}

/// Звуковой эффект в точке мира.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SoundEffect {
    pub name: String,
    pub at: Vec2,
}

/// Текстовое уведомление для UI overlay (best-effort, только отображение).
#[derive(Event, Debug, Clone, PartialEq)]
pub enum Notice {
    /// Короткая заметка над игроком ("Inventory full", "Immune")
    Note(String),
    /// Подобранный предмет
    PickUp(String),
    /// Строка combat log
    Log(String),
}

pub fn note(world: &mut World, text: impl Into<String>) {
    world.send_event(Notice::Note(text.into()));
}

pub fn combat_log(world: &mut World, text: impl Into<String>) {
    world.send_event(Notice::Log(text.into()));
}

pub fn play_sound(world: &mut World, name: &str, at: Vec2) {
    world.send_event(SoundEffect {
        name: name.to_string(),
        at,
    });
}

pub fn scene(world: &mut World, command: SceneCommand) {
    world.send_event(command);
}
