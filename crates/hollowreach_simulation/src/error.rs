//! Ошибки сборки entity, контактов, конфигурации и записей.
//!
//! Gameplay-отказы (defend, immunity, inventory full) сюда не попадают:
//! они возвращаются как `bool` / `Option` / счётчики.

use thiserror::Error;

use crate::entity::ComponentKind;

/// Нарушение composition-инварианта при сборке entity.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Компоненту нужен sibling, которого нет в blueprint.
    #[error("Entity '{entity}': {component} requires {required}")]
    MissingRequirement {
        entity: String,
        component: ComponentKind,
        required: ComponentKind,
    },

    /// Один и тот же тип компонента добавлен дважды.
    #[error("Entity '{entity}': duplicate component {component}")]
    DuplicateComponent {
        entity: String,
        component: ComponentKind,
    },

    /// Stable id уже занят живой entity.
    #[error("Entity id '{0}' is already in use")]
    DuplicateId(String),

    /// Entity не существует (despawned или чужой handle).
    #[error("Entity {0} does not exist")]
    MissingEntity(String),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Contact(#[from] ContactError),
}

/// Фатальная конфигурация state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Initial state {0} is not part of the machine")]
    UnknownInitialState(String),

    #[error("State {0} is registered twice")]
    DuplicateState(String),

    #[error("Named state {0} is mapped twice")]
    DuplicateName(String),
}

/// Ошибки регистрации в ContactNotifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContactError {
    /// Имя node уже зарегистрировано другим получателем.
    #[error("Contact node name '{0}' is already registered")]
    NameTaken(String),

    /// У entity нет stable id, имя node не вычислить.
    #[error("Entity {0} has no stable id")]
    MissingId(String),
}

/// Ошибки чтения конфигурации и каталогов.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{path}': {details}")]
    ReadError { path: String, details: String },

    #[error("Parse error: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// Ошибки (де)сериализации entity records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] ron::Error),

    #[error("Failed to parse record: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Failed to restore entity: {0}")]
    Assembly(#[from] AssemblyError),
}
