use thiserror::Error;

/// Errors raised by the game engine and the save layer.
///
/// None of these are fatal: the presentation layer prints the message and
/// returns the player to the last safe prompt.
#[derive(Debug, Error)]
pub enum GameError {
    /// Unparseable or out-of-range player input. Recovered by re-prompting.
    #[error("invalid input: {0}")]
    Input(String),

    /// Not enough gold or items for the requested operation. No state was changed.
    #[error("not enough {0}")]
    InsufficientResource(String),

    /// A save file is unreadable as a whole (no recognised section).
    #[error("save file corrupt: {0}")]
    SaveCorrupt(String),

    /// A quest target/reward blob failed to parse.
    #[error("cannot decode structured field at offset {offset}: {reason}")]
    StructuredFieldDecode { offset: usize, reason: String },

    /// Unknown catalog entry, quest or save slot.
    #[error("not found: {0}")]
    NotFound(String),

    /// Character or save name rejected by validation.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The current scene is outside its opening hours.
    #[error("{scene} is closed (open {open:02}:00-{close:02}:00)")]
    Closed {
        scene: String,
        open: u32,
        close: u32,
    },

    /// Wrapper around IO errors (save directory creation, reads and writes).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GameError {
    /// Errors the play loop answers with a fresh prompt rather than a menu reset.
    pub fn is_recoverable_input(&self) -> bool {
        matches!(
            self,
            GameError::Input(_) | GameError::InsufficientResource(_) | GameError::Closed { .. }
        )
    }
}
