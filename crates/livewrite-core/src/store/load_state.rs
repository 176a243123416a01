/// Load status of a live wrapper.
///
/// Starts as `Pending`, becomes `Loaded` once the initial fetch succeeds
/// or `Failed` if it does not. A failed wrapper never receives live
/// updates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState<S> {
    #[default]
    Pending,
    Loaded(S),
    Failed(String),
}

impl<S> LoadState<S> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// The loaded value, if any.
    pub fn loaded(&self) -> Option<&S> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Mutable access to the loaded value, if any.
    pub fn loaded_mut(&mut self) -> Option<&mut S> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// The failure reason, if the load failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
