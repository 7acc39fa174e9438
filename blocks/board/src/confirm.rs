/// Two-step delete: `Idle -> Pending(id) -> Idle`.
///
/// The caller reads the id with [`pending`](DeleteConfirmation::pending),
/// issues the delete, then closes the step with
/// [`confirm`](DeleteConfirmation::confirm).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeleteConfirmation {
    #[default]
    Idle,
    Pending(String),
}

impl DeleteConfirmation {
    /// Asks for confirmation. A second request replaces the first.
    pub fn request(&mut self, id: impl Into<String>) {
        *self = Self::Pending(id.into());
    }

    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// Goes back to idle, returning the id that was pending.
    pub fn confirm(&mut self) -> Option<String> {
        match std::mem::take(self) {
            Self::Pending(id) => Some(id),
            Self::Idle => None,
        }
    }

    pub fn pending(&self) -> Option<&str> {
        match self {
            Self::Pending(id) => Some(id),
            Self::Idle => None,
        }
    }
}
