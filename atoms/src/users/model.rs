use serde::{Deserialize, Serialize};

/// Identity handed over by the external identity provider.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Viewer {
    /// E-mail address; used as the owner key of tasks.
    pub id: String,
    pub display_name: String,
}

impl Viewer {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// What the identity provider currently reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Loading,
    Anonymous,
    Authenticated(Viewer),
}

impl SessionState {
    pub fn viewer(&self) -> Option<&Viewer> {
        match self {
            Self::Authenticated(viewer) => Some(viewer),
            _ => None,
        }
    }

    /// False while the provider has not answered yet.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

impl From<Option<Viewer>> for SessionState {
    fn from(viewer: Option<Viewer>) -> Self {
        match viewer {
            Some(viewer) => Self::Authenticated(viewer),
            None => Self::Anonymous,
        }
    }
}
