use std::fmt;

/// Referential actions attached to a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Propagation {
    pub on_update: Action,
    pub on_delete: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

impl Propagation {
    pub const fn new(on_update: Action, on_delete: Action) -> Self {
        Self {
            on_update,
            on_delete,
        }
    }

    /// The policy a relationship column derives from its nullability: an
    /// optional link is cleared when the target goes away, a required link
    /// pins the target down.
    pub const fn from_nullability(nullable: bool) -> Self {
        if nullable {
            Self::new(Action::Cascade, Action::SetNull)
        } else {
            Self::new(Action::Cascade, Action::Restrict)
        }
    }
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ON UPDATE {} ON DELETE {} DEFERRABLE INITIALLY DEFERRED",
            self.on_update, self.on_delete
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Cascade => "CASCADE",
        })
    }
}
