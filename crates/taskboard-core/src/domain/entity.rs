//! Domain Layer - Identifiers
//!
//! Every remote resource is keyed by a numeric database id. Entities that
//! were created locally but not yet refetched carry a provisional id drawn
//! from a process-wide counter that starts far above any real key.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

/// Lowest value a provisional id can take.
pub const PROVISIONAL_ID_FLOOR: i64 = 1 << 48;

static NEXT_PROVISIONAL: AtomicI64 = AtomicI64::new(PROVISIONAL_ID_FLOOR);

/// Core trait for all domain entities
pub trait Entity: Sized + Clone {
    /// The type of the entity's unique identifier
    type Id: Copy + Eq + std::hash::Hash;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Next synthetic id for an entity the server has not echoed back yet.
            pub fn provisional() -> Self {
                Self(NEXT_PROVISIONAL.fetch_add(1, Ordering::Relaxed))
            }

            /// True when this id never came from the server.
            pub fn is_provisional(self) -> bool {
                self.0 >= PROVISIONAL_ID_FLOOR
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

id_type!(
    /// Primary key of a project
    ProjectId
);
id_type!(
    /// Primary key of a task
    TaskId
);
id_type!(
    /// Primary key of a user
    UserId
);
