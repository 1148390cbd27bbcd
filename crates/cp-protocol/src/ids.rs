//! ID types for the Context Protocol.
//!
//! Strongly-typed newtypes prevent mixing up different ID kinds (e.g. passing
//! a `ToolCallId` where a `RequestId` is expected).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define a newtype ID based on Uuid.
macro_rules! define_id_type {
    ($name:ident) => {
        #[doc = concat!(stringify!($name), ": a newtype used to prevent mixing it with other ID values.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id_type!(RequestId);
define_id_type!(ToolCallId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_id_roundtrips_through_string() {
        let id = ToolCallId::random();
        let parsed: ToolCallId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
