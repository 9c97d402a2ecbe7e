use std::fmt;

use uuid::Uuid;

/// Size of a goal identifier in bytes.
pub const UUID_SIZE: usize = 16;

/// 16-byte goal identifier.
///
/// Opaque fixed-size value: equality and hashing are plain byte comparison.
/// `Display` renders the canonical 8-4-4-4-12 lowercase hyphenated form used in
/// feedback filter clauses and diagnostics.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
pub struct GoalUuid([u8; UUID_SIZE]);

impl GoalUuid {
    pub const fn from_bytes(bytes: [u8; UUID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Fresh random (v4) identifier for a new goal.
    pub fn random() -> Self {
        Self(*Uuid::new_v4().as_bytes())
    }

    pub const fn as_bytes(&self) -> &[u8; UUID_SIZE] {
        &self.0
    }

    /// Canonical 36-character display string.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GoalUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Uuid::from_bytes(self.0).hyphenated(), f)
    }
}

impl From<[u8; UUID_SIZE]> for GoalUuid {
    fn from(bytes: [u8; UUID_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<Uuid> for GoalUuid {
    fn from(id: Uuid) -> Self {
        Self(*id.as_bytes())
    }
}

impl From<GoalUuid> for Uuid {
    fn from(id: GoalUuid) -> Self {
        Uuid::from_bytes(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_hyphenated_lowercase_hex() {
        let id = GoalUuid::from_bytes([
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0xff,
        ]);
        let s = id.to_display_string();
        assert_eq!(s, "00010203-0405-0607-0809-0a0b0c0d0eff");
        assert_eq!(s.len(), 36);
    }

    #[test]
    fn display_is_deterministic() {
        let id = GoalUuid::from_bytes([0xAB; UUID_SIZE]);
        assert_eq!(id.to_string(), id.to_string());
        assert_eq!(id.to_string(), "abababab-abab-abab-abab-abababababab");
    }

    #[test]
    fn random_ids_differ() {
        assert_ne!(GoalUuid::random(), GoalUuid::random());
    }
}
