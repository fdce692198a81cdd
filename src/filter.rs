//! Acceptance filtering
//!
//! The rule table is installed once while the controller is frozen; after
//! that the hardware evaluates every rule against each inbound identifier
//! and accepts the frame if any of them matches.

/// Identifier/mask pair. A mask bit of 1 means "must match", 0 is don't care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptanceRule {
    pub id: u32,
    pub mask: u32,
    pub extended: bool,
}

impl AcceptanceRule {
    /// Matches exactly one standard identifier
    pub const fn exact(id: u32) -> Self {
        Self {
            id,
            mask: 0x7FF,
            extended: false,
        }
    }

    pub const fn masked(id: u32, mask: u32) -> Self {
        Self {
            id,
            mask,
            extended: false,
        }
    }

    pub const fn extended(id: u32, mask: u32) -> Self {
        Self {
            id,
            mask,
            extended: true,
        }
    }

    pub fn matches(&self, id: u32, extended: bool) -> bool {
        self.extended == extended && (id ^ self.id) & self.mask == 0
    }
}

/// Software mirror of the hardware decision
pub fn accepts(rules: &[AcceptanceRule], id: u32, extended: bool) -> bool {
    rules.iter().any(|rule| rule.matches(id, extended))
}
