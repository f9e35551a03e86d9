use std::fmt;

use crate::error::Error;

/// Percentage of the DMGP a flow asks for, per GoS level 0..=3.
const RESERVED_PERCENTAGE: [usize; 4] = [0, 4, 8, 12];

/// The eight symbolic Guarantee-of-Service levels carried in the EXP field.
///
/// Raw values 0..=3 are levels 0-3 without a backup LSP, 4..=7 the same levels
/// with a backup LSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GosLevel {
    Level0WithoutBackupLsp = 0,
    Level1WithoutBackupLsp = 1,
    Level2WithoutBackupLsp = 2,
    Level3WithoutBackupLsp = 3,
    Level0WithBackupLsp = 4,
    Level1WithBackupLsp = 5,
    Level2WithBackupLsp = 6,
    Level3WithBackupLsp = 7,
}

impl GosLevel {
    /// Priority 0..=3, ignoring the backup flag.
    pub fn priority(self) -> u8 {
        self as u8 % 4
    }

    pub fn has_backup_lsp(self) -> bool {
        self as u8 >= 4
    }

    /// Share of the DMGP requested by a flow at this level. Both backup variants of a
    /// level request the same share.
    pub fn requested_percentage(self) -> usize {
        RESERVED_PERCENTAGE[self.priority() as usize]
    }
}

impl TryFrom<u8> for GosLevel {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Level0WithoutBackupLsp,
            1 => Self::Level1WithoutBackupLsp,
            2 => Self::Level2WithoutBackupLsp,
            3 => Self::Level3WithoutBackupLsp,
            4 => Self::Level0WithBackupLsp,
            5 => Self::Level1WithBackupLsp,
            6 => Self::Level2WithBackupLsp,
            7 => Self::Level3WithBackupLsp,
            other => return Err(Error::InvalidGosLevel(other)),
        })
    }
}

impl fmt::Display for GosLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_backup_lsp() {
            write!(f, "GoS{}+backup", self.priority())
        } else {
            write!(f, "GoS{}", self.priority())
        }
    }
}

/// Requested DMGP percentage for an optional GoS level; no level means no reservation.
pub fn requested_percentage(level: Option<GosLevel>) -> usize {
    level.map_or(0, GosLevel::requested_percentage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(GosLevel::Level0WithoutBackupLsp => 0)]
    #[test_case(GosLevel::Level0WithBackupLsp => 0)]
    #[test_case(GosLevel::Level1WithoutBackupLsp => 4)]
    #[test_case(GosLevel::Level1WithBackupLsp => 4)]
    #[test_case(GosLevel::Level2WithoutBackupLsp => 8)]
    #[test_case(GosLevel::Level2WithBackupLsp => 8)]
    #[test_case(GosLevel::Level3WithoutBackupLsp => 12)]
    #[test_case(GosLevel::Level3WithBackupLsp => 12)]
    fn test_percentage_tiers(level: GosLevel) -> usize {
        level.requested_percentage()
    }

    #[test]
    fn test_missing_level_requests_nothing() {
        assert_eq!(requested_percentage(None), 0);
        assert_eq!(requested_percentage(Some(GosLevel::Level3WithBackupLsp)), 12);
    }

    #[test]
    fn test_raw_values() {
        for raw in 0u8..8 {
            let level = GosLevel::try_from(raw).unwrap();
            assert_eq!(level as u8, raw);
            assert_eq!(level.has_backup_lsp(), raw >= 4);
        }
        assert!(matches!(GosLevel::try_from(8), Err(Error::InvalidGosLevel(8))));
    }
}
