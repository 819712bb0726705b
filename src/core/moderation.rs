//! Moderation rules that do not need a live gateway: role hierarchy checks,
//! channel lock overwrites and purge bounds.

use poise::serenity_prelude::Permissions;

/// Smallest number of messages `clear` accepts
pub const MIN_CLEAR: u8 = 2;
/// Largest number of messages `clear` accepts (bulk delete limit)
pub const MAX_CLEAR: u8 = 100;
/// Age in seconds after which Discord refuses to bulk delete a message
pub const BULK_DELETE_MAX_AGE: i64 = 14 * 24 * 60 * 60;
/// Colour of the muted role
pub const MUTED_ROLE_COLOUR: u32 = 0x006D_6D6D;

/// Permissions a muted member loses in every channel.
#[must_use]
pub const fn muted_denied_permissions() -> Permissions {
    Permissions::SEND_MESSAGES
        .union(Permissions::ADD_REACTIONS)
        .union(Permissions::SPEAK)
}

/// Where a member stands in the guild's role hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    /// Discord user ID
    pub user_id: u64,
    /// Position of the member's highest role (0 for @everyone only)
    pub top_role_position: u16,
}

/// Whether `actor` may moderate `target`.
///
/// The owner can act on anyone and cannot be acted on. Otherwise the actor's
/// highest role must be strictly above the target's.
#[must_use]
pub fn can_modify(owner_id: u64, actor: Rank, target: Rank) -> bool {
    if target.user_id == owner_id {
        return false;
    }
    if actor.user_id == owner_id {
        return true;
    }
    actor.top_role_position > target.top_role_position
}

/// Why a lock state change is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// `SEND_MESSAGES` is already denied
    AlreadyLocked,
    /// `SEND_MESSAGES` is not denied
    AlreadyUnlocked,
}

/// Allow/deny pair of a channel permission overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverwriteBits {
    /// Explicitly allowed permissions
    pub allow: Permissions,
    /// Explicitly denied permissions
    pub deny: Permissions,
}

impl Default for OverwriteBits {
    fn default() -> Self {
        Self {
            allow: Permissions::empty(),
            deny: Permissions::empty(),
        }
    }
}

/// Computes the @everyone overwrite that locks a channel.
///
/// Only `SEND_MESSAGES` changes; the view-channel setting is preserved.
pub fn lock_overwrite(existing: Option<OverwriteBits>) -> Result<OverwriteBits, LockError> {
    let current = existing.unwrap_or_default();
    if current.deny.contains(Permissions::SEND_MESSAGES) {
        return Err(LockError::AlreadyLocked);
    }
    Ok(OverwriteBits {
        allow: current.allow - Permissions::SEND_MESSAGES,
        deny: current.deny | Permissions::SEND_MESSAGES,
    })
}

/// Computes the @everyone overwrite that unlocks a channel.
pub fn unlock_overwrite(existing: Option<OverwriteBits>) -> Result<OverwriteBits, LockError> {
    let current = existing.unwrap_or_default();
    if !current.deny.contains(Permissions::SEND_MESSAGES) {
        return Err(LockError::AlreadyUnlocked);
    }
    Ok(OverwriteBits {
        allow: current.allow | Permissions::SEND_MESSAGES,
        deny: current.deny - Permissions::SEND_MESSAGES,
    })
}

/// Whether a purge count is within the accepted bounds.
#[must_use]
pub const fn clear_count_in_range(count: u8) -> bool {
    count >= MIN_CLEAR && count <= MAX_CLEAR
}

/// Whether a message created at `created_at` (unix seconds) can still be
/// bulk deleted at `now`.
#[must_use]
pub const fn bulk_deletable(created_at: i64, now: i64) -> bool {
    now - created_at < BULK_DELETE_MAX_AGE
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: u64 = 1;

    fn rank(user_id: u64, top_role_position: u16) -> Rank {
        Rank {
            user_id,
            top_role_position,
        }
    }

    #[test]
    fn test_owner_rules() {
        assert!(can_modify(OWNER, rank(OWNER, 0), rank(2, 50)));
        assert!(!can_modify(OWNER, rank(2, 99), rank(OWNER, 0)));
    }

    #[test]
    fn test_role_positions() {
        assert!(can_modify(OWNER, rank(2, 5), rank(3, 4)));
        assert!(!can_modify(OWNER, rank(2, 5), rank(3, 5)));
        assert!(!can_modify(OWNER, rank(2, 0), rank(3, 1)));
    }

    #[test]
    fn test_lock_preserves_view_channel() {
        let existing = OverwriteBits {
            allow: Permissions::VIEW_CHANNEL,
            deny: Permissions::empty(),
        };
        let locked = lock_overwrite(Some(existing));
        assert_eq!(
            locked,
            Ok(OverwriteBits {
                allow: Permissions::VIEW_CHANNEL,
                deny: Permissions::SEND_MESSAGES,
            })
        );

        let unlocked = locked.and_then(|bits| unlock_overwrite(Some(bits)));
        assert_eq!(
            unlocked,
            Ok(OverwriteBits {
                allow: Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
                deny: Permissions::empty(),
            })
        );
    }

    #[test]
    fn test_lock_state_errors() {
        let locked = OverwriteBits {
            allow: Permissions::empty(),
            deny: Permissions::SEND_MESSAGES,
        };
        assert_eq!(lock_overwrite(Some(locked)), Err(LockError::AlreadyLocked));
        assert_eq!(unlock_overwrite(None), Err(LockError::AlreadyUnlocked));
        assert!(lock_overwrite(None).is_ok());
    }

    #[test]
    fn test_clear_bounds() {
        assert!(!clear_count_in_range(1));
        assert!(clear_count_in_range(2));
        assert!(clear_count_in_range(100));
        assert!(!clear_count_in_range(101));
    }

    #[test]
    fn test_bulk_delete_age() {
        let now = 1_700_000_000;
        assert!(bulk_deletable(now - 60, now));
        assert!(!bulk_deletable(now - BULK_DELETE_MAX_AGE, now));
    }

    #[test]
    fn test_muted_permissions() {
        let denied = muted_denied_permissions();
        assert!(denied.contains(Permissions::SEND_MESSAGES));
        assert!(denied.contains(Permissions::ADD_REACTIONS));
        assert!(denied.contains(Permissions::SPEAK));
        assert!(!denied.contains(Permissions::VIEW_CHANNEL));
    }
}
