use crate::domain::foundation::UserId;
use crate::domain::membership::MembershipError;
use crate::domain::profile::Profile;
use crate::ports::ProfileStore;

/// Loads the caller's profile and checks the admin role.
///
/// A caller without a profile is treated like a non-admin.
pub async fn require_admin<S>(store: &S, user_id: &UserId) -> Result<Profile, MembershipError>
where
    S: ProfileStore + ?Sized,
{
    match store.get_profile(user_id).await? {
        Some(profile) if profile.is_admin() => Ok(profile),
        _ => {
            tracing::warn!(user_id = %user_id, "Admin access denied");
            Err(MembershipError::Forbidden)
        }
    }
}
