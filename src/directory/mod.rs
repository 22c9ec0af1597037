//! Profile directory
//!
//! Maps an authenticated account to its role-tagged profile. Profiles are
//! created lazily on first successful login, with the role inferred from the
//! login surface used (senior tab or youth tab). A profile whose role does
//! not match the surface is a user-visible rejection, never a silent role
//! override.

use bson::doc;
use tracing::{info, warn};

use crate::db::schemas::{ProfileDoc, Role, PROFILE_COLLECTION};
use crate::db::MongoClient;
use crate::types::{BridgewayError, Result};

/// Authenticated identity handed to store operations
///
/// Passed explicitly into every operation that needs a caller; nothing in the
/// crate reads a session from ambient state.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Account ID (hex ObjectId)
    pub account_id: String,
    pub email: String,
}

/// Look up the profile for an identity, creating it on first login
///
/// The surface role only decides what a brand-new profile becomes; an
/// existing profile's role is immutable and a mismatch is rejected.
pub async fn get_or_create_profile(
    mongo: &MongoClient,
    identity: &Identity,
    surface: Role,
) -> Result<ProfileDoc> {
    let profiles = mongo.collection::<ProfileDoc>(PROFILE_COLLECTION).await?;

    if let Some(existing) = profiles
        .find_one(doc! { "account_id": &identity.account_id })
        .await?
    {
        if existing.role != surface {
            warn!(
                email = %identity.email,
                profile_role = %existing.role,
                surface = %surface,
                "Login surface does not match profile role"
            );
            return Err(BridgewayError::RoleMismatch(format!(
                "this account is registered as {}, not {}",
                existing.role, surface
            )));
        }
        return Ok(existing);
    }

    let mut profile = ProfileDoc::new(
        identity.account_id.clone(),
        identity.email.clone(),
        surface,
    );

    match profiles.insert_one(profile.clone()).await {
        Ok(id) => {
            profile._id = Some(id);
            info!(email = %identity.email, role = %surface, "Profile created on first login");
            Ok(profile)
        }
        // The unique index on account_id turns a two-tab race into a
        // duplicate-key error; the loser adopts the winner's row
        Err(BridgewayError::Database(msg)) if msg.contains("E11000") => {
            let existing = profiles
                .find_one(doc! { "account_id": &identity.account_id })
                .await?
                .ok_or_else(|| {
                    BridgewayError::ProfileCreation(
                        "profile insert conflicted but no profile found".into(),
                    )
                })?;
            if existing.role != surface {
                return Err(BridgewayError::RoleMismatch(format!(
                    "this account is registered as {}, not {}",
                    existing.role, surface
                )));
            }
            Ok(existing)
        }
        Err(e) => {
            warn!(email = %identity.email, error = %e, "Profile creation failed");
            Err(BridgewayError::ProfileCreation(e.to_string()))
        }
    }
}
