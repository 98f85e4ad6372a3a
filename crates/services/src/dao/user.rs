use bson::{DateTime, doc, oid::ObjectId};
use chrono::{Duration, Utc};
use leadflow_db::models::{PasswordReset, User};
use mongodb::Database;
use nanoid::nanoid;

use super::base::{BaseDao, DaoError, DaoResult};

const RESET_TOKEN_TTL_MINS: i64 = 60;

pub struct UserDao {
    pub base: BaseDao<User>,
    pub resets: BaseDao<PasswordReset>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
            resets: BaseDao::new(db, PasswordReset::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        email: String,
        display_name: String,
        password_hash: String,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            email: email.to_lowercase(),
            display_name,
            avatar: None,
            password_hash: Some(password_hash),
            is_platform_admin: false,
            locale: "en-US".to_string(),
            timezone: "UTC".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": email.to_lowercase(), "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: ObjectId,
        display_name: Option<String>,
        avatar: Option<String>,
        locale: Option<String>,
        timezone: Option<String>,
    ) -> DaoResult<bool> {
        let mut update = bson::Document::new();
        if let Some(name) = display_name {
            update.insert("display_name", name);
        }
        if let Some(av) = avatar {
            update.insert("avatar", av);
        }
        if let Some(loc) = locale {
            update.insert("locale", loc);
        }
        if let Some(tz) = timezone {
            update.insert("timezone", tz);
        }

        if update.is_empty() {
            return Ok(false);
        }

        self.base
            .update_by_id(user_id, doc! { "$set": update })
            .await
    }

    /// Issues a one-hour reset token for the user.
    pub async fn create_password_reset(&self, user_id: ObjectId) -> DaoResult<PasswordReset> {
        let now = Utc::now();
        let reset = PasswordReset {
            id: None,
            user_id,
            token: nanoid!(32),
            expires_at: DateTime::from_chrono(now + Duration::minutes(RESET_TOKEN_TTL_MINS)),
            used_at: None,
            created_at: DateTime::from_chrono(now),
        };

        let id = self.resets.insert_one(&reset).await?;
        self.resets.find_by_id(id).await
    }

    /// Consumes a reset token and rewrites the password hash. The token is
    /// claimed with a single compare-and-set on `used_at`, so two racing
    /// requests cannot both consume it.
    pub async fn reset_password(&self, token: &str, password_hash: String) -> DaoResult<ObjectId> {
        let reset = self
            .resets
            .find_one(doc! { "token": token })
            .await?
            .ok_or(DaoError::NotFound)?;

        if reset.used_at.is_some() {
            return Err(DaoError::Gone("reset token already used".to_string()));
        }
        if reset.expires_at <= DateTime::now() {
            return Err(DaoError::Gone("reset token expired".to_string()));
        }

        let claimed = self
            .resets
            .collection()
            .find_one_and_update(
                doc! { "token": token, "used_at": null },
                doc! { "$set": { "used_at": DateTime::now() } },
            )
            .await?
            .ok_or(DaoError::Gone("reset token already used".to_string()))?;

        self.base
            .update_by_id(
                claimed.user_id,
                doc! { "$set": { "password_hash": password_hash } },
            )
            .await?;

        Ok(claimed.user_id)
    }
}
