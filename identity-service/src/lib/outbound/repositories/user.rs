use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::domain::user::models::normalize_identifier;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LookupFilter;
use crate::domain::user::models::Profile;
use crate::domain::user::models::ProviderLinks;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserListFilter;
use crate::domain::user::models::UserPage;
use crate::domain::user::models::UserQuery;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const USER_COLUMNS: &str = "id, first_name, last_name, user_name, phone_number, email, \
     password_hash, google_id, linkedin_id, facebook_id, apple_id, is_active, is_verified, \
     profile, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: Option<String>,
    user_name: Option<String>,
    phone_number: Option<String>,
    email: Option<String>,
    password_hash: Option<String>,
    google_id: Option<String>,
    linkedin_id: Option<String>,
    facebook_id: Option<String>,
    apple_id: Option<String>,
    is_active: bool,
    is_verified: bool,
    profile: Option<Json<Profile>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(r.id),
            first_name: r.first_name,
            last_name: r.last_name,
            user_name: r.user_name,
            phone_number: r.phone_number,
            email: r.email.map(EmailAddress::new).transpose()?,
            password_hash: r.password_hash,
            providers: ProviderLinks {
                google_id: r.google_id,
                linkedin_id: r.linkedin_id,
                facebook_id: r.facebook_id,
                apple_id: r.apple_id,
            },
            is_active: r.is_active,
            is_verified: r.is_verified,
            profile: r.profile.map(|profile| profile.0),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Map a failed write to the conflict it reports, if any.
fn write_error(e: sqlx::Error, user: &User) -> UserError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("users_email_key") => {
                    return UserError::EmailAlreadyExists(
                        user.email.as_ref().map(|email| email.to_string()).unwrap_or_default(),
                    );
                }
                Some("users_user_name_key") => {
                    return UserError::UserNameAlreadyExists(
                        user.user_name.clone().unwrap_or_default(),
                    );
                }
                Some("users_phone_number_key") => {
                    return UserError::PhoneNumberAlreadyExists(
                        user.phone_number.clone().unwrap_or_default(),
                    );
                }
                _ => {}
            }
        }
    }
    UserError::DatabaseError(e.to_string())
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserListFilter) {
    if *filter == UserListFilter::default() {
        return;
    }

    builder.push(" WHERE ");
    let mut conditions = builder.separated(" AND ");

    if let Some(email) = &filter.email {
        conditions.push("email = ").push_bind_unseparated(email.clone());
    }
    if let Some(user_name) = &filter.user_name {
        conditions
            .push("user_name = ")
            .push_bind_unseparated(user_name.clone());
    }
    if let Some(phone_number) = &filter.phone_number {
        conditions
            .push("phone_number = ")
            .push_bind_unseparated(phone_number.clone());
    }
    if let Some(is_active) = filter.is_active {
        conditions.push("is_active = ").push_bind_unseparated(is_active);
    }
    if let Some(is_verified) = filter.is_verified {
        conditions
            .push("is_verified = ")
            .push_bind_unseparated(is_verified);
    }
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, user_name, phone_number, email,
                password_hash, google_id, linkedin_id, facebook_id, apple_id,
                is_active, is_verified, profile, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(user.id.0)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.user_name)
        .bind(&user.phone_number)
        .bind(user.email.as_ref().map(EmailAddress::as_str))
        .bind(&user.password_hash)
        .bind(&user.providers.google_id)
        .bind(&user.providers.linkedin_id)
        .bind(&user.providers.facebook_id)
        .bind(&user.providers.apple_id)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.profile.clone().map(Json))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &user))?;

        Ok(user)
    }

    async fn find_one(&self, filter: &LookupFilter) -> Result<Option<User>, UserError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM users WHERE ",
            USER_COLUMNS
        ));

        match filter {
            LookupFilter::Email(email) => {
                query.push("email = ").push_bind(email.clone());
            }
            LookupFilter::UserName(user_name) => {
                query.push("user_name = ").push_bind(user_name.clone());
            }
            LookupFilter::PhoneNumber(phone_number) => {
                query.push("phone_number = ").push_bind(phone_number.clone());
            }
            LookupFilter::AnyIdentity(value) => {
                let identifier = normalize_identifier(value);
                query
                    .push("(email = ")
                    .push_bind(identifier.clone())
                    .push(" OR user_name = ")
                    .push_bind(identifier)
                    .push(" OR phone_number = ")
                    .push_bind(value.clone())
                    .push(")");
            }
        }
        query.push(" ORDER BY created_at LIMIT 1");

        let row = query
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }

    async fn list(&self, query: &UserQuery) -> Result<UserPage, UserError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count, &query.filter);

        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", USER_COLUMNS));
        push_filters(&mut select, &query.filter);

        if let Some(pagination) = query.pagination {
            select
                .push(" ORDER BY created_at DESC LIMIT ")
                .push_bind(i64::from(pagination.limit))
                .push(" OFFSET ")
                .push_bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX));
        }

        let rows = select
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UserPage {
            users,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, user_name = $4, phone_number = $5,
                email = $6, password_hash = $7, google_id = $8, linkedin_id = $9,
                facebook_id = $10, apple_id = $11, is_active = $12, is_verified = $13,
                profile = $14, updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.user_name)
        .bind(&user.phone_number)
        .bind(user.email.as_ref().map(EmailAddress::as_str))
        .bind(&user.password_hash)
        .bind(&user.providers.google_id)
        .bind(&user.providers.linkedin_id)
        .bind(&user.providers.facebook_id)
        .bind(&user.providers.apple_id)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.profile.clone().map(Json))
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &user))?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
