use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};

use crate::entities::{roles, user_roles};

pub struct RoleRepository {
    conn: DatabaseConnection,
}

impl RoleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Assign a role to a user, creating the role on first reference.
    ///
    /// Idempotent: a duplicate (user, role) link hits the composite primary
    /// key and is treated as the no-op it is.
    pub async fn assign(&self, user_id: i32, role_name: &str) -> Result<()> {
        let role = self.get_or_create(role_name).await?;

        let link = user_roles::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role.id),
        };

        let insert = user_roles::Entity::insert(link)
            .on_conflict(
                OnConflict::columns([user_roles::Column::UserId, user_roles::Column::RoleId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await;

        match insert {
            // RecordNotInserted is the do-nothing arm of the conflict clause
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(e).context("Failed to link user to role"),
        }
    }

    /// Role names held by a user: links by user, then roles by id set.
    pub async fn names_for_user(&self, user_id: i32) -> Result<Vec<String>> {
        let links = user_roles::Entity::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to query role links for user")?;

        if links.is_empty() {
            return Ok(Vec::new());
        }

        let role_ids: Vec<i32> = links.iter().map(|l| l.role_id).collect();

        let roles = roles::Entity::find()
            .filter(roles::Column::Id.is_in(role_ids))
            .all(&self.conn)
            .await
            .context("Failed to query roles by id")?;

        Ok(roles.into_iter().map(|r| r.name).collect())
    }

    async fn get_or_create(&self, role_name: &str) -> Result<roles::Model> {
        if let Some(role) = roles::Entity::find()
            .filter(roles::Column::Name.eq(role_name))
            .one(&self.conn)
            .await
            .context("Failed to query role by name")?
        {
            return Ok(role);
        }

        let insert = roles::ActiveModel {
            name: Set(role_name.to_string()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await;

        match insert {
            Ok(role) => Ok(role),
            // Lost the creation race; the winner's row is the one we want.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => roles::Entity::find()
                .filter(roles::Column::Name.eq(role_name))
                .one(&self.conn)
                .await
                .context("Failed to re-query role after conflict")?
                .ok_or_else(|| anyhow::anyhow!("Role '{role_name}' vanished after conflict")),
            Err(e) => Err(e).context("Failed to create role"),
        }
    }
}
