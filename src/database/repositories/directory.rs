use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{EmployeeProfile, Role},
    utils::sql,
};
use crate::error::AppError;
use crate::services::ports::EmployeeDirectory;

#[derive(Clone)]
pub struct PgEmployeeDirectory {
    pool: PgPool,
}

impl PgEmployeeDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for PgEmployeeDirectory {
    async fn get_employee(&self, id: Uuid) -> Result<Option<EmployeeProfile>, AppError> {
        let employee = sqlx::query_as::<_, EmployeeProfile>(&sql(r#"
            SELECT
                id,
                full_name,
                category,
                union_member,
                supervisor_id,
                general_manager_id,
                payroll_id,
                daily_salary
            FROM
                employees
            WHERE
                id = ?
        "#))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    async fn get_user_role(&self, user_id: Uuid) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_scalar::<_, Role>(&sql(r#"
            SELECT
                role
            FROM
                user_roles
            WHERE
                user_id = ?
        "#))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn users_with_roles(&self, roles: &[Role]) -> Result<Vec<Uuid>, AppError> {
        let users = sqlx::query_scalar::<_, Uuid>(&sql(r#"
            SELECT
                user_id
            FROM
                user_roles
            WHERE
                role = ANY(?)
            ORDER BY
                user_id
        "#))
        .bind(roles.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
