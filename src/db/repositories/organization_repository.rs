use std::convert::TryFrom;

use chrono::Utc;
use rusqlite::{named_params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp};
use crate::error::{AppError, AppResult};
use crate::models::employee::{NewOrganization, OrganizationRecord};

#[derive(Debug, Clone)]
pub struct OrganizationRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

impl OrganizationRow {
    pub fn into_record(self) -> AppResult<OrganizationRecord> {
        Ok(OrganizationRecord {
            id: self.id,
            name: self.name,
            email: self.email,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

impl TryFrom<&Row<'_>> for OrganizationRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct OrganizationRepository;

impl OrganizationRepository {
    pub fn insert(conn: &Connection, input: &NewOrganization) -> AppResult<OrganizationRecord> {
        let name = input.name.trim();
        let email = input.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(AppError::validation("organization name and email are required"));
        }

        let row = OrganizationRow {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_lowercase(),
            created_at: format_timestamp(&Utc::now()),
        };

        conn.execute(
            r#"
                INSERT INTO organizations (id, name, email, created_at)
                VALUES (:id, :name, :email, :created_at)
            "#,
            named_params! {
                ":id": &row.id,
                ":name": &row.name,
                ":email": &row.email,
                ":created_at": &row.created_at,
            },
        )?;

        row.into_record()
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<OrganizationRecord>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, email, created_at FROM organizations WHERE id = :id",
        )?;

        let row = stmt
            .query_row(named_params! {":id": id}, |row| OrganizationRow::try_from(row))
            .optional()?;

        row.map(|row| row.into_record()).transpose()
    }
}
