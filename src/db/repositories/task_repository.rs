use std::convert::TryFrom;

use chrono::{DateTime, Utc};
use rusqlite::{named_params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{format_timestamp, parse_timestamp};
use crate::error::{AppError, AppResult};
use crate::models::task::{
    NewTask, TaskRecord, TaskStatus, TaskStatusUpdate, MAX_COMPLEXITY, MIN_COMPLEXITY,
};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        title,
        description,
        status,
        complexity,
        deadline,
        employee_id,
        organization_id,
        completed_at,
        on_chain_tx_hash,
        created_at,
        updated_at
    FROM tasks
"#;

#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub complexity: i64,
    pub deadline: String,
    pub employee_id: Option<String>,
    pub organization_id: String,
    pub completed_at: Option<String>,
    pub on_chain_tx_hash: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskRow {
    pub fn into_record(self) -> AppResult<TaskRecord> {
        let status = TaskStatus::try_from(self.status.as_str()).map_err(AppError::database)?;
        Ok(TaskRecord {
            id: self.id,
            title: self.title,
            description: self.description,
            status,
            complexity: self.complexity,
            deadline: parse_timestamp(&self.deadline)?,
            employee_id: self.employee_id,
            organization_id: self.organization_id,
            completed_at: self
                .completed_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            on_chain_tx_hash: self.on_chain_tx_hash,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

impl TryFrom<&Row<'_>> for TaskRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            status: row.get("status")?,
            complexity: row.get("complexity")?,
            deadline: row.get("deadline")?,
            employee_id: row.get("employee_id")?,
            organization_id: row.get("organization_id")?,
            completed_at: row.get("completed_at")?,
            on_chain_tx_hash: row.get("on_chain_tx_hash")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Per-status task totals for one organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStatusCounts {
    pub total: usize,
    pub assigned: usize,
    pub in_progress: usize,
    pub completed: usize,
}

pub struct TaskRepository;

impl TaskRepository {
    /// Create a task. Complexity defaults to 1 and must lie in 1-5; the
    /// assignee must belong to the task's organization. Missing creation and
    /// completion stamps take `now`.
    pub fn insert(conn: &Connection, input: &NewTask, now: DateTime<Utc>) -> AppResult<TaskRecord> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("task title is required"));
        }

        let complexity = input.complexity.unwrap_or(MIN_COMPLEXITY);
        if !(MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(&complexity) {
            return Err(AppError::validation_with_details(
                "task complexity must be between 1 and 5",
                serde_json::json!({ "complexity": complexity }),
            ));
        }

        let assignee_org: Option<String> = conn
            .query_row(
                "SELECT organization_id FROM employees WHERE id = :id",
                named_params! {":id": &input.employee_id},
                |row| row.get(0),
            )
            .optional()?;
        match assignee_org {
            None => return Err(AppError::validation("assigned employee does not exist")),
            Some(org) if org != input.organization_id => {
                return Err(AppError::forbidden(
                    "assigned employee belongs to another organization",
                ));
            }
            Some(_) => {}
        }

        let created_at = input.created_at.unwrap_or(now);
        let status = input.status.unwrap_or(TaskStatus::Assigned);
        let completed_at = match status {
            TaskStatus::Completed => Some(input.completed_at.unwrap_or(now)),
            _ => None,
        };

        let row = TaskRow {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: input
                .description
                .as_ref()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            status: status.as_str().to_string(),
            complexity,
            deadline: format_timestamp(&input.deadline),
            employee_id: Some(input.employee_id.clone()),
            organization_id: input.organization_id.clone(),
            completed_at: completed_at.as_ref().map(format_timestamp),
            on_chain_tx_hash: None,
            created_at: format_timestamp(&created_at),
            updated_at: format_timestamp(&completed_at.unwrap_or(created_at)),
        };

        conn.execute(
            r#"
                INSERT INTO tasks (
                    id, title, description, status, complexity, deadline,
                    employee_id, organization_id, completed_at, on_chain_tx_hash,
                    created_at, updated_at
                ) VALUES (
                    :id, :title, :description, :status, :complexity, :deadline,
                    :employee_id, :organization_id, :completed_at, :on_chain_tx_hash,
                    :created_at, :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":description": &row.description,
                ":status": &row.status,
                ":complexity": &row.complexity,
                ":deadline": &row.deadline,
                ":employee_id": &row.employee_id,
                ":organization_id": &row.organization_id,
                ":completed_at": &row.completed_at,
                ":on_chain_tx_hash": &row.on_chain_tx_hash,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        row.into_record()
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<TaskRecord>> {
        let sql = format!("{BASE_SELECT} WHERE id = :id");
        let mut stmt = conn.prepare(&sql)?;

        let row = stmt
            .query_row(named_params! {":id": id}, |row| TaskRow::try_from(row))
            .optional()?;

        row.map(|row| row.into_record()).transpose()
    }

    /// Every task assigned to the employee, oldest first.
    pub fn list_for_employee(conn: &Connection, employee_id: &str) -> AppResult<Vec<TaskRecord>> {
        let sql = format!(
            "{BASE_SELECT} WHERE employee_id = :employee_id ORDER BY created_at ASC, rowid ASC"
        );
        Self::query_list(conn, &sql, named_params! {":employee_id": employee_id})
    }

    /// Apply a status change. The completion stamp is written the first time
    /// the task reaches COMPLETED and never overwritten; `updated_at` always
    /// moves to `now`.
    pub fn update_status(
        conn: &Connection,
        id: &str,
        update: &TaskStatusUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<TaskRecord> {
        let mut record = Self::find_by_id(conn, id)?.ok_or_else(AppError::not_found)?;

        if update.status == TaskStatus::Completed && record.completed_at.is_none() {
            record.completed_at = Some(now);
        }
        if let Some(hash) = update
            .on_chain_tx_hash
            .as_ref()
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
        {
            record.on_chain_tx_hash = Some(hash.to_string());
        }
        record.status = update.status;
        record.updated_at = now;

        conn.execute(
            r#"
                UPDATE tasks SET
                    status = :status,
                    completed_at = :completed_at,
                    on_chain_tx_hash = :on_chain_tx_hash,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":status": record.status.as_str(),
                ":completed_at": record.completed_at.as_ref().map(format_timestamp),
                ":on_chain_tx_hash": &record.on_chain_tx_hash,
                ":updated_at": format_timestamp(&record.updated_at),
                ":id": id,
            },
        )?;

        Ok(record)
    }

    pub fn status_counts(conn: &Connection, organization_id: &str) -> AppResult<TaskStatusCounts> {
        let mut stmt = conn.prepare(
            r#"
                SELECT status, COUNT(*) AS total
                FROM tasks
                WHERE organization_id = :organization_id
                GROUP BY status
            "#,
        )?;

        let rows = stmt
            .query_map(named_params! {":organization_id": organization_id}, |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = TaskStatusCounts::default();
        for (status, total) in rows {
            let total = usize::try_from(total).unwrap_or(0);
            counts.total += total;
            match TaskStatus::try_from(status.as_str()).map_err(AppError::database)? {
                TaskStatus::Assigned => counts.assigned += total,
                TaskStatus::InProgress => counts.in_progress += total,
                TaskStatus::Completed => counts.completed += total,
            }
        }
        Ok(counts)
    }

    /// Distinct employees holding at least one ASSIGNED or IN_PROGRESS task.
    pub fn count_active_employees(conn: &Connection, organization_id: &str) -> AppResult<usize> {
        let count: i64 = conn.query_row(
            r#"
                SELECT COUNT(DISTINCT employee_id)
                FROM tasks
                WHERE organization_id = :organization_id
                    AND employee_id IS NOT NULL
                    AND status IN ('ASSIGNED', 'IN_PROGRESS')
            "#,
            named_params! {":organization_id": organization_id},
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn query_list(
        conn: &Connection,
        sql: &str,
        params: &[(&str, &dyn rusqlite::ToSql)],
    ) -> AppResult<Vec<TaskRecord>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| TaskRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|row| row.into_record()).collect()
    }
}
