use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::db::repositories::{EmployeeRepository, OrganizationRepository, TaskRepository};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::assignment::{AssignmentRecommendations, TaskAssignmentRecommendation};
use crate::models::dashboard::{DepartmentStats, OrganizationDashboard, TopPerformer};
use crate::models::employee::EmployeeRecord;
use crate::models::insight::{EmployeeInsightsResponse, InsightSubject};
use crate::models::productivity::{EmployeeScoreResponse, ScoreResult};
use crate::models::task::{TaskRecord, TaskStatusUpdate};
use crate::models::trend::TrendResult;
use crate::services::assignment_ranker::{rank_employees, rank_for_task};
use crate::services::insight_generator::InsightProvider;
use crate::services::scoring_engine::calculate_score;
use crate::services::trend_predictor::predict_trend;
use crate::utils::rounding::round_half_up;

/// Source of "now" for stamping and trend cut-offs.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Complexity assumed when ranking for a task that does not exist yet.
pub const DEFAULT_TASK_COMPLEXITY: i64 = 3;
const TOP_PERFORMER_LIMIT: usize = 5;

/// Organization-scoped entry points: load a snapshot through the
/// repositories, run the engines over it and persist what needs persisting.
pub struct WorkforceService {
    db: DbPool,
    insights: Arc<dyn InsightProvider>,
    clock: Clock,
}

impl WorkforceService {
    pub fn new(db: DbPool, insights: Arc<dyn InsightProvider>) -> Self {
        Self {
            db,
            insights,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Score an employee over all their tasks and store the composite as
    /// their `ai_score`.
    pub fn employee_score(
        &self,
        organization_id: &str,
        employee_id: &str,
    ) -> AppResult<EmployeeScoreResponse> {
        let (employee, result) = self.db.with_connection(|conn| {
            let employee = load_employee(conn, organization_id, employee_id)?;
            let result = score_and_persist(conn, &employee)?;
            Ok((employee, result))
        })?;

        Ok(EmployeeScoreResponse {
            employee_id: employee.id,
            result,
        })
    }

    pub async fn employee_insights(
        &self,
        organization_id: &str,
        employee_id: &str,
    ) -> AppResult<EmployeeInsightsResponse> {
        let (employee, score) = self.db.with_connection(|conn| {
            let employee = load_employee(conn, organization_id, employee_id)?;
            let score = score_and_persist(conn, &employee)?;
            Ok((employee, score))
        })?;

        let subject = InsightSubject::from(&employee);
        let insights = self.insights.generate(&subject, &score).await;

        info!(
            target: "app::workforce",
            employee_id = %employee.id,
            score = score.score,
            source = ?insights.source,
            "generated employee insights"
        );

        Ok(EmployeeInsightsResponse {
            employee_id: employee.id,
            score,
            insights,
        })
    }

    pub fn employee_trend(&self, organization_id: &str, employee_id: &str) -> AppResult<TrendResult> {
        let tasks = self.db.with_connection(|conn| {
            let employee = load_employee(conn, organization_id, employee_id)?;
            TaskRepository::list_for_employee(conn, &employee.id)
        })?;

        let today = (self.clock)().date_naive();
        Ok(predict_trend(&tasks, today))
    }

    /// Rank the whole organization for a hypothetical task.
    pub fn rank_employees(
        &self,
        organization_id: &str,
        task_complexity: Option<i64>,
    ) -> AppResult<AssignmentRecommendations> {
        let complexity = task_complexity.unwrap_or(DEFAULT_TASK_COMPLEXITY);
        let candidates = self.db.with_connection(|conn| {
            EmployeeRepository::list_assignment_candidates(conn, organization_id)
        })?;

        Ok(AssignmentRecommendations {
            recommendations: rank_employees(&candidates, complexity),
        })
    }

    /// Top candidates for an existing task, with its current assignee flagged.
    pub fn recommend_for_task(
        &self,
        organization_id: &str,
        task_id: &str,
    ) -> AppResult<TaskAssignmentRecommendation> {
        let (task, candidates) = self.db.with_connection(|conn| {
            let task = TaskRepository::find_by_id(conn, task_id)?.ok_or_else(AppError::not_found)?;
            if task.organization_id != organization_id {
                return Err(AppError::forbidden("task belongs to another organization"));
            }
            let candidates = EmployeeRepository::list_assignment_candidates(conn, organization_id)?;
            Ok((task, candidates))
        })?;

        let recommendations =
            rank_for_task(&candidates, task.complexity, task.employee_id.as_deref());

        Ok(TaskAssignmentRecommendation {
            task_id: task.id,
            task_title: task.title,
            recommendations,
        })
    }

    pub fn organization_dashboard(&self, organization_id: &str) -> AppResult<OrganizationDashboard> {
        self.db.with_connection(|conn| {
            OrganizationRepository::find_by_id(conn, organization_id)?
                .ok_or_else(AppError::not_found)?;
            let employees = EmployeeRepository::list_for_organization(conn, organization_id)?;
            let counts = TaskRepository::status_counts(conn, organization_id)?;
            let active_employees = TaskRepository::count_active_employees(conn, organization_id)?;

            Ok(OrganizationDashboard {
                total_employees: employees.len(),
                active_employees,
                total_tasks: counts.total,
                completed_tasks: counts.completed,
                in_progress_tasks: counts.in_progress,
                assigned_tasks: counts.assigned,
                avg_productivity_score: average_score(employees.iter().map(|e| e.ai_score)),
                department_stats: department_stats(&employees),
                top_performers: top_performers(&employees),
            })
        })
    }

    pub fn update_task_status(
        &self,
        organization_id: &str,
        task_id: &str,
        update: &TaskStatusUpdate,
    ) -> AppResult<TaskRecord> {
        let now = (self.clock)();
        let task = self.db.with_connection(|conn| {
            let existing =
                TaskRepository::find_by_id(conn, task_id)?.ok_or_else(AppError::not_found)?;
            if existing.organization_id != organization_id {
                return Err(AppError::forbidden("task belongs to another organization"));
            }
            TaskRepository::update_status(conn, task_id, update, now)
        })?;

        info!(
            target: "app::workforce",
            task_id = %task.id,
            status = %task.status,
            "task status updated"
        );
        Ok(task)
    }
}

fn load_employee(
    conn: &rusqlite::Connection,
    organization_id: &str,
    employee_id: &str,
) -> AppResult<EmployeeRecord> {
    let employee =
        EmployeeRepository::find_by_id(conn, employee_id)?.ok_or_else(AppError::not_found)?;
    if employee.organization_id != organization_id {
        return Err(AppError::forbidden("employee belongs to another organization"));
    }
    Ok(employee)
}

fn score_and_persist(conn: &rusqlite::Connection, employee: &EmployeeRecord) -> AppResult<ScoreResult> {
    let tasks = TaskRepository::list_for_employee(conn, &employee.id)?;
    let result = calculate_score(&tasks);
    EmployeeRepository::update_ai_score(conn, &employee.id, result.score)?;

    debug!(
        target: "app::workforce",
        employee_id = %employee.id,
        previous = employee.ai_score,
        score = result.score,
        "persisted productivity score"
    );
    Ok(result)
}

fn average_score(scores: impl Iterator<Item = i64>) -> i64 {
    let (sum, count) = scores.fold((0i64, 0usize), |(sum, count), score| (sum + score, count + 1));
    if count == 0 {
        return 0;
    }
    round_half_up(sum as f64 / count as f64) as i64
}

/// Departments in order of first appearance.
fn department_stats(employees: &[EmployeeRecord]) -> Vec<DepartmentStats> {
    let mut groups: Vec<(&str, Vec<i64>)> = Vec::new();
    for employee in employees {
        match groups
            .iter_mut()
            .find(|(department, _)| *department == employee.department)
        {
            Some((_, scores)) => scores.push(employee.ai_score),
            None => groups.push((employee.department.as_str(), vec![employee.ai_score])),
        }
    }

    groups
        .into_iter()
        .map(|(department, scores)| DepartmentStats {
            department: department.to_string(),
            employee_count: scores.len(),
            avg_score: average_score(scores.into_iter()),
        })
        .collect()
}

fn top_performers(employees: &[EmployeeRecord]) -> Vec<TopPerformer> {
    let mut ranked: Vec<&EmployeeRecord> = employees.iter().collect();
    ranked.sort_by(|a, b| b.ai_score.cmp(&a.ai_score));
    ranked
        .into_iter()
        .take(TOP_PERFORMER_LIMIT)
        .map(|employee| TopPerformer {
            id: employee.id.clone(),
            name: employee.name.clone(),
            ai_score: employee.ai_score,
            department: employee.department.clone(),
            role: employee.role.clone(),
        })
        .collect()
}
