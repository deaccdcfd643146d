use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::tempdir;
use workforce_analytics::db::repositories::{
    EmployeeRepository, OrganizationRepository, TaskRepository,
};
use workforce_analytics::db::seed::{seed_demo_organization, DemoSeed};
use workforce_analytics::db::DbPool;
use workforce_analytics::error::AppError;
use workforce_analytics::models::employee::{NewEmployee, NewOrganization};
use workforce_analytics::models::insight::{InsightSource, PerformanceTier};
use workforce_analytics::models::task::{NewTask, TaskStatus, TaskStatusUpdate};
use workforce_analytics::models::trend::{TrendConfidence, TrendDirection};
use workforce_analytics::services::insight_generator::TemplateInsightProvider;
use workforce_analytics::services::scoring_engine::calculate_score;
use workforce_analytics::services::trend_predictor::COLLECTING_DATA_MESSAGE;
use workforce_analytics::services::workforce_service::WorkforceService;

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
        .single()
        .expect("anchor")
}

fn seeded(pool: &DbPool) -> DemoSeed {
    pool.with_connection(|conn| seed_demo_organization(conn, anchor()))
        .expect("seed demo data")
}

fn service(pool: &DbPool, now: DateTime<Utc>) -> WorkforceService {
    WorkforceService::new(pool.clone(), Arc::new(TemplateInsightProvider))
        .with_clock(Arc::new(move || now))
}

fn employee_id(seed: &DemoSeed, name: &str) -> String {
    seed.employees
        .iter()
        .find(|employee| employee.name == name)
        .map(|employee| employee.id.clone())
        .expect("seeded employee")
}

#[test]
fn dashboard_summarizes_seeded_organization() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("dashboard.sqlite")).expect("db pool");
    let seed = seeded(&pool);
    assert_eq!(seed.task_count, 35);

    let dashboard = service(&pool, anchor())
        .organization_dashboard(&seed.organization.id)
        .expect("dashboard");

    assert_eq!(dashboard.total_employees, 5);
    assert_eq!(dashboard.active_employees, 5);
    assert_eq!(dashboard.total_tasks, 35);
    assert_eq!(dashboard.completed_tasks, 29);
    assert_eq!(dashboard.in_progress_tasks, 3);
    assert_eq!(dashboard.assigned_tasks, 3);
    assert_eq!(dashboard.avg_productivity_score, 66);

    let departments: Vec<(&str, usize, i64)> = dashboard
        .department_stats
        .iter()
        .map(|stats| (stats.department.as_str(), stats.employee_count, stats.avg_score))
        .collect();
    assert_eq!(
        departments,
        vec![
            ("Engineering", 2, 72),
            ("Product", 1, 55),
            ("Infrastructure", 1, 72),
            ("Analytics", 1, 60),
        ]
    );

    let top: Vec<&str> = dashboard
        .top_performers
        .iter()
        .map(|performer| performer.name.as_str())
        .collect();
    assert_eq!(
        top,
        vec!["Alice Johnson", "David Lee", "Bob Smith", "Eva Martinez", "Carol Davis"]
    );
}

#[test]
fn scoring_persists_ai_score() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("score.sqlite")).expect("db pool");
    let seed = seeded(&pool);
    let alice = employee_id(&seed, "Alice Johnson");

    let response = service(&pool, anchor())
        .employee_score(&seed.organization.id, &alice)
        .expect("score");

    assert_eq!(response.employee_id, alice);
    assert_eq!(response.result.total_tasks, 8);
    assert_eq!(response.result.completed_tasks, 7);
    assert_eq!(response.result.breakdown.completion_rate, 87.5);
    assert_eq!(response.result.breakdown.speed_score, 100.0);
    assert_eq!(response.result.breakdown.complexity_score, 65.0);
    // 43.75 + 30 + 13
    assert_eq!(response.result.score, 87);

    let stored = pool
        .with_connection(|conn| EmployeeRepository::find_by_id(conn, &alice))
        .expect("lookup")
        .expect("alice exists");
    assert_eq!(stored.ai_score, 87);

    let json = serde_json::to_value(&response).expect("serialize");
    assert_eq!(json["employeeId"], alice.as_str());
    assert_eq!(json["score"], 87);
    assert_eq!(json["breakdown"]["completionRate"], 87.5);
}

#[test]
fn monthly_history_drives_trend() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("trend.sqlite")).expect("db pool");
    let seed = seeded(&pool);
    let workforce = service(&pool, anchor());

    let alice = workforce
        .employee_trend(&seed.organization.id, &employee_id(&seed, "Alice Johnson"))
        .expect("alice trend");
    let months: Vec<&str> = alice.monthly_data.iter().map(|d| d.month.as_str()).collect();
    assert_eq!(
        months,
        vec!["2024-01", "2024-02", "2024-03", "2024-04", "2024-05", "2024-06"]
    );
    let scores: Vec<i64> = alice.monthly_data.iter().map(|d| d.score).collect();
    assert_eq!(scores, vec![80, 88, 92, 100, 84, 16]);
    assert_eq!(alice.trend, TrendDirection::Improving);
    assert_eq!(alice.confidence, TrendConfidence::High);
    assert_eq!(alice.slope, 2.0);
    assert_eq!(alice.predicted_next_month, Some(97));

    let eva = workforce
        .employee_trend(&seed.organization.id, &employee_id(&seed, "Eva Martinez"))
        .expect("eva trend");
    assert_eq!(eva.confidence, TrendConfidence::InsufficientData);
    assert_eq!(eva.trend, TrendDirection::Stable);
    assert!(eva.monthly_data.is_empty());
    assert_eq!(eva.predicted_next_month, None);
    assert_eq!(eva.message.as_deref(), Some(COLLECTING_DATA_MESSAGE));
}

#[test]
fn ranking_uses_stored_scores_and_workload() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("rank.sqlite")).expect("db pool");
    let seed = seeded(&pool);
    let workforce = service(&pool, anchor());

    let complex = workforce
        .rank_employees(&seed.organization.id, Some(5))
        .expect("ranking");
    let order: Vec<(&str, i64)> = complex
        .recommendations
        .iter()
        .map(|r| (r.name.as_str(), r.match_score))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Alice Johnson", 81),
            ("David Lee", 78),
            ("Bob Smith", 65),
            ("Carol Davis", 60),
            ("Eva Martinez", 54),
        ]
    );
    assert_eq!(
        complex.recommendations[0].reason(),
        "Strong performer (78%) · Light workload · Suited for complex work"
    );
    assert_eq!(complex.recommendations[4].active_task_count, 2);

    // Bob and Carol tie at 70 and keep creation order.
    let default = workforce
        .rank_employees(&seed.organization.id, None)
        .expect("default ranking");
    let order: Vec<(&str, i64)> = default
        .recommendations
        .iter()
        .map(|r| (r.name.as_str(), r.match_score))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Alice Johnson", 76),
            ("David Lee", 73),
            ("Bob Smith", 70),
            ("Carol Davis", 70),
            ("Eva Martinez", 64),
        ]
    );
}

#[test]
fn task_recommendation_flags_current_assignee() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("recommend.sqlite")).expect("db pool");
    let seed = seeded(&pool);
    let eva = employee_id(&seed, "Eva Martinez");

    let churn = pool
        .with_connection(|conn| TaskRepository::list_for_employee(conn, &eva))
        .expect("eva tasks")
        .into_iter()
        .find(|task| task.title == "Customer Churn Analysis")
        .expect("churn task");

    let recommendation = service(&pool, anchor())
        .recommend_for_task(&seed.organization.id, &churn.id)
        .expect("recommendation");

    assert_eq!(recommendation.task_id, churn.id);
    assert_eq!(recommendation.task_title, "Customer Churn Analysis");
    assert_eq!(recommendation.recommendations.len(), 5);
    for candidate in &recommendation.recommendations {
        assert_eq!(
            candidate.is_currently_assigned,
            Some(candidate.employee_id == eva)
        );
    }
    assert_eq!(recommendation.recommendations[4].employee_id, eva);
}

#[tokio::test]
async fn template_insights_for_seeded_employee() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("insights.sqlite")).expect("db pool");
    let seed = seeded(&pool);
    let alice = employee_id(&seed, "Alice Johnson");

    let response = service(&pool, anchor())
        .employee_insights(&seed.organization.id, &alice)
        .await
        .expect("insights");

    assert_eq!(response.score.score, 87);
    assert_eq!(response.insights.source, InsightSource::Template);
    assert_eq!(response.insights.performance_tier, PerformanceTier::Exceptional);
    assert_eq!(
        response.insights.suggested_skills,
        vec![
            "Next.js".to_string(),
            "GraphQL".to_string(),
            "Testing (Jest/Cypress)".to_string(),
            "Accessibility (WCAG)".to_string(),
        ]
    );
    assert!(response
        .insights
        .performance_summary
        .contains("87% productivity score and 7/8 tasks completed"));

    let json = serde_json::to_value(&response).expect("serialize");
    assert_eq!(json["insights"]["performanceTier"], "exceptional");
    assert_eq!(json["insights"]["source"], "template");
}

#[test]
fn completion_is_stamped_once() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("status.sqlite")).expect("db pool");
    let seed = seeded(&pool);
    let alice = employee_id(&seed, "Alice Johnson");

    let pending = pool
        .with_connection(|conn| TaskRepository::list_for_employee(conn, &alice))
        .expect("alice tasks")
        .into_iter()
        .find(|task| task.status == TaskStatus::Assigned)
        .expect("pending task");
    assert!(pending.completed_at.is_none());

    let first_at = anchor();
    let completed = service(&pool, first_at)
        .update_task_status(
            &seed.organization.id,
            &pending.id,
            &TaskStatusUpdate {
                status: TaskStatus::Completed,
                on_chain_tx_hash: Some("0xabc123".to_string()),
            },
        )
        .expect("complete");
    assert_eq!(completed.completed_at, Some(first_at));
    assert_eq!(completed.updated_at, first_at);
    assert_eq!(completed.on_chain_tx_hash.as_deref(), Some("0xabc123"));

    let later = first_at + Duration::hours(5);
    let repeated = service(&pool, later)
        .update_task_status(
            &seed.organization.id,
            &pending.id,
            &TaskStatusUpdate {
                status: TaskStatus::Completed,
                on_chain_tx_hash: None,
            },
        )
        .expect("complete again");
    assert_eq!(repeated.completed_at, Some(first_at));
    assert_eq!(repeated.updated_at, later);
    assert_eq!(repeated.on_chain_tx_hash.as_deref(), Some("0xabc123"));

    let stored = pool
        .with_connection(|conn| TaskRepository::find_by_id(conn, &pending.id))
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored, repeated);
}

#[test]
fn cross_organization_access_is_rejected() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("scope.sqlite")).expect("db pool");
    let seed = seeded(&pool);
    let alice = employee_id(&seed, "Alice Johnson");

    let other = pool
        .with_connection(|conn| {
            OrganizationRepository::insert(
                conn,
                &NewOrganization {
                    name: "Globex".to_string(),
                    email: "ops@globex.example".to_string(),
                },
            )
        })
        .expect("second organization");

    let workforce = service(&pool, anchor());
    let error = workforce
        .employee_score(&other.id, &alice)
        .expect_err("foreign employee");
    assert!(matches!(error, AppError::Forbidden { .. }));

    let missing = workforce
        .employee_trend(&seed.organization.id, "no-such-employee")
        .expect_err("unknown employee");
    assert!(matches!(missing, AppError::NotFound));

    let empty = workforce
        .organization_dashboard(&other.id)
        .expect("empty dashboard");
    assert_eq!(empty.total_employees, 0);
    assert_eq!(empty.avg_productivity_score, 0);
    assert!(empty.top_performers.is_empty());
}

#[test]
fn out_of_range_complexity_is_rejected() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("validation.sqlite")).expect("db pool");
    let seed = seeded(&pool);

    let error = pool
        .with_connection(|conn| {
            TaskRepository::insert(
                conn,
                &NewTask {
                    title: "Impossible".to_string(),
                    description: None,
                    deadline: anchor() + Duration::days(3),
                    complexity: Some(6),
                    employee_id: seed.employees[0].id.clone(),
                    organization_id: seed.organization.id.clone(),
                    status: None,
                    created_at: None,
                    completed_at: None,
                },
                anchor(),
            )
        })
        .expect_err("complexity 6");
    assert!(matches!(error, AppError::Validation { .. }));
}

#[test]
fn five_months_of_early_deliveries_score_well() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("regression.sqlite")).expect("db pool");
    let seed = seeded(&pool);

    let tasks = pool
        .with_connection(|conn| {
            let employee = EmployeeRepository::insert(
                conn,
                &NewEmployee {
                    organization_id: seed.organization.id.clone(),
                    name: "Frank Ocean".to_string(),
                    email: "frank@acmetech.com".to_string(),
                    role: "Backend Engineer".to_string(),
                    department: "Engineering".to_string(),
                    ..NewEmployee::default()
                },
            )?;

            let start = Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap();
            for index in 0..8i64 {
                let created_at = start + Duration::days(index * 18);
                let deadline = created_at + Duration::days(7 + index);
                TaskRepository::insert(
                    conn,
                    &NewTask {
                        title: format!("Delivery {index}"),
                        description: None,
                        deadline,
                        complexity: Some(2 + index % 4),
                        employee_id: employee.id.clone(),
                        organization_id: seed.organization.id.clone(),
                        status: Some(TaskStatus::Completed),
                        created_at: Some(created_at),
                        completed_at: Some(deadline - Duration::days(1)),
                    },
                    anchor(),
                )?;
            }

            TaskRepository::list_for_employee(conn, &employee.id)
        })
        .expect("history");

    let months: std::collections::BTreeSet<String> = tasks
        .iter()
        .map(|task| task.created_at.format("%Y-%m").to_string())
        .collect();
    assert_eq!(months.len(), 5);

    let result = calculate_score(&tasks);
    assert_eq!(result.completed_tasks, 8);
    assert!((70..=100).contains(&result.score), "score {}", result.score);
}

#[test]
fn missing_stamps_take_the_supplied_instant() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("stamps.sqlite")).expect("db pool");
    let seed = seeded(&pool);
    let now = anchor() + Duration::days(2);

    let (pending, done) = pool
        .with_connection(|conn| {
            let base = NewTask {
                title: "Quarterly close".to_string(),
                description: None,
                deadline: anchor() + Duration::days(10),
                complexity: None,
                employee_id: seed.employees[1].id.clone(),
                organization_id: seed.organization.id.clone(),
                status: None,
                created_at: None,
                completed_at: None,
            };
            let pending = TaskRepository::insert(conn, &base, now)?;
            let done = TaskRepository::insert(
                conn,
                &NewTask {
                    status: Some(TaskStatus::Completed),
                    ..base
                },
                now,
            )?;
            Ok((pending, done))
        })
        .expect("insert tasks");

    assert_eq!(pending.created_at, now);
    assert_eq!(pending.updated_at, now);
    assert_eq!(pending.status, TaskStatus::Assigned);
    assert_eq!(pending.complexity, 1);
    assert_eq!(pending.completed_at, None);

    assert_eq!(done.created_at, now);
    assert_eq!(done.completed_at, Some(now));
}

#[test]
fn dashboard_for_unknown_organization_is_not_found() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("unknown-org.sqlite")).expect("db pool");
    seeded(&pool);

    let error = service(&pool, anchor())
        .organization_dashboard("no-such-organization")
        .expect_err("unknown organization");
    assert!(matches!(error, AppError::NotFound));
}
