use chrono::{DateTime, Duration, Months, Utc};
use rusqlite::Connection;
use tracing::info;

use crate::db::repositories::{EmployeeRepository, OrganizationRepository, TaskRepository};
use crate::error::{AppError, AppResult};
use crate::models::employee::{EmployeeRecord, NewEmployee, NewOrganization, OrganizationRecord};
use crate::models::task::{NewTask, TaskStatus};

struct DemoEmployee {
    name: &'static str,
    email: &'static str,
    role: &'static str,
    department: &'static str,
    skills: [&'static str; 4],
    ai_score: i64,
}

/// Offsets are relative to the seed instant: `months_ago` calendar months
/// back, then `extra_days` forward.
struct DemoTask {
    employee: usize,
    title: &'static str,
    description: &'static str,
    complexity: i64,
    months_ago: u32,
    extra_days: i64,
    deadline_days: i64,
    status: TaskStatus,
}

const DEMO_EMPLOYEES: [DemoEmployee; 5] = [
    DemoEmployee {
        name: "Alice Johnson",
        email: "alice@acmetech.com",
        role: "Senior Frontend Developer",
        department: "Engineering",
        skills: ["React", "TypeScript", "CSS", "Figma"],
        ai_score: 78,
    },
    DemoEmployee {
        name: "Bob Smith",
        email: "bob@acmetech.com",
        role: "Backend Engineer",
        department: "Engineering",
        skills: ["Node.js", "PostgreSQL", "Docker", "Redis"],
        ai_score: 65,
    },
    DemoEmployee {
        name: "Carol Davis",
        email: "carol@acmetech.com",
        role: "Product Manager",
        department: "Product",
        skills: ["Roadmapping", "User Research", "Agile", "SQL"],
        ai_score: 55,
    },
    DemoEmployee {
        name: "David Lee",
        email: "david@acmetech.com",
        role: "DevOps Engineer",
        department: "Infrastructure",
        skills: ["AWS", "Terraform", "Kubernetes", "CI/CD"],
        ai_score: 72,
    },
    DemoEmployee {
        name: "Eva Martinez",
        email: "eva@acmetech.com",
        role: "Data Analyst",
        department: "Analytics",
        skills: ["Python", "SQL", "Tableau", "Statistics"],
        ai_score: 60,
    },
];

const ALICE: usize = 0;
const BOB: usize = 1;
const CAROL: usize = 2;
const DAVID: usize = 3;
const EVA: usize = 4;

macro_rules! demo_task {
    ($employee:expr, $title:literal, $description:literal, $complexity:literal, ($months:literal, $days:literal), $deadline:literal, $status:ident) => {
        DemoTask {
            employee: $employee,
            title: $title,
            description: $description,
            complexity: $complexity,
            months_ago: $months,
            extra_days: $days,
            deadline_days: $deadline,
            status: TaskStatus::$status,
        }
    };
}

const DEMO_TASKS: [DemoTask; 35] = [
    demo_task!(ALICE, "Design System Audit", "Audit existing components for consistency", 3, (5, 0), 14, Completed),
    demo_task!(ALICE, "Storybook Setup", "Add Storybook for component docs", 2, (5, 5), 7, Completed),
    demo_task!(ALICE, "Accessibility Audit", "Fix WCAG AA violations on dashboard", 3, (4, 0), 10, Completed),
    demo_task!(ALICE, "Dark Mode Implementation", "Implement full dark mode support", 4, (4, 8), 12, Completed),
    demo_task!(ALICE, "Performance Profiling", "Identify and fix React render bottlenecks", 4, (3, 2), 10, Completed),
    demo_task!(ALICE, "Micro-Frontend Spike", "POC module federation for team autonomy", 5, (2, 0), 14, Completed),
    demo_task!(ALICE, "Redesign Landing Page", "Modernize the company landing page with new branding", 3, (1, 0), 7, Completed),
    demo_task!(ALICE, "Mobile Responsive Fix", "Fix broken layouts on tablet and mobile breakpoints", 2, (0, -3), 5, Assigned),
    demo_task!(BOB, "Auth Service Refactor", "Extract auth into standalone microservice", 4, (5, 2), 14, Completed),
    demo_task!(BOB, "Rate Limiting Middleware", "Add Redis-based rate limiting to API", 3, (5, 10), 7, Completed),
    demo_task!(BOB, "Database Schema Migration", "Add audit log table and backfill", 4, (4, 1), 10, Completed),
    demo_task!(BOB, "Implement Search API", "Build full-text search endpoint for products", 4, (3, 0), 10, Completed),
    demo_task!(BOB, "Database Query Optimization", "Optimize slow queries identified in APM", 5, (3, 8), 7, Completed),
    demo_task!(BOB, "Background Job Queue", "Implement BullMQ job queue for email sending", 4, (2, 3), 12, Completed),
    demo_task!(BOB, "gRPC Internal Service", "Replace REST with gRPC for internal communication", 5, (1, 0), 14, Completed),
    demo_task!(BOB, "API Gateway Config", "Configure Kong API gateway for new services", 3, (0, -2), 10, InProgress),
    demo_task!(CAROL, "Q3 Roadmap Planning", "Plan Q3 product roadmap with stakeholders", 3, (5, 0), 7, Completed),
    demo_task!(CAROL, "User Interview Sessions", "Conduct 8 user interviews for new feature", 3, (5, 7), 10, Completed),
    demo_task!(CAROL, "Competitive Analysis", "Analysis of 5 competitor products", 3, (4, 0), 10, Completed),
    demo_task!(CAROL, "Sprint Retrospective", "Facilitate sprint retro and write action items", 2, (4, 10), 3, Completed),
    demo_task!(CAROL, "Feature Spec Writing", "Write PRD for new onboarding flow", 3, (3, 0), 10, Completed),
    demo_task!(CAROL, "A/B Test Design", "Design experiment for checkout flow", 4, (2, 0), 12, Completed),
    demo_task!(CAROL, "User Journey Mapping", "Map the onboarding funnel and identify drop-off points", 2, (1, 0), 7, Completed),
    demo_task!(CAROL, "Feature Prioritization Workshop", "Facilitate sprint planning with stakeholders", 2, (0, -1), 5, Assigned),
    demo_task!(DAVID, "AWS Cost Audit", "Identify and eliminate unused AWS resources", 3, (5, 1), 10, Completed),
    demo_task!(DAVID, "Docker Base Images", "Standardize Docker base images across services", 2, (5, 8), 7, Completed),
    demo_task!(DAVID, "Log Aggregation Setup", "Deploy ELK stack for centralized logging", 4, (4, 2), 12, Completed),
    demo_task!(DAVID, "Secrets Management", "Migrate secrets to AWS Secrets Manager", 4, (3, 0), 10, Completed),
    demo_task!(DAVID, "Zero-Downtime Deployment", "Implement blue-green deployment strategy", 5, (3, 7), 14, Completed),
    demo_task!(DAVID, "Set Up Monitoring Stack", "Deploy Grafana + Prometheus for production monitoring", 5, (2, 0), 14, Completed),
    demo_task!(DAVID, "CI/CD Pipeline Refactor", "Migrate Jenkins pipelines to GitHub Actions", 4, (1, 0), 12, Completed),
    demo_task!(DAVID, "K8s Cluster Upgrade", "Upgrade EKS cluster to latest stable version", 5, (0, -2), 14, InProgress),
    demo_task!(EVA, "Quarterly Sales Report", "Analyze Q4 sales metrics and create dashboard", 3, (1, 0), 7, Completed),
    demo_task!(EVA, "Churn Cohort Analysis", "Identify churn patterns in last 6 months", 4, (0, -5), 10, InProgress),
    demo_task!(EVA, "Customer Churn Analysis", "Build predictive model for customer retention", 5, (0, 0), 21, Assigned),
];

#[derive(Debug, Clone)]
pub struct DemoSeed {
    pub organization: OrganizationRecord,
    /// Alice, Bob, Carol, David and Eva, in that order.
    pub employees: Vec<EmployeeRecord>,
    pub task_count: usize,
}

/// Replace all stored data with the "Acme Technologies" demo organization:
/// five employees and a five-month task history anchored at `now`.
///
/// Completed tasks finish one day before their deadline.
pub fn seed_demo_organization(conn: &Connection, now: DateTime<Utc>) -> AppResult<DemoSeed> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch("DELETE FROM tasks; DELETE FROM employees; DELETE FROM organizations;")?;

    let organization = OrganizationRepository::insert(
        &tx,
        &NewOrganization {
            name: "Acme Technologies".to_string(),
            email: "admin@acmetech.com".to_string(),
        },
    )?;

    let employees = DEMO_EMPLOYEES
        .iter()
        .map(|demo| {
            EmployeeRepository::insert(
                &tx,
                &NewEmployee {
                    organization_id: organization.id.clone(),
                    name: demo.name.to_string(),
                    email: demo.email.to_string(),
                    role: demo.role.to_string(),
                    department: demo.department.to_string(),
                    skills: demo.skills.iter().map(|skill| skill.to_string()).collect(),
                    wallet_address: None,
                    ai_score: Some(demo.ai_score),
                },
            )
        })
        .collect::<AppResult<Vec<_>>>()?;

    for demo in &DEMO_TASKS {
        let created_at = months_ago(now, demo.months_ago)? + Duration::days(demo.extra_days);
        let deadline = created_at + Duration::days(demo.deadline_days);
        let completed_at = match demo.status {
            TaskStatus::Completed => Some(deadline - Duration::days(1)),
            _ => None,
        };

        TaskRepository::insert(
            &tx,
            &NewTask {
                title: demo.title.to_string(),
                description: Some(demo.description.to_string()),
                deadline,
                complexity: Some(demo.complexity),
                employee_id: employees[demo.employee].id.clone(),
                organization_id: organization.id.clone(),
                status: Some(demo.status),
                created_at: Some(created_at),
                completed_at,
            },
            now,
        )?;
    }

    tx.commit()?;

    info!(
        target: "app::db",
        organization_id = %organization.id,
        employees = employees.len(),
        tasks = DEMO_TASKS.len(),
        "seeded demo organization"
    );

    Ok(DemoSeed {
        organization,
        employees,
        task_count: DEMO_TASKS.len(),
    })
}

/// Same day-of-month `months` calendar months back, clamped to the end of
/// shorter months.
fn months_ago(now: DateTime<Utc>, months: u32) -> AppResult<DateTime<Utc>> {
    now.checked_sub_months(Months::new(months))
        .ok_or_else(|| AppError::other(format!("cannot step {months} months back from {now}")))
}
