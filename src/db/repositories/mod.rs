pub mod employee_repository;
pub mod organization_repository;
pub mod task_repository;

pub use employee_repository::EmployeeRepository;
pub use organization_repository::OrganizationRepository;
pub use task_repository::{TaskRepository, TaskStatusCounts};
