pub mod assignment;
pub mod dashboard;
pub mod employee;
pub mod insight;
pub mod productivity;
pub mod task;
pub mod trend;
