pub mod logger;
pub mod rounding;
