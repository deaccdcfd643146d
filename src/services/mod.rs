pub mod assignment_ranker;
pub mod insight_generator;
pub mod scoring_engine;
pub mod trend_predictor;
pub mod workforce_service;
