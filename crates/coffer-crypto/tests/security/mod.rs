mod entropy_quality;
mod error_classification;
mod masking;
mod seeding;
mod tamper_detection;
