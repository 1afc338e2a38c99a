pub mod binder;
pub mod error;
pub mod expression;
pub mod logical_plan;
pub mod parser;
