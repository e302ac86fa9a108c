pub mod executor;
pub mod parser;
pub mod planner;

pub use executor::{QueryEvaluator, QueryResult};
pub use parser::{Pattern, PatternKind, WildcardQuery, parse_query, parse_query_with_params};
pub use planner::{PlanStep, QueryPlan, StepSource};
