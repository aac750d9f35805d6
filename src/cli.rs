//! CLI domain: parse, route, output and presentation only.
//! Orchestration lives in the pipeline and delivery modules; the route table
//! wires them together per command.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_check_report, format_prompts_text, format_run_summary, CheckReport,
};
pub use route::RunContext;
