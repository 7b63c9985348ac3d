//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_build_json, format_build_text, format_check_json, format_check_text,
    format_section_heading, format_styles_text, ProgressRenderer,
};
pub use route::RunContext;
