//! Integration tests for the loci memory palace generator

mod cli_routes;
mod config_loading;
mod palace_pipeline;
mod test_utils;
