// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Configuration module for uvrepin.
//!
//! Settings come from defaults, a `uvrepin.toml` file, the `[tool.uvrepin]`
//! table of the project, and finally the command line.

pub mod default;
mod loader;
mod schema;

pub use default::example_config;
pub use loader::{find_config_file_from, load_config, merge_configs, parse_config, tool_table};
pub use schema::*;
