// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Default configuration values.

/// Generate an example configuration file.
pub fn example_config() -> &'static str {
    r#"# uvrepin configuration
#
# The same keys may also live under [tool.uvrepin] in pyproject.toml.

# Extra index URLs passed to `uv add --index`
indexes = []

# Allow pre-releases as upgrade targets
pre = false

# Only repin these groups ("main" is [project.dependencies]); empty means all
only_groups = []

# How to pick a version when workspace members disagree: "latest" or "max"
policy = "latest"

# Where latest versions come from: "pypi" or "environment"
source = "pypi"

# PyPI JSON API base URL
pypi_url = "https://pypi.org"

# Concurrent index lookups and per-request timeout
concurrency = 10
timeout_secs = 15

# uv executable
uv = "uv"

# Align workspace members without asking
auto_accept = false
"#
}
