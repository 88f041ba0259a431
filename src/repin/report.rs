// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! Rendering a plan for dry runs.

use crate::error::{Result, ResultExt};
use crate::project::DependencyLocation;
use serde::Serialize;
use std::fmt::Write as _;

use super::plan::RepinPlan;

const GROUP_WIDTH: usize = 12;
const PACKAGE_WIDTH: usize = 38;
const FROM_WIDTH: usize = 18;
const RULE_WIDTH: usize = 86;

#[derive(Debug, Serialize)]
struct JsonEntry<'a> {
    group: &'a str,
    kind: &'static str,
    package: String,
    from: &'a str,
    to: &'a str,
    spec: String,
}

fn kind(location: &DependencyLocation) -> &'static str {
    match location {
        DependencyLocation::Main => "main",
        DependencyLocation::Optional(_) => "optional",
        DependencyLocation::Group(_) => "group",
    }
}

/// The dry-run table.
pub fn render_table(plan: &RepinPlan) -> String {
    let mut out = String::from("\nDry run — would update these direct dependencies:\n\n");
    let _ = writeln!(
        out,
        "{:<gw$} {:<pw$} {:<fw$} {}",
        "GROUP",
        "PACKAGE",
        "FROM",
        "TO",
        gw = GROUP_WIDTH,
        pw = PACKAGE_WIDTH,
        fw = FROM_WIDTH
    );
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    for entry in plan.entries() {
        let _ = writeln!(
            out,
            "{:<gw$} {:<pw$} {:<fw$} {}",
            entry.location.name(),
            entry.requirement.label(),
            entry.from,
            entry.to,
            gw = GROUP_WIDTH,
            pw = PACKAGE_WIDTH,
            fw = FROM_WIDTH
        );
    }

    out.push_str("\n(No files changed.)\n");
    out
}

/// The plan as a JSON array.
pub fn render_json(plan: &RepinPlan) -> Result<String> {
    let entries: Vec<JsonEntry> = plan
        .entries()
        .iter()
        .map(|e| JsonEntry {
            group: e.location.name(),
            kind: kind(&e.location),
            package: e.requirement.label(),
            from: &e.from,
            to: &e.to,
            spec: e.new_spec(),
        })
        .collect();
    serde_json::to_string_pretty(&entries).context("Failed to serialize plan")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LatestVersions;
    use crate::project::PyProject;
    use std::path::PathBuf;

    fn plan() -> RepinPlan {
        let groups = PyProject::parse(
            PathBuf::from("pyproject.toml"),
            r#"
[project]
dependencies = ["fastapi[uvicorn]==0.95.2"]

[dependency-groups]
test = ["pytest==7.4.0; python_version >= '3.8'"]
"#,
        )
        .unwrap()
        .direct_dependencies();
        let latest = LatestVersions::from([
            ("fastapi".to_string(), "0.111.0".to_string()),
            ("pytest".to_string(), "8.2.0".to_string()),
        ]);
        RepinPlan::build(&groups, &latest)
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&plan());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[1], "Dry run — would update these direct dependencies:");
        assert!(lines[3].starts_with("GROUP        PACKAGE"));
        assert_eq!(lines[3].find("FROM"), Some(52));
        assert_eq!(lines[3].find("TO"), Some(71));
        assert_eq!(lines[4], "-".repeat(86));
        assert!(lines[5].starts_with("main         fastapi[uvicorn] "));
        assert!(lines[5].ends_with("0.95.2             0.111.0"));
        assert!(lines[6].starts_with("test         pytest; python_version >= '3.8'"));
        assert_eq!(lines[8], "(No files changed.)");
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&plan()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let items = value.as_array().unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["group"], "main");
        assert_eq!(items[0]["kind"], "main");
        assert_eq!(items[0]["package"], "fastapi[uvicorn]");
        assert_eq!(items[0]["spec"], "fastapi[uvicorn]==0.111.0");
        assert_eq!(items[1]["kind"], "group");
        assert_eq!(items[1]["from"], "7.4.0");
    }
}
