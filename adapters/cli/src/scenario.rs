use std::{fs, path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;
use survey_core::{Agent, Heading, Pose, Route, RoutePlanner};
use survey_world::GridMap;

/// Mission description loaded from a TOML scenario file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    map: Vec<String>,
    route: String,
    agent: AgentSpec,
    #[serde(default)]
    replay: ReplaySettings,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct AgentSpec {
    row: i32,
    column: i32,
    heading: Heading,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReplaySettings {
    pace_ms: Option<u64>,
}

impl Scenario {
    /// Reads and parses the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse scenario at {}", path.display()))
    }

    /// Parses a scenario from TOML text.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("scenario is not valid TOML")
    }

    /// Builds the terrain grid described by the scenario.
    pub(crate) fn grid_map(&self) -> Result<GridMap> {
        GridMap::from_rows(&self.map).context("scenario map is malformed")
    }

    /// Agent placed at the scenario's start pose.
    pub(crate) fn agent(&self) -> Agent {
        Agent::new(Pose::new(
            self.agent.row,
            self.agent.column,
            self.agent.heading,
        ))
    }

    /// Planner replaying the route recorded in the scenario.
    pub(crate) fn planner(&self) -> Result<ScriptedPlanner> {
        let route: Route = self
            .route
            .parse()
            .context("scenario route is malformed")?;
        Ok(ScriptedPlanner { route })
    }

    /// Pause between animated frames requested by the scenario.
    pub(crate) fn pace(&self) -> Option<Duration> {
        self.replay.pace_ms.map(Duration::from_millis)
    }
}

/// Stand-in for the external planner that returns a precomputed route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ScriptedPlanner {
    route: Route,
}

impl RoutePlanner<Arc<GridMap>> for ScriptedPlanner {
    fn find_route(&self, _map: &Arc<GridMap>, _agent: &Agent) -> Route {
        self.route.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use survey_core::{MapQuery, Move};

    const SAMPLE: &str = r#"
map = ["....", ".#..", "...."]
route = "FFRF"

[agent]
row = 0
column = 0
heading = "south"

[replay]
pace_ms = 25
"#;

    #[test]
    fn parses_complete_scenario() {
        let scenario = Scenario::parse(SAMPLE).expect("scenario parses");

        let map = scenario.grid_map().expect("map parses");
        assert_eq!(map.row_count(), 3);
        assert_eq!(map.column_count(), 4);
        assert_eq!(
            scenario.agent(),
            Agent::new(Pose::new(0, 0, Heading::South))
        );
        assert_eq!(scenario.pace(), Some(Duration::from_millis(25)));

        let planner = scenario.planner().expect("route parses");
        let route = planner.find_route(&Arc::new(map), &scenario.agent());
        assert_eq!(
            route.moves(),
            &[Move::Forward, Move::Forward, Move::TurnRight, Move::Forward]
        );
    }

    #[test]
    fn replay_section_is_optional() {
        let scenario = Scenario::parse(
            r#"
map = [".."]
route = ""
agent = { row = 0, column = 1, heading = "west" }
"#,
        )
        .expect("scenario parses");

        assert_eq!(scenario.pace(), None);
    }

    #[test]
    fn malformed_route_is_reported() {
        let scenario = Scenario::parse(&SAMPLE.replace("FFRF", "FFQ")).expect("scenario parses");
        let error = scenario.planner().expect_err("Q is not a move");

        assert!(error.to_string().contains("route is malformed"));
    }

    #[test]
    fn unknown_heading_is_rejected() {
        let error = Scenario::parse(&SAMPLE.replace("\"south\"", "\"up\""))
            .expect_err("up is not a heading");

        assert!(error.to_string().contains("not valid TOML"));
    }

    #[test]
    fn loads_scenario_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write scenario");

        let scenario = Scenario::load(file.path()).expect("scenario loads");

        assert_eq!(scenario, Scenario::parse(SAMPLE).expect("scenario parses"));
    }

    #[test]
    fn missing_file_reports_path() {
        let directory = tempfile::tempdir().expect("temp dir");
        let path = directory.path().join("absent.toml");

        let error = Scenario::load(&path).expect_err("file does not exist");

        assert!(error.to_string().contains("absent.toml"));
    }
}
