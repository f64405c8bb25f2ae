use std::sync::Arc;

use survey_core::{
    Agent, CellCoord, Heading, MissionError, MissionField, PlacementFault, Pose, Route,
    RoutePlanner,
};
use survey_system_mission::{CommitOutcome, MissionManager, MissionState, Navigation};
use survey_system_replay::trajectory;
use survey_world::GridMap;

#[derive(Clone, Debug, PartialEq, Eq)]
struct ScriptedPlanner {
    route: Route,
}

impl ScriptedPlanner {
    fn new(notation: &str) -> Self {
        Self {
            route: route(notation),
        }
    }
}

impl RoutePlanner<Arc<GridMap>> for ScriptedPlanner {
    fn find_route(&self, _map: &Arc<GridMap>, _agent: &Agent) -> Route {
        self.route.clone()
    }
}

type Manager = MissionManager<Arc<GridMap>, ScriptedPlanner>;

fn route(notation: &str) -> Route {
    notation.parse().expect("valid route notation")
}

fn open_map(rows: u32, columns: u32) -> Arc<GridMap> {
    Arc::new(GridMap::open(rows, columns))
}

fn agent_at(row: i32, column: i32, heading: Heading) -> Agent {
    Agent::new(Pose::new(row, column, heading))
}

fn complete_manager(notation: &str) -> Manager {
    let mut manager = Manager::new();
    manager.set_map(open_map(6, 6));
    manager
        .set_agent(agent_at(1, 1, Heading::East))
        .expect("agent fits the map");
    manager
        .set_router(ScriptedPlanner::new(notation))
        .expect("router accepted");
    let _ = manager.run_planner().expect("planner runs");
    manager
}

#[test]
fn fresh_manager_has_nothing_loaded() {
    let manager = Manager::default();

    assert!(manager.map().is_none());
    assert!(manager.agent().is_none());
    assert!(manager.router().is_none());
    assert!(manager.route().is_none());
    assert_eq!(manager.state().missing(), Some(MissionField::Map));
    assert_eq!(manager.history_len(), 0);
    assert_eq!(manager.current_index(), None);
}

#[test]
fn set_map_clears_every_downstream_field() {
    let mut manager = complete_manager("FF");
    assert!(manager.state().is_complete());

    manager.set_map(open_map(4, 4));

    assert!(manager.map().is_some());
    assert!(manager.agent().is_none());
    assert!(manager.router().is_none());
    assert!(manager.route().is_none());
}

#[test]
fn set_agent_clears_router_and_route() {
    let mut manager = complete_manager("FF");

    manager
        .set_agent(agent_at(2, 2, Heading::North))
        .expect("agent fits the map");

    assert_eq!(manager.agent(), Some(&agent_at(2, 2, Heading::North)));
    assert!(manager.router().is_none());
    assert!(manager.route().is_none());
    assert!(manager.map().is_some());
}

#[test]
fn set_router_clears_route_only() {
    let mut manager = complete_manager("FF");

    manager
        .set_router(ScriptedPlanner::new("R"))
        .expect("router accepted");

    assert!(manager.route().is_none());
    assert!(manager.agent().is_some());
    assert!(manager.map().is_some());
}

#[test]
fn set_route_is_a_leaf() {
    let mut manager = complete_manager("FF");
    let replacement = route("LF");

    manager
        .set_route(replacement.clone())
        .expect("router is configured");

    assert_eq!(manager.route(), Some(&replacement));
    assert_eq!(manager.router(), Some(&ScriptedPlanner::new("FF")));
}

#[test]
fn set_agent_without_map_is_a_precondition_failure() {
    let mut manager = Manager::new();

    let error = manager
        .set_agent(agent_at(0, 0, Heading::North))
        .expect_err("no map loaded");

    assert_eq!(
        error,
        MissionError::Precondition {
            operation: "set agent",
            missing: MissionField::Map,
        }
    );
    assert_eq!(error.to_string(), "cannot set agent: no map loaded");
    assert!(manager.agent().is_none());
}

#[test]
fn set_router_requires_map_and_agent() {
    let mut manager = Manager::new();
    let error = manager
        .set_router(ScriptedPlanner::new("F"))
        .expect_err("no map loaded");
    assert!(matches!(
        error,
        MissionError::Precondition {
            missing: MissionField::Map,
            ..
        }
    ));

    manager.set_map(open_map(3, 3));
    let error = manager
        .set_router(ScriptedPlanner::new("F"))
        .expect_err("no agent placed");
    assert!(matches!(
        error,
        MissionError::Precondition {
            missing: MissionField::Agent,
            ..
        }
    ));
    assert!(manager.router().is_none());
}

#[test]
fn set_route_requires_router() {
    let mut manager = Manager::new();
    manager.set_map(open_map(3, 3));
    manager
        .set_agent(agent_at(0, 0, Heading::South))
        .expect("agent fits");

    let error = manager
        .set_route(Route::default())
        .expect_err("no router configured");

    assert!(matches!(
        error,
        MissionError::Precondition {
            missing: MissionField::Router,
            ..
        }
    ));
    assert!(manager.route().is_none());
}

#[test]
fn agent_outside_map_is_rejected_and_field_stays_empty() {
    let mut manager = Manager::new();
    manager.set_map(open_map(4, 5));

    for (row, column) in [(4, 0), (0, 5), (-1, 2), (2, -1)] {
        let error = manager
            .set_agent(agent_at(row, column, Heading::North))
            .expect_err("placement outside bounds");
        assert_eq!(
            error,
            MissionError::InvalidPlacement {
                cell: CellCoord::new(row, column),
                reason: PlacementFault::OutOfBounds,
            }
        );
        assert!(manager.agent().is_none());
    }
}

#[test]
fn agent_on_blocked_cell_is_rejected_and_previous_mission_survives() {
    let mut grid = GridMap::open(4, 4);
    grid.set_traversable(CellCoord::new(3, 3), false);
    let mut manager = Manager::new();
    manager.set_map(Arc::new(grid));
    manager
        .set_agent(agent_at(0, 0, Heading::East))
        .expect("open cell");
    manager
        .set_router(ScriptedPlanner::new("FF"))
        .expect("router accepted");
    let _ = manager.run_planner().expect("planner runs");
    let before = manager.state().clone();

    let error = manager
        .set_agent(agent_at(3, 3, Heading::North))
        .expect_err("blocked cell");

    assert_eq!(
        error,
        MissionError::InvalidPlacement {
            cell: CellCoord::new(3, 3),
            reason: PlacementFault::NotTraversable,
        }
    );
    assert_eq!(manager.state(), &before, "failed placement must not cascade");
}

#[test]
fn clear_operations_cascade_downstream() {
    let mut manager = complete_manager("FF");
    manager.clear_router();
    assert!(manager.router().is_none());
    assert!(manager.route().is_none());
    assert!(manager.agent().is_some());

    let mut manager = complete_manager("FF");
    manager.clear_agent();
    assert!(manager.agent().is_none());
    assert!(manager.router().is_none());
    assert!(manager.map().is_some());

    let mut manager = complete_manager("FF");
    manager.clear_map();
    assert_eq!(manager.state(), &MissionState::empty());

    let mut manager = complete_manager("FF");
    manager.clear_route();
    assert!(manager.route().is_none());
    assert!(manager.router().is_some());
}

#[test]
fn run_planner_stores_route_from_router() {
    let mut manager = complete_manager("FRF");

    let expected = route("FRF");
    assert_eq!(manager.route(), Some(&expected));
    assert!(manager.state().is_complete());

    manager.clear_router();
    let error = manager.run_planner().expect_err("router cleared");
    assert!(matches!(
        error,
        MissionError::Precondition {
            missing: MissionField::Router,
            ..
        }
    ));
}

#[test]
fn commit_twice_appends_once() {
    let mut manager = complete_manager("FF");

    assert_eq!(manager.commit(), CommitOutcome::Appended { index: 0 });
    assert_eq!(manager.commit(), CommitOutcome::AlreadyRecorded { index: 0 });
    assert_eq!(manager.history_len(), 1);
    assert_eq!(manager.current_index(), Some(0));
}

#[test]
fn commit_refuses_incomplete_mission() {
    let mut manager = Manager::new();
    manager.set_map(open_map(3, 3));
    manager
        .set_agent(agent_at(1, 1, Heading::North))
        .expect("agent fits");

    assert_eq!(
        manager.commit(),
        CommitOutcome::Incomplete {
            missing: MissionField::Router
        }
    );
    assert_eq!(manager.history_len(), 0);
}

#[test]
fn navigation_is_clamped_at_both_ends() {
    let mut manager = complete_manager("F");
    assert_eq!(manager.go_previous(), Navigation::AtBoundary);
    assert_eq!(manager.go_next(), Navigation::AtBoundary);

    let _ = manager.commit();
    manager
        .set_route(route("FF"))
        .expect("router configured");
    let _ = manager.commit();
    manager
        .set_route(route("FFF"))
        .expect("router configured");
    assert_eq!(manager.commit(), CommitOutcome::Appended { index: 2 });

    assert!(!manager.can_go_next());
    assert_eq!(manager.go_next(), Navigation::AtBoundary);
    assert_eq!(manager.current_index(), Some(2));

    assert_eq!(manager.go_previous(), Navigation::Moved { index: 1 });
    assert_eq!(manager.go_previous(), Navigation::Moved { index: 0 });
    assert!(!manager.can_go_previous());
    assert_eq!(manager.go_previous(), Navigation::AtBoundary);
    assert_eq!(manager.current_index(), Some(0));
    assert_eq!(manager.route(), Some(&route("F")));

    assert_eq!(manager.go_next(), Navigation::Moved { index: 1 });
    assert_eq!(manager.route(), Some(&route("FF")));
}

#[test]
fn navigation_restores_state_without_mutating_history() {
    let mut manager = complete_manager("FF");
    let _ = manager.commit();
    let first = manager.state().clone();

    manager.set_map(open_map(8, 8));
    manager
        .set_agent(agent_at(4, 4, Heading::West))
        .expect("agent fits");
    manager
        .set_router(ScriptedPlanner::new("FL"))
        .expect("router accepted");
    let _ = manager.run_planner().expect("planner runs");
    let _ = manager.commit();

    let history_before = manager.history().clone();
    assert_eq!(manager.current_index(), Some(1));
    assert_eq!(manager.go_previous(), Navigation::Moved { index: 0 });

    assert_eq!(manager.state(), &first);
    assert_eq!(manager.current_index(), Some(0));
    assert_eq!(manager.history_len(), history_before.len());
    assert!(
        manager.history().iter().eq(history_before.iter()),
        "navigation must leave committed entries untouched"
    );

    let inputs = manager.state().replay_inputs().expect("complete mission");
    let steps = trajectory(inputs.start, inputs.route, inputs.map).expect("route fits the map");
    assert_eq!(steps.len(), 2);
    assert_eq!(
        steps[1].pose_after,
        Pose::new(1, 3, Heading::East),
        "replay reflects the restored mission"
    );
}

#[test]
fn recommitting_a_restored_state_points_cursor_at_existing_entry() {
    let mut manager = complete_manager("F");
    let _ = manager.commit();
    manager
        .set_route(route("FF"))
        .expect("router configured");
    let _ = manager.commit();

    assert_eq!(manager.go_previous(), Navigation::Moved { index: 0 });
    assert_eq!(manager.commit(), CommitOutcome::AlreadyRecorded { index: 0 });
    assert_eq!(manager.history_len(), 2);
}

#[test]
fn cascade_invariant_holds_after_every_mutation() {
    let mut manager = Manager::new();
    let check = |manager: &Manager| {
        let state = manager.state();
        if state.map().is_none() {
            assert!(state.agent().is_none());
        }
        if state.agent().is_none() {
            assert!(state.router().is_none());
        }
        if state.router().is_none() {
            assert!(state.route().is_none());
        }
    };

    manager.set_map(open_map(5, 5));
    check(&manager);
    let _ = manager.set_agent(agent_at(9, 9, Heading::North));
    check(&manager);
    let _ = manager.set_router(ScriptedPlanner::new("F"));
    check(&manager);
    manager
        .set_agent(agent_at(2, 2, Heading::North))
        .expect("agent fits");
    manager
        .set_router(ScriptedPlanner::new("F"))
        .expect("router accepted");
    let _ = manager.run_planner();
    check(&manager);
    manager.clear_agent();
    check(&manager);
    let _ = manager.set_route(Route::default());
    check(&manager);
    manager.clear_map();
    check(&manager);
}
