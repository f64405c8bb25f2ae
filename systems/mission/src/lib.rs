#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Mission state manager with cascading invalidation and navigable history.
//!
//! A mission is the chain map < agent < router < route. Every setter and
//! teardown clears the fields downstream of the one it touches, and every
//! failed operation leaves the live state exactly as it was. Complete states
//! can be committed into an append-only [`History`]; stepping through it
//! replaces the live state with the selected entry.

mod history;

use survey_core::{
    Agent, MapQuery, MissionError, MissionField, PlacementFault, Pose, Route, RoutePlanner,
};

pub use history::History;

/// Map, agent, router and route selected for a mission.
///
/// Fields are only ever populated top-down; a downstream field is never set
/// while an upstream one is empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MissionState<M, R> {
    map: Option<M>,
    agent: Option<Agent>,
    router: Option<R>,
    route: Option<Route>,
}

impl<M, R> MissionState<M, R> {
    /// Creates a mission state with every field unset.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            map: None,
            agent: None,
            router: None,
            route: None,
        }
    }

    /// Creates a mission state with every field populated.
    #[must_use]
    pub const fn complete(map: M, agent: Agent, router: R, route: Route) -> Self {
        Self {
            map: Some(map),
            agent: Some(agent),
            router: Some(router),
            route: Some(route),
        }
    }

    /// Map the mission operates on.
    #[must_use]
    pub const fn map(&self) -> Option<&M> {
        self.map.as_ref()
    }

    /// Agent placed on the map.
    #[must_use]
    pub const fn agent(&self) -> Option<&Agent> {
        self.agent.as_ref()
    }

    /// Planner configured for the agent.
    #[must_use]
    pub const fn router(&self) -> Option<&R> {
        self.router.as_ref()
    }

    /// Route produced by the planner.
    #[must_use]
    pub const fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// First unset field in dependency order, if any.
    #[must_use]
    pub const fn missing(&self) -> Option<MissionField> {
        if self.map.is_none() {
            Some(MissionField::Map)
        } else if self.agent.is_none() {
            Some(MissionField::Agent)
        } else if self.router.is_none() {
            Some(MissionField::Router)
        } else if self.route.is_none() {
            Some(MissionField::Route)
        } else {
            None
        }
    }

    /// Reports whether every field is populated.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.missing().is_none()
    }

    /// Inputs required to replay the mission, available once it is complete.
    #[must_use]
    pub fn replay_inputs(&self) -> Option<ReplayInputs<'_, M>> {
        match (&self.map, &self.agent, &self.route) {
            (Some(map), Some(agent), Some(route)) if self.router.is_some() => Some(ReplayInputs {
                map,
                start: agent.start(),
                route,
            }),
            _ => None,
        }
    }

    /// Clears every field strictly downstream of `field`, returning those that held a value.
    fn invalidate_after(&mut self, field: MissionField) -> Vec<MissionField> {
        let mut cleared = Vec::new();
        if field < MissionField::Agent && self.agent.take().is_some() {
            cleared.push(MissionField::Agent);
        }
        if field < MissionField::Router && self.router.take().is_some() {
            cleared.push(MissionField::Router);
        }
        if field < MissionField::Route && self.route.take().is_some() {
            cleared.push(MissionField::Route);
        }
        cleared
    }
}

impl<M, R> Default for MissionState<M, R> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Snapshot of the values the replay engine consumes.
#[derive(Clone, Copy, Debug)]
pub struct ReplayInputs<'a, M> {
    /// Map the route was planned against.
    pub map: &'a M,
    /// Pose the agent starts from.
    pub start: Pose,
    /// Route to replay.
    pub route: &'a Route,
}

/// Result of a [`MissionManager::commit`] request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The live state was appended at `index`.
    Appended {
        /// Index of the new history entry.
        index: usize,
    },
    /// An equal state was already recorded at `index`; the cursor now points at it.
    AlreadyRecorded {
        /// Index of the existing history entry.
        index: usize,
    },
    /// The live state is missing a field, so nothing was recorded.
    Incomplete {
        /// First unset field in dependency order.
        missing: MissionField,
    },
}

/// Result of a history navigation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    /// The cursor moved and the live state now mirrors the entry at `index`.
    Moved {
        /// Index the cursor points at after the move.
        index: usize,
    },
    /// The cursor already sat on the boundary; nothing changed.
    AtBoundary,
}

/// Sole owner of the live mission state and its committed history.
#[derive(Clone, Debug)]
pub struct MissionManager<M, R> {
    live: MissionState<M, R>,
    history: History<M, R>,
}

impl<M, R> MissionManager<M, R>
where
    M: MapQuery + Clone + PartialEq,
    R: Clone + PartialEq,
{
    /// Creates a manager with an empty mission and no history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            live: MissionState::empty(),
            history: History::new(),
        }
    }

    /// Live mission state.
    #[must_use]
    pub const fn state(&self) -> &MissionState<M, R> {
        &self.live
    }

    /// Committed history.
    #[must_use]
    pub const fn history(&self) -> &History<M, R> {
        &self.history
    }

    /// Current map, if loaded.
    #[must_use]
    pub const fn map(&self) -> Option<&M> {
        self.live.map()
    }

    /// Current agent, if placed.
    #[must_use]
    pub const fn agent(&self) -> Option<&Agent> {
        self.live.agent()
    }

    /// Current router, if configured.
    #[must_use]
    pub const fn router(&self) -> Option<&R> {
        self.live.router()
    }

    /// Current route, if planned.
    #[must_use]
    pub const fn route(&self) -> Option<&Route> {
        self.live.route()
    }

    /// Replaces the map and clears the agent, router and route.
    pub fn set_map(&mut self, map: M) {
        self.cascade(MissionField::Map);
        self.live.map = Some(map);
        tracing::debug!("map replaced");
    }

    /// Places a new agent and clears the router and route.
    ///
    /// Fails without touching any field when no map is loaded or the start
    /// cell is outside the map or blocked.
    pub fn set_agent(&mut self, agent: Agent) -> Result<(), MissionError> {
        let map = self.live.map.as_ref().ok_or(MissionError::Precondition {
            operation: "set agent",
            missing: MissionField::Map,
        })?;

        let cell = agent.start().cell();
        let fault = if !map.is_within_bounds(cell) {
            Some(PlacementFault::OutOfBounds)
        } else if !map.is_traversable(cell) {
            Some(PlacementFault::NotTraversable)
        } else {
            None
        };
        if let Some(reason) = fault {
            tracing::debug!(%cell, %reason, "agent placement rejected");
            return Err(MissionError::InvalidPlacement { cell, reason });
        }

        self.cascade(MissionField::Agent);
        self.live.agent = Some(agent);
        tracing::debug!(start = %agent.start(), "agent placed");
        Ok(())
    }

    /// Configures a new router and clears the route.
    pub fn set_router(&mut self, router: R) -> Result<(), MissionError> {
        self.require("set router", MissionField::Map)?;
        self.require("set router", MissionField::Agent)?;

        self.cascade(MissionField::Router);
        self.live.router = Some(router);
        tracing::debug!("router configured");
        Ok(())
    }

    /// Stores the route produced by the configured router.
    pub fn set_route(&mut self, route: Route) -> Result<(), MissionError> {
        self.require("set route", MissionField::Router)?;

        tracing::debug!(moves = route.len(), "route stored");
        self.live.route = Some(route);
        Ok(())
    }

    /// Asks the configured router for a route and stores it.
    pub fn run_planner(&mut self) -> Result<&Route, MissionError>
    where
        R: RoutePlanner<M>,
    {
        let (Some(map), Some(agent), Some(router)) =
            (&self.live.map, &self.live.agent, &self.live.router)
        else {
            return Err(MissionError::Precondition {
                operation: "run planner",
                missing: self.live.missing().unwrap_or(MissionField::Router),
            });
        };

        let route = router.find_route(map, agent);
        tracing::debug!(moves = route.len(), "planner produced route");
        Ok(&*self.live.route.insert(route))
    }

    /// Removes the map together with every downstream field.
    pub fn clear_map(&mut self) {
        self.cascade(MissionField::Map);
        if self.live.map.take().is_some() {
            tracing::debug!("map cleared");
        }
    }

    /// Removes the agent together with the router and route.
    pub fn clear_agent(&mut self) {
        self.cascade(MissionField::Agent);
        if self.live.agent.take().is_some() {
            tracing::debug!("agent cleared");
        }
    }

    /// Removes the router together with the route.
    pub fn clear_router(&mut self) {
        self.cascade(MissionField::Router);
        if self.live.router.take().is_some() {
            tracing::debug!("router cleared");
        }
    }

    /// Removes the route.
    pub fn clear_route(&mut self) {
        if self.live.route.take().is_some() {
            tracing::debug!("route cleared");
        }
    }

    /// Records the live state in history if it is complete and not yet recorded.
    pub fn commit(&mut self) -> CommitOutcome {
        if let Some(missing) = self.live.missing() {
            tracing::warn!(%missing, "refusing to commit an incomplete mission");
            return CommitOutcome::Incomplete { missing };
        }

        let (index, appended) = self.history.record(self.live.clone());
        if appended {
            tracing::debug!(index, "mission committed");
            CommitOutcome::Appended { index }
        } else {
            tracing::debug!(index, "mission already recorded");
            CommitOutcome::AlreadyRecorded { index }
        }
    }

    /// Moves the cursor to the previous entry and restores it as the live state.
    pub fn go_previous(&mut self) -> Navigation {
        let Some((index, entry)) = self.history.step_previous() else {
            return Navigation::AtBoundary;
        };
        self.live = entry.clone();
        tracing::debug!(index, "restored previous mission");
        Navigation::Moved { index }
    }

    /// Moves the cursor to the next entry and restores it as the live state.
    pub fn go_next(&mut self) -> Navigation {
        let Some((index, entry)) = self.history.step_next() else {
            return Navigation::AtBoundary;
        };
        self.live = entry.clone();
        tracing::debug!(index, "restored next mission");
        Navigation::Moved { index }
    }

    /// Index of the history entry under the cursor.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.history.current_index()
    }

    /// Number of committed states.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Reports whether [`Self::go_previous`] would move the cursor.
    #[must_use]
    pub fn can_go_previous(&self) -> bool {
        self.history.can_go_previous()
    }

    /// Reports whether [`Self::go_next`] would move the cursor.
    #[must_use]
    pub fn can_go_next(&self) -> bool {
        self.history.can_go_next()
    }

    fn require(&self, operation: &'static str, field: MissionField) -> Result<(), MissionError> {
        let present = match field {
            MissionField::Map => self.live.map.is_some(),
            MissionField::Agent => self.live.agent.is_some(),
            MissionField::Router => self.live.router.is_some(),
            MissionField::Route => self.live.route.is_some(),
        };
        if present {
            Ok(())
        } else {
            Err(MissionError::Precondition {
                operation,
                missing: field,
            })
        }
    }

    fn cascade(&mut self, field: MissionField) {
        let cleared = self.live.invalidate_after(field);
        if !cleared.is_empty() {
            tracing::debug!(changed = %field, ?cleared, "invalidated downstream fields");
        }
    }
}

impl<M, R> Default for MissionManager<M, R>
where
    M: MapQuery + Clone + PartialEq,
    R: Clone + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}
