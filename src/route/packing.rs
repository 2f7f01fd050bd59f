//! Ambulance route packing
//!
//! Greedy first-fit-decreasing packing of opened healthcenters into
//! capacity-bounded depot round trips. Stops are visited in packing order;
//! no attempt is made to shorten the tours.
//!
//! A healthcenter whose own demand exceeds the vehicle capacity still gets a
//! route of its own, which is then over capacity. Such routes are reported by
//! [`Route::is_overloaded`] and logged as warnings.

use crate::distance::euclidean;
use serde::Serialize;

/// A depot-anchored round trip.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Route {
    /// Healthcenter sites in visiting order.
    pub stops: Vec<usize>,
    /// Total equipment demand carried.
    pub load: u64,
    /// Depot -> stops -> depot length.
    pub distance: f64,
}

impl Route {
    pub fn is_overloaded(&self, capacity: u64) -> bool {
        self.load > capacity
    }
}

/// All routes of stage 2.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoutePlan {
    pub vehicle_capacity: u64,
    pub routes: Vec<Route>,
    pub total_distance: f64,
}

impl RoutePlan {
    pub fn overloaded(&self) -> impl Iterator<Item = (usize, &Route)> + '_ {
        self.routes.iter().enumerate().filter(move |(_, route)| route.is_overloaded(self.vehicle_capacity))
    }
}

/// Splits `(site, demand)` stops into groups whose demand fits `capacity`.
///
/// Stops are taken in descending demand (stable, so equal demands keep their
/// input order) and appended to the current group until the next one does
/// not fit, which then opens a new group.
pub fn pack_stops(stops: &[(usize, u64)], capacity: u64) -> Vec<Vec<(usize, u64)>> {
    let mut sorted = stops.to_vec();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let mut groups = Vec::new();
    let mut current: Vec<(usize, u64)> = Vec::new();
    let mut load = 0_u64;

    for (site, demand) in sorted {
        if load + demand <= capacity {
            current.push((site, demand));
            load += demand;
        } else {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            current.push((site, demand));
            load = demand;
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

/// Length of the round trip from `depot` through `stops` in order.
pub fn tour_length(depot: (f64, f64), stops: &[(f64, f64)]) -> f64 {
    let mut last = depot;
    let mut distance = 0.;
    for &stop in stops {
        distance += euclidean(last, stop);
        last = stop;
    }

    distance + euclidean(last, depot)
}

/// Packs `stops` into routes and measures them.
///
/// `locations` is indexed by site.
pub fn plan_routes(stops: &[(usize, u64)], locations: &[(f64, f64)], depot: (f64, f64), capacity: u64) -> RoutePlan {
    let routes: Vec<Route> = pack_stops(stops, capacity)
        .into_iter()
        .map(|group| {
            let coordinates: Vec<(f64, f64)> = group.iter().map(|&(site, _)| locations[site]).collect();
            Route {
                stops: group.iter().map(|&(site, _)| site).collect(),
                load: group.iter().map(|&(_, demand)| demand).sum(),
                distance: tour_length(depot, &coordinates),
            }
        })
        .collect();

    let total_distance = routes.iter().map(|route| route.distance).sum();
    let plan = RoutePlan { vehicle_capacity: capacity, routes, total_distance };

    for (idx, route) in plan.overloaded() {
        log::warn!(
            "route {} carries {} above vehicle capacity {}: a single healthcenter exceeds the vehicle",
            idx + 1,
            route.load,
            capacity
        );
    }

    log::info!(
        "packed {} healthcenters into {} routes, total distance {:.2}",
        stops.len(),
        plan.routes.len(),
        total_distance
    );

    plan
}
