use healthcenter::distance::euclidean_matrix;
use healthcenter::instance::{parse_instance, Community, Depot, Instance};
use healthcenter::locate::solver::{HighsSolver, SolveStatus, SolverConfig};
use healthcenter::plan::{deploy, plan, route, PlanConfig};
use healthcenter::PlanError;
use std::time::Duration;

fn create_instance(points: &[(f64, f64, u64)], m: usize, capacity: u64, depot: Depot) -> Instance {
    let communities = points.iter().map(|&(x, y, population)| Community { x, y, population }).collect();
    Instance::new(communities, m, capacity, depot)
}

fn exact_config(cutoff: usize) -> PlanConfig {
    PlanConfig::default().with_neighbor_cutoff(cutoff).with_solver(SolverConfig::default().with_mip_rel_gap(0.))
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() <= 1e-6 * expected.abs().max(1.), "{} != {}", actual, expected);
}

#[test]
fn can_deploy_two_centers_on_square() {
    let points = [(0., 0., 5), (10., 0., 5), (0., 10., 5), (10., 10., 5)];
    let instance = create_instance(&points, 2, 10, Depot::default());

    let deployment = deploy(&instance, &exact_config(4), &HighsSolver::default()).unwrap();
    let solution = &deployment.solution;

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.facilities.len(), 2);
    assert_eq!(solution.assignment.len(), 4);
    for &site in &solution.facilities {
        assert_eq!(solution.members(site).len(), 2);
    }
    assert!(solution.validate(&instance, &deployment.distances).is_empty());
    assert_close(solution.bottleneck, solution.recompute_bottleneck(&instance, &deployment.distances));
    assert_close(solution.bottleneck, 50.);
}

#[test]
fn can_keep_assignments_within_neighbor_cutoff() {
    // three far apart clusters of four: the 4 nearest sites never leave a cluster
    let mut points = Vec::new();
    for (cx, cy) in [(0., 0.), (1000., 0.), (0., 1000.)] {
        for (dx, dy, population) in [(0., 0., 3), (2., 0., 1), (0., 3., 4), (1., 1., 2)] {
            points.push((cx + dx, cy + dy, population));
        }
    }
    let instance = create_instance(&points, 3, 100, Depot::default());

    let deployment = deploy(&instance, &exact_config(4), &HighsSolver::default()).unwrap();
    let solution = &deployment.solution;

    assert!(solution.validate(&instance, &deployment.distances).is_empty());
    for (n, &site) in solution.assignment.iter().enumerate() {
        assert!(deployment.neighbors.neighbors(n).contains(&site));
        assert_eq!(n / 4, site / 4);
    }
    assert_close(solution.bottleneck, solution.recompute_bottleneck(&instance, &deployment.distances));
}

#[test]
fn can_respect_capacity_when_it_forces_farther_assignment() {
    // without capacity site 1 would serve everyone
    let points = [(0., 0., 6), (1., 0., 6), (2., 0., 6), (9., 0., 1)];
    let instance = create_instance(&points, 2, 12, Depot::default());

    let deployment = deploy(&instance, &exact_config(4), &HighsSolver::default()).unwrap();
    let solution = &deployment.solution;

    assert!(solution.validate(&instance, &deployment.distances).is_empty());
    for (_, demand) in solution.demands(&instance) {
        assert!(demand <= 12);
    }
}

#[test]
fn can_report_infeasible_capacity() {
    let points = [(0., 0., 5), (10., 0., 5), (0., 10., 5), (10., 10., 5)];
    let instance = create_instance(&points, 1, 10, Depot::default());

    let result = plan(&instance, &exact_config(4), &HighsSolver::default());

    assert_eq!(result, Err(PlanError::Infeasible));
}

#[test]
fn can_report_too_many_centers_as_infeasible() {
    let instance = create_instance(&[(0., 0., 1), (1., 0., 1)], 3, 10, Depot::default());

    let result = plan(&instance, &exact_config(2), &HighsSolver::default());

    assert_eq!(result, Err(PlanError::Infeasible));
}

#[test]
fn can_route_reference_demands() {
    // each community is its own healthcenter, so demands are the populations
    let points = [(0., 3., 60), (4., 0., 50), (0., 6., 40)];
    let instance = create_instance(&points, 3, 100, Depot::default());

    let deployment = deploy(&instance, &exact_config(3), &HighsSolver::default()).unwrap();
    let routes = route(&instance, &deployment.solution, 100);

    assert_eq!(deployment.solution.facilities, vec![0, 1, 2]);
    let stops: Vec<Vec<usize>> = routes.routes.iter().map(|r| r.stops.clone()).collect();
    assert_eq!(stops, vec![vec![0], vec![1, 2]]);
    assert_eq!(routes.routes.iter().map(|r| r.load).collect::<Vec<_>>(), vec![60, 90]);
    assert_close(routes.total_distance, 6. + 4. + 52_f64.sqrt() + 6.);
}

#[test]
fn can_plan_from_text_instance() {
    let text = "6 2\n0 5 5\n1 0 0 30 10\n2 1 0 30 10\n3 0 1 30 5\n4 10 10 30 10\n5 11 10 30 5\n6 10 11 30 10\n";
    let instance = parse_instance(text).unwrap();
    let config = exact_config(6).with_vehicle_capacity(30);

    let plan = plan(&instance, &config, &HighsSolver::default()).unwrap();

    let distances = euclidean_matrix(&instance.xs(), &instance.ys());
    assert!(plan.solution.validate(&instance, &distances).is_empty());
    let mut routed: Vec<usize> = plan.routes.routes.iter().flat_map(|r| r.stops.clone()).collect();
    routed.sort_unstable();
    assert_eq!(routed, plan.solution.facilities);
    assert!(plan.routes.routes.iter().all(|r| r.load <= 30));
    assert_eq!(plan.routes.routes.iter().map(|r| r.load).sum::<u64>(), instance.total_population());
}

#[test]
fn can_surface_time_limit_as_timeout_or_valid_incumbent() {
    // a pseudo-random field of 80 communities keeps branch and bound busy
    let mut seed = 7_u64;
    let mut next = move |modulo: u64| {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (seed >> 33) % modulo
    };
    let points: Vec<(f64, f64, u64)> =
        (0..80).map(|_| (next(1000) as f64, next(1000) as f64, 1 + next(50))).collect();
    let total: u64 = points.iter().map(|p| p.2).sum();
    let instance = create_instance(&points, 8, total / 4, Depot::default());
    let solver = SolverConfig::default().with_mip_rel_gap(0.).with_time_limit(Duration::from_millis(1));
    let config = PlanConfig::default().with_neighbor_cutoff(15).with_solver(solver);

    match deploy(&instance, &config, &HighsSolver::default()) {
        Ok(deployment) => {
            let solution = &deployment.solution;
            let actual = solution.recompute_bottleneck(&instance, &deployment.distances);
            let violations = solution.validate(&instance, &deployment.distances);

            assert!(violations.iter().all(|violation| violation.contains("bottleneck")), "{:?}", violations);
            assert!(solution.bottleneck >= actual - 1e-6 * actual.max(1.));
        }
        Err(err) => assert_eq!(err, PlanError::TimeoutWithoutIncumbent),
    }
}
