//! Problem instance: communities, depot and the shared healthcenter capacity.
//!
//! The text format read here is
//!
//! ```text
//! N M
//! <depot id> <x> <y>
//! <id> <x> <y> <capacity> <population>   (N lines)
//! ```
//!
//! The healthcenter capacity is taken from the first community record.

use crate::error::{PlanError, PlanResult};
use std::io::{BufRead, BufReader, Read};

/// A demand point. Index `n` is its position in the instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Community {
    pub x: f64,
    pub y: f64,
    pub population: u64,
}

/// Fixed start and end point of every ambulance route.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Depot {
    pub x: f64,
    pub y: f64,
}

/// Immutable input of a planning run.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub communities: Vec<Community>,
    /// Number of healthcenters to open (M).
    pub facility_count: usize,
    /// Population capacity shared by every site (C).
    pub capacity: u64,
    pub depot: Depot,
}

impl Instance {
    pub fn new(communities: Vec<Community>, facility_count: usize, capacity: u64, depot: Depot) -> Self {
        Self { communities, facility_count, capacity, depot }
    }

    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.communities.iter().map(|c| c.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.communities.iter().map(|c| c.y).collect()
    }

    pub fn populations(&self) -> Vec<u64> {
        self.communities.iter().map(|c| c.population).collect()
    }

    pub fn total_population(&self) -> u64 {
        self.communities.iter().map(|c| c.population).sum()
    }
}

/// Reads an instance from any reader.
pub fn read_instance<R: Read>(reader: BufReader<R>) -> PlanResult<Instance> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| PlanError::input(idx + 1, err.to_string()))?;
        records.push((idx + 1, line));
    }

    parse_records(records)
}

/// Reads an instance from its text representation.
pub fn parse_instance(text: &str) -> PlanResult<Instance> {
    parse_records(text.lines().enumerate().map(|(idx, line)| (idx + 1, line.to_string())).collect())
}

fn parse_records(records: Vec<(usize, String)>) -> PlanResult<Instance> {
    // trailing blank lines are tolerated, anything else blank is not
    let last = records.iter().rposition(|(_, line)| !line.trim().is_empty()).map_or(0, |pos| pos + 1);
    let mut records = records.into_iter().take(last);

    let (line_no, header) = records.next().ok_or_else(|| PlanError::input(1, "missing header line"))?;
    let header = fields(line_no, &header, 2)?;
    let n: usize = parse_field(line_no, header[0], "community count")?;
    let m: usize = parse_field(line_no, header[1], "healthcenter count")?;
    if m == 0 {
        return Err(PlanError::input(line_no, "healthcenter count must be positive"));
    }

    let (line_no, depot) = records.next().ok_or_else(|| PlanError::input(2, "missing depot line"))?;
    let depot = fields(line_no, &depot, 3)?;
    let depot = Depot {
        x: parse_coordinate(line_no, depot[1], "depot x")?,
        y: parse_coordinate(line_no, depot[2], "depot y")?,
    };

    let mut capacity = None;
    let mut communities = Vec::with_capacity(n);
    for (line_no, line) in records {
        let parts = fields(line_no, &line, 5)?;
        if capacity.is_none() {
            capacity = Some(parse_field::<u64>(line_no, parts[3], "capacity")?);
        }
        communities.push(Community {
            x: parse_coordinate(line_no, parts[1], "x")?,
            y: parse_coordinate(line_no, parts[2], "y")?,
            population: parse_field(line_no, parts[4], "population")?,
        });
    }

    if communities.len() != n {
        return Err(PlanError::input(
            1,
            format!("header declares {} communities, found {}", n, communities.len()),
        ));
    }

    Ok(Instance::new(communities, m, capacity.unwrap_or(0), depot))
}

fn fields<'a>(line_no: usize, line: &'a str, expected: usize) -> PlanResult<Vec<&'a str>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != expected {
        return Err(PlanError::input(line_no, format!("expected {} fields, got {}", expected, parts.len())));
    }

    Ok(parts)
}

fn parse_field<T: std::str::FromStr>(line_no: usize, value: &str, what: &str) -> PlanResult<T> {
    value.parse().map_err(|_| PlanError::input(line_no, format!("cannot parse {} from '{}'", what, value)))
}

/// Parses a coordinate, rejecting the `nan` and `inf` spellings `f64` accepts.
fn parse_coordinate(line_no: usize, value: &str, what: &str) -> PlanResult<f64> {
    let coordinate: f64 = parse_field(line_no, value, what)?;
    if !coordinate.is_finite() {
        return Err(PlanError::input(line_no, format!("{} must be finite, got '{}'", what, value)));
    }

    Ok(coordinate)
}
