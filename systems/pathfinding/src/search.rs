use std::{cmp::Ordering, collections::BinaryHeap};

use gate_defence_core::GridCoord;

use crate::graph::Graph;

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f: f64,
    h: f64,
    sequence: u64,
    index: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    // Reversed so the max-heap pops the lowest f, then the lowest h, then the
    // earliest insertion.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Computes the cheapest route between two coordinates using A*.
///
/// The returned sequence starts at `start` and ends at `end`, both inclusive.
/// It is empty when either endpoint is blocked or outside the graph, or when
/// no walkable route connects them. Ties between equally promising nodes are
/// broken deterministically, so repeated searches yield identical routes.
#[must_use]
pub fn search(graph: &Graph, start: GridCoord, end: GridCoord) -> Vec<GridCoord> {
    if !graph.is_walkable(start) || !graph.is_walkable(end) {
        return Vec::new();
    }
    let (Some(start_index), Some(end_index)) = (graph.index(start), graph.index(end)) else {
        return Vec::new();
    };

    let movement = graph.movement();
    let node_count = graph.node_count();
    let mut g_score = vec![f64::INFINITY; node_count];
    let mut came_from: Vec<Option<usize>> = vec![None; node_count];
    let mut closed = vec![false; node_count];
    let mut open = BinaryHeap::new();
    let mut sequence = 0_u64;

    g_score[start_index] = 0.0;
    let h = movement.heuristic(start, end);
    open.push(OpenEntry {
        f: h,
        h,
        sequence,
        index: start_index,
    });

    while let Some(current) = open.pop() {
        if closed[current.index] {
            continue;
        }
        if current.index == end_index {
            return reconstruct(graph, &came_from, end_index);
        }
        closed[current.index] = true;

        let Some(coord) = graph.coord(current.index) else {
            continue;
        };
        let current_g = g_score[current.index];

        for (neighbor, cost) in graph.neighbors(coord) {
            let Some(neighbor_index) = graph.index(neighbor) else {
                continue;
            };
            if closed[neighbor_index] {
                continue;
            }

            let tentative = current_g + cost;
            if tentative >= g_score[neighbor_index] {
                continue;
            }

            g_score[neighbor_index] = tentative;
            came_from[neighbor_index] = Some(current.index);
            sequence += 1;
            let h = movement.heuristic(neighbor, end);
            open.push(OpenEntry {
                f: tentative + h,
                h,
                sequence,
                index: neighbor_index,
            });
        }
    }

    Vec::new()
}

fn reconstruct(graph: &Graph, came_from: &[Option<usize>], end_index: usize) -> Vec<GridCoord> {
    let mut path = Vec::new();
    let mut cursor = Some(end_index);

    while let Some(index) = cursor {
        if let Some(coord) = graph.coord(index) {
            path.push(coord);
        }
        cursor = came_from[index];
    }

    path.reverse();
    path
}
