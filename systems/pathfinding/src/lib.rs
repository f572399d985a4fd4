#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid graph construction and shortest-path search for level routes.
//!
//! A level's route is computed once: [`Graph::from_tiles`] turns the decoded
//! tile grid into a weighted adjacency structure and [`search`] runs A* from
//! the start gate to the end gate. Enemies never re-route, so the resulting
//! coordinate sequence is frozen into a [`gate_defence_core::Path`] by the
//! caller.

mod graph;
mod search;

pub use graph::{Graph, Movement, Node, DIAGONAL_COST, ORTHOGONAL_COST};
pub use search::search;
