use gate_defence_core::{GridCoord, LevelError, TileGrid, TileValue};

/// Cost of a single horizontal or vertical step.
pub const ORTHOGONAL_COST: f64 = 1.0;

/// Cost of a single diagonal step.
pub const DIAGONAL_COST: f64 = std::f64::consts::SQRT_2;

/// Neighbourhood used when connecting graph nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Movement {
    /// Steps north, east, south and west only.
    #[default]
    Cardinal,
    /// Cardinal steps plus the four diagonals.
    Diagonal,
}

impl Movement {
    /// Selects the movement mode from a level's diagonal flag.
    #[must_use]
    pub const fn from_diagonal(diagonal: bool) -> Self {
        if diagonal {
            Self::Diagonal
        } else {
            Self::Cardinal
        }
    }

    /// Admissible estimate of the remaining cost between two coordinates.
    ///
    /// Manhattan distance for cardinal movement, octile distance otherwise.
    #[must_use]
    pub fn heuristic(self, from: GridCoord, to: GridCoord) -> f64 {
        let rows = f64::from(from.row().abs_diff(to.row()));
        let columns = f64::from(from.column().abs_diff(to.column()));
        match self {
            Self::Cardinal => (rows + columns) * ORTHOGONAL_COST,
            Self::Diagonal => {
                let straight = rows.max(columns) - rows.min(columns);
                straight * ORTHOGONAL_COST + rows.min(columns) * DIAGONAL_COST
            }
        }
    }
}

// Order in which neighbours are expanded: N, E, S, W, then NE, SE, SW, NW.
static OFFSETS: [(i64, i64, f64); 8] = [
    (-1, 0, ORTHOGONAL_COST),
    (0, 1, ORTHOGONAL_COST),
    (1, 0, ORTHOGONAL_COST),
    (0, -1, ORTHOGONAL_COST),
    (-1, 1, DIAGONAL_COST),
    (1, 1, DIAGONAL_COST),
    (1, -1, DIAGONAL_COST),
    (-1, -1, DIAGONAL_COST),
];

/// Graph vertex wrapping a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    coord: GridCoord,
    walkable: bool,
}

impl Node {
    /// Tile coordinate represented by the node.
    #[must_use]
    pub const fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Whether enemies may enter the node.
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        self.walkable
    }
}

/// Square graph with one node per tile and the located gates.
#[derive(Clone, Debug)]
pub struct Graph {
    size: u32,
    nodes: Vec<Node>,
    start: GridCoord,
    end: GridCoord,
    movement: Movement,
}

impl Graph {
    /// Builds the graph for a decoded tile grid.
    ///
    /// The first start and end gates in row-major order are used. A grid
    /// lacking either gate is rejected.
    pub fn from_tiles(tiles: &TileGrid, movement: Movement) -> Result<Self, LevelError> {
        let start = tiles
            .find(TileValue::Start)
            .ok_or(LevelError::MissingStartGate)?;
        let end = tiles.find(TileValue::End).ok_or(LevelError::MissingEndGate)?;

        let nodes = tiles
            .iter()
            .map(|(coord, value)| Node {
                coord,
                walkable: value.is_walkable(),
            })
            .collect();

        Ok(Self {
            size: tiles.size(),
            nodes,
            start,
            end,
            movement,
        })
    }

    /// Number of rows and columns in the graph.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Coordinate of the start gate.
    #[must_use]
    pub const fn start(&self) -> GridCoord {
        self.start
    }

    /// Coordinate of the end gate.
    #[must_use]
    pub const fn end(&self) -> GridCoord {
        self.end
    }

    /// Neighbourhood used to connect nodes.
    #[must_use]
    pub const fn movement(&self) -> Movement {
        self.movement
    }

    /// Node at the provided coordinate, if it lies inside the graph.
    #[must_use]
    pub fn node(&self, coord: GridCoord) -> Option<&Node> {
        self.index(coord).and_then(|index| self.nodes.get(index))
    }

    /// Whether the coordinate lies inside the graph and is walkable.
    #[must_use]
    pub fn is_walkable(&self, coord: GridCoord) -> bool {
        self.node(coord).is_some_and(Node::is_walkable)
    }

    /// Walkable neighbours of a node with the cost of stepping onto them.
    ///
    /// Blocked nodes have no edges in either direction.
    pub fn neighbors(&self, coord: GridCoord) -> impl Iterator<Item = (GridCoord, f64)> + '_ {
        let count = match self.movement {
            Movement::Cardinal => 4,
            Movement::Diagonal => OFFSETS.len(),
        };
        let origin_walkable = self.is_walkable(coord);

        OFFSETS[..count]
            .iter()
            .filter(move |_| origin_walkable)
            .filter_map(move |&(row_delta, column_delta, cost)| {
                let row = u32::try_from(i64::from(coord.row()) + row_delta).ok()?;
                let column = u32::try_from(i64::from(coord.column()) + column_delta).ok()?;
                let neighbor = GridCoord::new(row, column);
                self.is_walkable(neighbor).then_some((neighbor, cost))
            })
    }

    pub(crate) fn index(&self, coord: GridCoord) -> Option<usize> {
        if coord.row() >= self.size || coord.column() >= self.size {
            return None;
        }
        let width = usize::try_from(self.size).ok()?;
        let row = usize::try_from(coord.row()).ok()?;
        let column = usize::try_from(coord.column()).ok()?;
        Some(row * width + column)
    }

    pub(crate) fn coord(&self, index: usize) -> Option<GridCoord> {
        self.nodes.get(index).map(Node::coord)
    }
}
