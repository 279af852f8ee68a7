use Direction::*;

/// Width of one grid cell in terminal columns. Terminal characters are about
/// twice as tall as they are wide, so two columns make a roughly square cell.
pub const CELL_COLUMNS: u16 = 2;
pub const CELL_ROWS: u16 = 1;

/// The classic field: an 800x600 display split into 20-unit cells.
pub const DEFAULT_GRID_WIDTH: i32 = 800 / 20;
pub const DEFAULT_GRID_HEIGHT: i32 = 600 / 20;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Cell { col, row }
    }

    pub fn step(self, direction: Direction) -> Cell {
        let (dc, dr) = direction.delta();
        Cell::new(self.col + dc, self.row + dr)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }
}

/// The playfield, measured in cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
}

impl Grid {
    /// Dimensions below one cell are raised to one, so the grid always has
    /// at least one cell to sample from.
    pub fn new(width: i32, height: i32) -> Self {
        Grid { width: width.max(1), height: height.max(1) }
    }

    /// Splits a display area into as many whole cells as fit.
    pub fn from_display(display_width: u16, display_height: u16, cell_width: u16, cell_height: u16) -> Self {
        Grid::new(
            (display_width / cell_width) as i32,
            (display_height / cell_height) as i32,
        )
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn center(&self) -> Cell {
        Cell::new(self.width / 2, self.height / 2)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.width).contains(&cell.col) && (0..self.height).contains(&cell.row)
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |row| (0..self.width).map(move |col| Cell::new(col, row)))
    }
}
