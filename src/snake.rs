use std::collections::VecDeque;

use crate::grid::{Cell, Direction, Grid};
use crate::session::LossReason;
use Direction::*;

pub struct Snake {
    body: VecDeque<Cell>,
    direction: Direction,
    pending_growth: u32,
}

impl Snake {
    pub fn new(pos: Cell, direction: Direction) -> Self {
        Snake { body: VecDeque::from(vec![pos]), direction, pending_growth: 0 }
    }

    /// Head first.
    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    pub fn move_step(&mut self) {
        let new_head = self.head().step(self.direction);
        self.body.push_front(new_head);

        if self.pending_growth > 0 {
            self.pending_growth -= 1;
        } else {
            self.body.pop_back();
        }
    }

    pub fn grow(&mut self) {
        self.pending_growth += 1;
    }

    /// Must be called after `move_step`; the head is allowed off the grid until then.
    pub fn check_collision(&self, grid: &Grid) -> Option<LossReason> {
        let head = self.head();
        if !grid.contains(head) {
            Some(LossReason::Wall)
        } else if self.body.iter().skip(1).any(|c| *c == head) {
            Some(LossReason::SelfCollision)
        } else {
            None
        }
    }

    /// Reversing onto the current heading is ignored. Between two moves only
    /// the latest accepted turn counts.
    pub fn change_direction(&mut self, new_direction: Direction) {
        if new_direction != self.direction.opposite() {
            self.direction = new_direction;
        }
    }

    pub fn get_direction(&self) -> Direction {
        self.direction
    }

    pub fn head_char(&self) -> char {
        match self.direction {
            Up => '^',
            Down => 'v',
            Left => '<',
            Right => '>',
        }
    }

    #[cfg(test)]
    pub fn from_cells(cells: &[Cell], direction: Direction) -> Self {
        Snake { body: cells.iter().copied().collect(), direction, pending_growth: 0 }
    }
}
