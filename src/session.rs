use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::fruit::{Fruit, FruitKind, GOOD_KINDS};
use crate::grid::{Cell, Direction, Grid};
use crate::snake::Snake;

pub const FRUITS_PER_LEVEL: u32 = 5;
pub const FINAL_LEVEL: u32 = 5;
pub const INITIAL_SPEED: u32 = 8;
pub const MAX_SPEED: u32 = 15;
pub const POINTS_PER_FRUIT: u32 = 10;

const BASE_APPLES: u32 = 2;
const MAX_APPLES: u32 = 6;
const BASE_GOOD_FRUITS: u32 = 3;

// Rejection sampling gives up after this many misses and picks from the free cells directly
const MAX_SPAWN_ATTEMPTS: usize = 256;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LossReason {
    Wall,
    SelfCollision,
    Apple,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Playing,
    Lost(LossReason),
    Won,
}

/// What a single tick did, for the loop to log and react to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Moved,
    Ate(FruitKind),
    LevelUp(u32),
    Lost(LossReason),
    Won,
}

/// One play-through. Owns the snake, the fruit on the field and the RNG.
pub struct Session {
    grid: Grid,
    snake: Snake,
    fruits: Vec<Fruit>,
    level: u32,
    score: u32,
    fruits_eaten_this_level: u32,
    speed: u32,
    status: Status,
    rng: StdRng,
    seed: u64,
}

impl Session {
    pub fn new(grid: Grid, seed: u64) -> Self {
        let mut session = Session {
            grid,
            snake: Snake::new(grid.center(), Direction::Right),
            fruits: vec![],
            level: 0,
            score: 0,
            fruits_eaten_this_level: 0,
            speed: INITIAL_SPEED,
            status: Status::Playing,
            rng: StdRng::seed_from_u64(seed),
            seed,
        };
        session.spawn_fruits();
        info!(seed, width = grid.width(), height = grid.height(), "session started");
        session
    }

    /// Starts over after a win or loss. Ignored while a game is in progress.
    pub fn restart(&mut self) -> bool {
        if self.status == Status::Playing {
            return false;
        }

        self.snake = Snake::new(self.grid.center(), Direction::Right);
        self.level = 0;
        self.score = 0;
        self.fruits_eaten_this_level = 0;
        self.speed = INITIAL_SPEED;
        self.status = Status::Playing;
        self.spawn_fruits();
        info!("session restarted");
        true
    }

    pub fn change_direction(&mut self, direction: Direction) {
        if self.status == Status::Playing {
            self.snake.change_direction(direction);
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.status != Status::Playing {
            return TickOutcome::Idle;
        }

        self.snake.move_step();

        if let Some(reason) = self.snake.check_collision(&self.grid) {
            return self.lose(reason);
        }

        let head = self.snake.head();
        let idx = match self.fruits.iter().position(|f| f.position() == head) {
            Some(idx) => idx,
            None => return TickOutcome::Moved,
        };

        if self.fruits[idx].kind().is_hazard() {
            return self.lose(LossReason::Apple);
        }

        let eaten = self.fruits.remove(idx);
        self.snake.grow();
        self.score += POINTS_PER_FRUIT;
        self.fruits_eaten_this_level += 1;
        let kind = self.random_good_kind();
        self.spawn_fruit(kind);
        debug!(fruit = eaten.kind().style().name, score = self.score, "fruit eaten");

        if self.fruits_eaten_this_level < FRUITS_PER_LEVEL {
            return TickOutcome::Ate(eaten.kind());
        }

        self.level += 1;
        self.fruits_eaten_this_level = 0;

        if self.level > FINAL_LEVEL {
            self.status = Status::Won;
            info!(score = self.score, "game won");
            return TickOutcome::Won;
        }

        self.speed = (self.speed + 1).min(MAX_SPEED);
        self.spawn_fruits();
        info!(level = self.level, speed = self.speed, "level up");
        TickOutcome::LevelUp(self.level)
    }

    /// Clears the field and lays out fruit for the current level.
    pub fn spawn_fruits(&mut self) {
        self.fruits.clear();

        let apples = (BASE_APPLES + self.level).min(MAX_APPLES);
        let good = BASE_GOOD_FRUITS + self.level;

        for _ in 0..apples {
            self.spawn_fruit(FruitKind::Apple);
        }

        for _ in 0..good {
            let kind = self.random_good_kind();
            self.spawn_fruit(kind);
        }
    }

    /// Places a fruit on a free cell. Returns `None`, leaving the field as is,
    /// when every cell is taken.
    pub fn spawn_fruit(&mut self, kind: FruitKind) -> Option<Fruit> {
        let position = self.random_free_cell().or_else(|| self.pick_free_cell());

        match position {
            Some(position) => {
                let fruit = Fruit::new(kind, position);
                self.fruits.push(fruit);
                Some(fruit)
            }
            None => {
                warn!(?kind, "no free cell left, fruit spawn skipped");
                None
            }
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn fruits(&self) -> &[Fruit] {
        &self.fruits
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn fruits_eaten_this_level(&self) -> u32 {
        self.fruits_eaten_this_level
    }

    pub fn fruits_needed(&self) -> u32 {
        FRUITS_PER_LEVEL
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.speed as u64)
    }

    ///////////////////////////////////////////////////////////////////////////

    fn lose(&mut self, reason: LossReason) -> TickOutcome {
        self.status = Status::Lost(reason);
        info!(?reason, score = self.score, level = self.level, length = self.snake.len(), "game over");
        TickOutcome::Lost(reason)
    }

    fn random_good_kind(&mut self) -> FruitKind {
        GOOD_KINDS[self.rng.gen_range(0..GOOD_KINDS.len())]
    }

    fn is_free(&self, cell: Cell) -> bool {
        !self.snake.occupies(cell) && !self.fruits.iter().any(|f| f.position() == cell)
    }

    fn random_free_cell(&mut self) -> Option<Cell> {
        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let cell = Cell::new(
                self.rng.gen_range(0..self.grid.width()),
                self.rng.gen_range(0..self.grid.height()),
            );
            if self.is_free(cell) {
                return Some(cell);
            }
        }
        None
    }

    fn pick_free_cell(&mut self) -> Option<Cell> {
        let choices: Vec<Cell> = self.grid.cells().filter(|c| self.is_free(*c)).collect();
        choices.choose(&mut self.rng).copied()
    }

    #[cfg(test)]
    pub fn set_snake(&mut self, snake: Snake) {
        self.snake = snake;
    }

    #[cfg(test)]
    pub fn set_fruits(&mut self, fruits: Vec<Fruit>) {
        self.fruits = fruits;
    }

    #[cfg(test)]
    pub fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    #[cfg(test)]
    pub fn set_progress(&mut self, level: u32, fruits_eaten_this_level: u32, speed: u32) {
        self.level = level;
        self.fruits_eaten_this_level = fruits_eaten_this_level;
        self.speed = speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Direction::*;
    use FruitKind::*;

    fn create_session() -> Session {
        Session::new(Grid::new(40, 30), 42)
    }

    fn count_apples(session: &Session) -> usize {
        session.fruits().iter().filter(|f| f.kind().is_hazard()).count()
    }

    fn count_good(session: &Session) -> usize {
        session.fruits().iter().filter(|f| !f.kind().is_hazard()).count()
    }

    // Snake at (10,10) heading right, a fruit of `kind` right in front of it
    // and a couple of far-away fruit so the field is not empty.
    fn stage_meal(session: &mut Session, kind: FruitKind) {
        session.set_snake(Snake::from_cells(&[Cell::new(10, 10)], Right));
        session.set_fruits(vec![
            Fruit::new(kind, Cell::new(11, 10)),
            Fruit::new(Apple, Cell::new(0, 0)),
            Fruit::new(Orange, Cell::new(39, 29)),
        ]);
    }

    #[test]
    fn test_new_session_has_two_apples_and_three_good() {
        let session = create_session();
        assert_eq!(count_apples(&session), 2);
        assert_eq!(count_good(&session), 3);
        assert_eq!(session.level(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.speed(), INITIAL_SPEED);
        assert_eq!(session.status(), Status::Playing);
    }

    #[test]
    fn test_fruit_never_overlaps_snake_or_each_other() {
        let session = create_session();
        let fruits = session.fruits();
        for (i, a) in fruits.iter().enumerate() {
            assert!(session.grid().contains(a.position()));
            assert!(!session.snake().occupies(a.position()));
            for b in &fruits[i + 1..] {
                assert_ne!(a.position(), b.position());
            }
        }
    }

    #[test]
    fn test_first_move_right_from_center() {
        let mut session = create_session();
        session.set_fruits(vec![]);
        let start = session.snake().head();
        assert_eq!(start, session.grid().center());

        assert_eq!(session.tick(), TickOutcome::Moved);
        assert_eq!(session.snake().head(), Cell::new(start.col + 1, start.row));
        assert_eq!(session.snake().len(), 1);
    }

    #[test]
    fn test_eating_good_fruit() {
        let mut session = create_session();
        stage_meal(&mut session, Berry);

        assert_eq!(session.tick(), TickOutcome::Ate(Berry));
        assert_eq!(session.score(), POINTS_PER_FRUIT);
        assert_eq!(session.fruits_eaten_this_level(), 1);
        assert_eq!(session.fruits().len(), 3);
        assert!(!session.fruits().iter().any(|f| f.position() == Cell::new(11, 10)));
        assert_eq!(count_good(&session), 2);
        assert_eq!(session.snake().len(), 1);

        session.set_fruits(vec![]);
        session.tick();
        assert_eq!(session.snake().len(), 2);
    }

    #[test]
    fn test_eating_apple_loses() {
        let mut session = create_session();
        stage_meal(&mut session, Apple);

        assert_eq!(session.tick(), TickOutcome::Lost(LossReason::Apple));
        assert_eq!(session.status(), Status::Lost(LossReason::Apple));
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_wall_collision_loses_and_freezes() {
        let mut session = create_session();
        session.set_fruits(vec![]);
        session.set_snake(Snake::from_cells(&[Cell::new(0, 0)], Left));

        assert_eq!(session.tick(), TickOutcome::Lost(LossReason::Wall));
        let head = session.snake().head();

        assert_eq!(session.tick(), TickOutcome::Idle);
        session.change_direction(Down);
        assert_eq!(session.snake().head(), head);
        assert_eq!(session.status(), Status::Lost(LossReason::Wall));
    }

    #[test]
    fn test_self_collision_loses() {
        let mut session = create_session();
        session.set_fruits(vec![]);
        let cells = [
            Cell::new(5, 5),
            Cell::new(5, 6),
            Cell::new(6, 6),
            Cell::new(6, 5),
            Cell::new(6, 4),
        ];
        session.set_snake(Snake::from_cells(&cells, Up));
        session.change_direction(Right);

        assert_eq!(session.tick(), TickOutcome::Lost(LossReason::SelfCollision));
    }

    #[test]
    fn test_collision_skips_fruit_check() {
        let mut session = create_session();
        session.set_snake(Snake::from_cells(&[Cell::new(0, 0)], Left));
        session.set_fruits(vec![Fruit::new(Orange, Cell::new(5, 5))]);

        session.tick();
        assert_eq!(session.score(), 0);
        assert_eq!(session.fruits().len(), 1);
    }

    #[test]
    fn test_level_up_after_quota() {
        let mut session = create_session();
        session.set_progress(0, FRUITS_PER_LEVEL - 1, INITIAL_SPEED);
        stage_meal(&mut session, Orange);

        assert_eq!(session.tick(), TickOutcome::LevelUp(1));
        assert_eq!(session.level(), 1);
        assert_eq!(session.fruits_eaten_this_level(), 0);
        assert_eq!(session.speed(), INITIAL_SPEED + 1);
        assert_eq!(count_apples(&session), 3);
        assert_eq!(count_good(&session), 4);
        assert_eq!(session.status(), Status::Playing);
    }

    #[test]
    fn test_apple_count_is_capped_and_speed_is_capped() {
        let mut session = create_session();
        session.set_progress(4, FRUITS_PER_LEVEL - 1, MAX_SPEED);
        stage_meal(&mut session, Grapefruit);

        assert_eq!(session.tick(), TickOutcome::LevelUp(5));
        assert_eq!(session.speed(), MAX_SPEED);
        assert_eq!(count_apples(&session), 6);
        assert_eq!(count_good(&session), 8);
    }

    #[test]
    fn test_completing_final_level_wins() {
        let mut session = create_session();
        session.set_progress(FINAL_LEVEL, FRUITS_PER_LEVEL - 1, MAX_SPEED);
        stage_meal(&mut session, Orange);

        assert_eq!(session.tick(), TickOutcome::Won);
        assert_eq!(session.status(), Status::Won);
        assert_eq!(session.level(), FINAL_LEVEL + 1);
        assert_eq!(session.tick(), TickOutcome::Idle);
    }

    #[test]
    fn test_restart_only_after_game_end() {
        let mut session = create_session();
        assert!(!session.restart());

        stage_meal(&mut session, Apple);
        session.set_progress(3, 2, 11);
        session.tick();
        assert!(session.restart());

        assert_eq!(session.status(), Status::Playing);
        assert_eq!(session.level(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.fruits_eaten_this_level(), 0);
        assert_eq!(session.speed(), INITIAL_SPEED);
        assert_eq!(session.snake().head(), session.grid().center());
        assert_eq!(session.snake().len(), 1);
        assert_eq!(count_apples(&session), 2);
        assert_eq!(count_good(&session), 3);
    }

    #[test]
    fn test_spawn_on_full_grid_is_skipped() {
        let mut session = Session::new(Grid::new(2, 1), 7);
        session.set_snake(Snake::from_cells(&[Cell::new(0, 0)], Right));
        session.set_fruits(vec![Fruit::new(Orange, Cell::new(1, 0))]);

        assert_eq!(session.spawn_fruit(Berry), None);
        assert_eq!(session.fruits().len(), 1);
    }

    #[test]
    fn test_spawn_finds_last_free_cell() {
        let mut session = Session::new(Grid::new(3, 1), 7);
        session.set_snake(Snake::from_cells(&[Cell::new(0, 0)], Right));
        session.set_fruits(vec![Fruit::new(Orange, Cell::new(1, 0))]);

        let fruit = session.spawn_fruit(Apple);
        assert_eq!(fruit, Some(Fruit::new(Apple, Cell::new(2, 0))));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = create_session();
        let b = create_session();
        assert_eq!(a.fruits(), b.fruits());
    }

    #[test]
    fn test_degenerate_grid_is_playable() {
        let mut session = Session::new(Grid::new(0, 0), 3);
        assert_eq!(session.grid().cell_count(), 1);
        assert!(session.fruits().is_empty());
        assert_eq!(session.tick(), TickOutcome::Lost(LossReason::Wall));
    }

    #[test]
    fn test_tick_interval_follows_speed() {
        let mut session = create_session();
        assert_eq!(session.tick_interval(), Duration::from_millis(125));
        session.set_progress(0, 0, 10);
        assert_eq!(session.tick_interval(), Duration::from_millis(100));
    }
}
