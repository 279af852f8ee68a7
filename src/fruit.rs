use crate::grid::Cell;
use crossterm::style::Color;
use FruitKind::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FruitKind {
    Apple,
    Orange,
    Grapefruit,
    Berry,
}

/// The kinds that score points. Apples end the game.
pub const GOOD_KINDS: [FruitKind; 3] = [Orange, Grapefruit, Berry];

pub struct FruitStyle {
    pub name: &'static str,
    pub glyph: char,
    pub color: Color,
}

const STYLES: [FruitStyle; 4] = [
    FruitStyle { name: "apple", glyph: '@', color: Color::Red },
    FruitStyle { name: "orange", glyph: 'o', color: Color::DarkYellow },
    FruitStyle { name: "grapefruit", glyph: 'Q', color: Color::Magenta },
    FruitStyle { name: "berry", glyph: '*', color: Color::DarkMagenta },
];

impl FruitKind {
    pub fn is_hazard(self) -> bool {
        matches!(self, Apple)
    }

    pub fn style(self) -> &'static FruitStyle {
        &STYLES[self as usize]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fruit {
    kind: FruitKind,
    position: Cell,
}

impl Fruit {
    pub fn new(kind: FruitKind, position: Cell) -> Self {
        Fruit { kind, position }
    }

    pub fn kind(&self) -> FruitKind {
        self.kind
    }

    pub fn position(&self) -> Cell {
        self.position
    }
}
