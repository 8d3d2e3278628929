//! Per-entity color assignment
//!
//! Owned by whoever renders cursors (usually the [`CursorRegistry`]) rather
//! than held in process-wide state, so independent registries never see
//! each other's assignments.
//!
//! [`CursorRegistry`]: super::CursorRegistry

use std::collections::HashMap;
use tracing::debug;

use super::event::EntityId;
use crate::trail::Color;

/// Default cursor palette
pub const DEFAULT_PALETTE: [Color; 8] = [
    Color::rgb(0xef, 0x44, 0x44),
    Color::rgb(0x3b, 0x82, 0xf6),
    Color::rgb(0x22, 0xc5, 0x5e),
    Color::rgb(0xf5, 0x9e, 0x0b),
    Color::rgb(0xa8, 0x55, 0xf7),
    Color::rgb(0xec, 0x48, 0x99),
    Color::rgb(0x14, 0xb8, 0xa6),
    Color::rgb(0xf9, 0x73, 0x16),
];

/// Stable color per entity, round-robin over a palette
#[derive(Debug, Clone)]
pub struct ColorRegistry {
    palette: Vec<Color>,
    assigned: HashMap<EntityId, Color>,
    next: usize,
}

impl Default for ColorRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE.to_vec())
    }
}

impl ColorRegistry {
    /// Create a registry over `palette` (falls back to the default if empty)
    pub fn new(palette: Vec<Color>) -> Self {
        let palette = if palette.is_empty() {
            DEFAULT_PALETTE.to_vec()
        } else {
            palette
        };
        Self {
            palette,
            assigned: HashMap::new(),
            next: 0,
        }
    }

    /// Color for `id`, assigning one on first request
    ///
    /// Prefers a palette entry nobody currently holds; once the palette is
    /// exhausted colors are reused in round-robin order.
    pub fn assign(&mut self, id: &EntityId) -> Color {
        if let Some(color) = self.assigned.get(id) {
            return *color;
        }

        let len = self.palette.len();
        let pick = (0..len)
            .map(|offset| (self.next + offset) % len)
            .find(|&i| !self.assigned.values().any(|c| *c == self.palette[i]))
            .unwrap_or(self.next % len);

        let color = self.palette[pick];
        self.next = (pick + 1) % len;
        self.assigned.insert(id.clone(), color);
        debug!("Assigned color {} to {}", color, id);
        color
    }

    /// Color already assigned to `id`
    pub fn get(&self, id: &EntityId) -> Option<Color> {
        self.assigned.get(id).copied()
    }

    /// Return `id`'s color to the pool
    pub fn release(&mut self, id: &EntityId) -> Option<Color> {
        self.assigned.remove(id)
    }

    /// Number of entities holding a color
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// No assignments?
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Palette in use
    pub fn palette(&self) -> &[Color] {
        &self.palette
    }
}
