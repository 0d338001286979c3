// src/pouch.rs
// The server's pouch of undrawn balls.

use serde::{Deserialize, Serialize};

use crate::defs::{Number, FIRSTNUMBER, LASTNUMBER};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pouch {
    pub numbers: Vec<Number>,
}

impl Pouch {
    pub fn new() -> Self {
        Pouch {
            numbers: (FIRSTNUMBER..=LASTNUMBER).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Draw a random ball, `None` once the pouch is empty.
    pub fn extract(&mut self) -> Option<Number> {
        if self.is_empty() {
            None
        } else {
            let random_index = rand::random_range(0..self.len());
            Some(self.numbers.swap_remove(random_index))
        }
    }
}

impl Default for Pouch {
    fn default() -> Self {
        Self::new()
    }
}
