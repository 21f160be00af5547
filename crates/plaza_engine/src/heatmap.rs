//! Visit-density grid over the floor.

use plaza_core::config::HeatmapConfig;
use plaza_core::PersonObservation;
use serde::Serialize;

/// Row-major `width × height` grid of integer intensities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    width: usize,
    height: usize,
    cells: Vec<u32>,
    #[serde(skip)]
    decay: f64,
    #[serde(skip)]
    increment: u32,
}

impl Heatmap {
    /// Callers pass a validated config; dimensions are at least 1.
    pub fn new(config: &HeatmapConfig) -> Self {
        let width = config.width.max(1);
        let height = config.height.max(1);
        Self {
            width,
            height,
            cells: vec![0; width * height],
            decay: config.decay,
            increment: config.increment,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> u32 {
        self.cells[row * self.width + col]
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().map(|&c| c as u64).sum()
    }

    /// One update: fade everything, then stamp current positions.
    pub fn step(&mut self, people: &[PersonObservation]) {
        self.decay();
        for person in people {
            self.deposit(person.x, person.y);
        }
    }

    /// Multiply every cell by the decay factor, truncating.
    pub fn decay(&mut self) {
        let decay = self.decay;
        for cell in self.cells.iter_mut() {
            *cell = (*cell as f64 * decay) as u32;
        }
    }

    /// Add one increment at a normalized floor position.
    pub fn deposit(&mut self, x: f64, y: f64) {
        let row = grid_index(y, self.height);
        let col = grid_index(x, self.width);
        let cell = &mut self.cells[row * self.width + col];
        *cell = cell.saturating_add(self.increment);
    }
}

/// `floor(v * n)` clamped into `0..n`. NaN lands on 0.
fn grid_index(v: f64, n: usize) -> usize {
    // float→int `as` saturates and maps NaN to 0
    ((v * n as f64).floor() as usize).min(n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: usize, height: usize, decay: f64, increment: u32) -> HeatmapConfig {
        HeatmapConfig {
            width,
            height,
            decay,
            increment,
            from_click: false,
        }
    }

    #[test]
    fn test_deposit_lands_in_expected_cell() {
        let mut map = Heatmap::new(&config(4, 2, 0.5, 10));
        map.deposit(0.6, 0.2);
        assert_eq!(map.cell(0, 2), 10);
        assert_eq!(map.total(), 10);
    }

    #[test]
    fn test_edges_and_outside_positions_are_clamped() {
        let mut map = Heatmap::new(&config(4, 2, 0.5, 1));
        map.deposit(1.0, 1.0);
        map.deposit(3.0, -2.0);
        map.deposit(f64::NAN, f64::NAN);
        assert_eq!(map.cell(1, 3), 1);
        assert_eq!(map.cell(0, 3), 1);
        assert_eq!(map.cell(0, 0), 1);
    }

    #[test]
    fn test_decay_truncates_each_step() {
        let mut map = Heatmap::new(&config(1, 1, 0.5, 100));
        map.deposit(0.0, 0.0);
        let mut seen = Vec::new();
        for _ in 0..7 {
            map.decay();
            seen.push(map.total());
        }
        // 100 * 0.5^3 = 12.5 in closed form; truncation per step gives 12
        assert_eq!(seen, vec![50, 25, 12, 6, 3, 1, 0]);
    }

    #[test]
    fn test_step_decays_then_deposits() {
        let mut map = Heatmap::new(&config(2, 2, 0.5, 8));
        let person = PersonObservation::at(1, 0.1, 0.1);
        map.step(std::slice::from_ref(&person));
        map.step(std::slice::from_ref(&person));
        // 8 → 4 after decay, +8
        assert_eq!(map.cell(0, 0), 12);
        map.step(&[]);
        assert_eq!(map.cell(0, 0), 6);
    }

    #[test]
    fn test_serializes_dimensions_and_cells() {
        let map = Heatmap::new(&config(3, 2, 0.9, 1));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["width"], 3);
        assert_eq!(json["height"], 2);
        assert_eq!(json["cells"].as_array().unwrap().len(), 6);
        assert!(json.get("decay").is_none());
    }
}
