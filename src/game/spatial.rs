use glam::Vec2;

/// Uniform bucket grid keyed by world position. Entities are kept in the
/// bucket matching their last reported position, so every position change
/// must go through `relocate` (EntityDb enforces this).
pub struct Buckets<K> {
    cell: f32,
    cols: i32,
    rows: i32,
    cells: Vec<Vec<K>>,
}

impl<K: Copy + PartialEq> Buckets<K> {
    pub fn new(w: f32, h: f32, cell: f32) -> Self {
        let cols = (w / cell).ceil().max(1.0) as i32;
        let rows = (h / cell).ceil().max(1.0) as i32;
        Self {
            cell,
            cols,
            rows,
            cells: vec![Vec::new(); (cols * rows) as usize],
        }
    }

    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        let cx = ((pos.x / self.cell).floor() as i32).clamp(0, self.cols - 1);
        let cy = ((pos.y / self.cell).floor() as i32).clamp(0, self.rows - 1);
        (cx, cy)
    }

    fn index(&self, cx: i32, cy: i32) -> usize {
        (cy * self.cols + cx) as usize
    }

    pub fn insert(&mut self, key: K, pos: Vec2) {
        let (cx, cy) = self.cell_of(pos);
        let idx = self.index(cx, cy);
        self.cells[idx].push(key);
    }

    pub fn remove(&mut self, key: K, pos: Vec2) {
        let (cx, cy) = self.cell_of(pos);
        let idx = self.index(cx, cy);
        if let Some(i) = self.cells[idx].iter().position(|k| *k == key) {
            self.cells[idx].swap_remove(i);
        }
    }

    pub fn relocate(&mut self, key: K, from: Vec2, to: Vec2) {
        let old = self.cell_of(from);
        let new = self.cell_of(to);
        if old == new {
            return;
        }
        let old_idx = self.index(old.0, old.1);
        if let Some(i) = self.cells[old_idx].iter().position(|k| *k == key) {
            self.cells[old_idx].swap_remove(i);
        }
        let new_idx = self.index(new.0, new.1);
        self.cells[new_idx].push(key);
    }

    /// Everything in the 3x3 cell neighborhood around `pos`.
    pub fn near(&self, pos: Vec2) -> Vec<K> {
        let (cx, cy) = self.cell_of(pos);
        let mut out = Vec::new();
        for dy in -1..=1 {
            let y = cy + dy;
            if y < 0 || y >= self.rows {
                continue;
            }
            for dx in -1..=1 {
                let x = cx + dx;
                if x < 0 || x >= self.cols {
                    continue;
                }
                out.extend_from_slice(&self.cells[self.index(x, y)]);
            }
        }
        out
    }
}
