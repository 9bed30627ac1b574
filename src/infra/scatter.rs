// ============================================================
// Layer 6 — Text Scatter Panel
// ============================================================
// A jittered scatter plot of predicted vs. actual label, one
// point per Evaluation record, drawn with characters so it can
// sit inside the Markdown report:
//
//   Predicted
//       E |            |            |     ...
//       D |            |            |
//       ...
//         +------------+------------+
//               A            B        ...
//                        Actual
//
// Each (actual, predicted) cell is a box; points are jittered
// inside it with a seeded RNG. Overlapping points escalate the
// glyph:  1 → '.'   2-3 → ':'   4-9 → '*'   10+ → '#'
// A good classifier shows a dense diagonal.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::domain::label::Label;

pub struct ScatterPanel {
    cell_width:  usize,
    cell_height: usize,
    seed:        u64,
}

impl ScatterPanel {
    pub fn new(cell_width: usize, cell_height: usize, seed: u64) -> Self {
        Self {
            cell_width:  cell_width.max(3),
            cell_height: cell_height.max(1),
            seed,
        }
    }

    /// Point counts per character position, row 0 = top (predicted E)
    fn grid(&self, pairs: &[(Label, Label)]) -> Vec<Vec<u32>> {
        let rows = Label::COUNT * self.cell_height;
        let cols = Label::COUNT * self.cell_width;
        let mut grid = vec![vec![0u32; cols]; rows];
        let mut rng  = ChaCha8Rng::seed_from_u64(self.seed);

        for &(actual, predicted) in pairs {
            let top  = (Label::COUNT - 1 - predicted.index()) * self.cell_height;
            let left = actual.index() * self.cell_width;
            let dy   = rng.gen_range(0..self.cell_height);
            let dx   = rng.gen_range(1..self.cell_width - 1);
            grid[top + dy][left + dx] += 1;
        }
        grid
    }

    pub fn render(&self, pairs: &[(Label, Label)]) -> String {
        let grid = self.grid(pairs);
        let mut out = String::from("Predicted\n");

        for (y, line) in grid.iter().enumerate() {
            let label = Label::ALL[Label::COUNT - 1 - y / self.cell_height];
            if y % self.cell_height == self.cell_height / 2 {
                out.push_str(&format!("    {label} |"));
            } else {
                out.push_str("      |");
            }
            for (x, &count) in line.iter().enumerate() {
                out.push(glyph(count));
                if (x + 1) % self.cell_width == 0 {
                    out.push('|');
                }
            }
            out.push('\n');
        }

        out.push_str("      +");
        for _ in 0..Label::COUNT {
            out.push_str(&"-".repeat(self.cell_width));
            out.push('+');
        }
        out.push('\n');

        out.push_str("       ");
        for label in Label::ALL {
            let pad = self.cell_width / 2;
            out.push_str(&format!("{:>pad$}{label}{:<rest$}", "", "", pad = pad, rest = self.cell_width - pad));
        }
        out.push('\n');

        let axis_width = 7 + Label::COUNT * (self.cell_width + 1);
        out.push_str(&format!("{:^axis_width$}\n", "Actual"));
        out
    }
}

fn glyph(count: u32) -> char {
    match count {
        0 => ' ',
        1 => '.',
        2..=3 => ':',
        4..=9 => '*',
        _ => '#',
    }
}
