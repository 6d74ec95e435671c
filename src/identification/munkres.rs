//! Minimum-cost assignment (Kuhn-Munkres / Hungarian algorithm).
//!
//! Rows are local files, columns are catalog tracks. Rectangular inputs
//! are padded to square with zero-cost cells; pairs that land on padding
//! are dropped, so the surplus side is simply left unmatched.
//!
//! Follows the classic six-step formulation (row reduction, starring,
//! column covering, priming with augmenting paths, cost adjustment).
//! Always terminates in O(n³).

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    None,
    Star,
    Prime,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    CoverStarredColumns,
    PrimeZeros,
    AugmentPath(usize, usize),
    AdjustCosts,
    Done,
}

/// Solve the assignment problem for `costs` (`costs[row][col]`, all rows
/// the same length, values non-negative and finite).
///
/// Returns `(row, col)` pairs, sorted by row, covering `min(rows, cols)`
/// rows with globally minimal total cost.
pub fn solve(costs: &[Vec<f64>]) -> Vec<(usize, usize)> {
    let nrows = costs.len();
    let ncols = costs.first().map_or(0, Vec::len);
    if nrows == 0 || ncols == 0 {
        return Vec::new();
    }

    let n = nrows.max(ncols);
    let mut c = vec![vec![0.0; n]; n];
    for (row, values) in costs.iter().enumerate() {
        c[row][..values.len()].copy_from_slice(values);
    }

    let mut marks = vec![vec![Mark::None; n]; n];
    let mut row_covered = vec![false; n];
    let mut col_covered = vec![false; n];

    // Row reduction: make every row contain at least one zero
    for row in c.iter_mut() {
        let min = row.iter().copied().fold(f64::INFINITY, f64::min);
        for value in row.iter_mut() {
            *value -= min;
        }
    }

    // Star one independent zero per row/column where possible
    for i in 0..n {
        for j in 0..n {
            if c[i][j] == 0.0 && !row_covered[i] && !col_covered[j] {
                marks[i][j] = Mark::Star;
                row_covered[i] = true;
                col_covered[j] = true;
            }
        }
    }
    clear_covers(&mut row_covered, &mut col_covered);

    let mut step = Step::CoverStarredColumns;
    let mut iterations = 0usize;
    loop {
        iterations += 1;
        step = match step {
            Step::CoverStarredColumns => {
                let mut count = 0;
                for j in 0..n {
                    if (0..n).any(|i| marks[i][j] == Mark::Star) {
                        col_covered[j] = true;
                        count += 1;
                    }
                }
                if count >= n { Step::Done } else { Step::PrimeZeros }
            }
            Step::PrimeZeros => prime_zeros(&c, &mut marks, &mut row_covered, &mut col_covered),
            Step::AugmentPath(row, col) => {
                augment_path(&mut marks, row, col);
                clear_covers(&mut row_covered, &mut col_covered);
                erase_primes(&mut marks);
                Step::CoverStarredColumns
            }
            Step::AdjustCosts => {
                adjust_costs(&mut c, &row_covered, &col_covered);
                Step::PrimeZeros
            }
            Step::Done => break,
        };
    }
    trace!(size = n, iterations, "assignment solved");

    let mut solution = Vec::with_capacity(nrows.min(ncols));
    for (i, row) in marks.iter().enumerate().take(nrows) {
        for (j, mark) in row.iter().enumerate().take(ncols) {
            if *mark == Mark::Star {
                solution.push((i, j));
            }
        }
    }
    solution
}

/// Prime uncovered zeros until one has no star in its row (start an
/// augmenting path there) or none remain (adjust costs).
fn prime_zeros(
    c: &[Vec<f64>],
    marks: &mut [Vec<Mark>],
    row_covered: &mut [bool],
    col_covered: &mut [bool],
) -> Step {
    loop {
        let Some((row, col)) = find_uncovered_zero(c, row_covered, col_covered) else {
            return Step::AdjustCosts;
        };

        marks[row][col] = Mark::Prime;
        match find_in_row(marks, row, Mark::Star) {
            Some(star_col) => {
                row_covered[row] = true;
                col_covered[star_col] = false;
            }
            None => return Step::AugmentPath(row, col),
        }
    }
}

/// Alternate primes and stars starting from the prime at (row, col), then
/// flip the path: stars become plain, primes become stars.
fn augment_path(marks: &mut [Vec<Mark>], row: usize, col: usize) {
    let mut path = vec![(row, col)];
    loop {
        let (_, last_col) = path[path.len() - 1];
        let Some(star_row) = find_in_col(marks, last_col, Mark::Star) else {
            break;
        };
        path.push((star_row, last_col));

        // a starred row always holds a prime at this point
        let Some(prime_col) = find_in_row(marks, star_row, Mark::Prime) else {
            break;
        };
        path.push((star_row, prime_col));
    }

    for (i, j) in path {
        marks[i][j] = if marks[i][j] == Mark::Star {
            Mark::None
        } else {
            Mark::Star
        };
    }
}

/// Add the smallest uncovered value to covered rows and subtract it from
/// uncovered columns, creating a new uncovered zero without disturbing
/// starred or primed ones.
fn adjust_costs(c: &mut [Vec<f64>], row_covered: &[bool], col_covered: &[bool]) {
    let n = c.len();
    let mut min = f64::INFINITY;
    for i in 0..n {
        if row_covered[i] {
            continue;
        }
        for j in 0..n {
            if !col_covered[j] && c[i][j] < min {
                min = c[i][j];
            }
        }
    }

    for i in 0..n {
        for j in 0..n {
            if row_covered[i] {
                c[i][j] += min;
            }
            if !col_covered[j] {
                c[i][j] -= min;
            }
        }
    }
}

fn find_uncovered_zero(
    c: &[Vec<f64>],
    row_covered: &[bool],
    col_covered: &[bool],
) -> Option<(usize, usize)> {
    let n = c.len();
    (0..n)
        .filter(|&i| !row_covered[i])
        .find_map(|i| (0..n).find(|&j| !col_covered[j] && c[i][j] == 0.0).map(|j| (i, j)))
}

fn find_in_row(marks: &[Vec<Mark>], row: usize, mark: Mark) -> Option<usize> {
    marks[row].iter().position(|m| *m == mark)
}

fn find_in_col(marks: &[Vec<Mark>], col: usize, mark: Mark) -> Option<usize> {
    marks.iter().position(|row| row[col] == mark)
}

fn clear_covers(row_covered: &mut [bool], col_covered: &mut [bool]) {
    row_covered.iter_mut().for_each(|x| *x = false);
    col_covered.iter_mut().for_each(|x| *x = false);
}

fn erase_primes(marks: &mut [Vec<Mark>]) {
    for row in marks.iter_mut() {
        for mark in row.iter_mut() {
            if *mark == Mark::Prime {
                *mark = Mark::None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn total(costs: &[Vec<f64>], pairs: &[(usize, usize)]) -> f64 {
        pairs.iter().map(|&(i, j)| costs[i][j]).sum()
    }

    /// Minimum over every one-to-one pairing of size min(rows, cols).
    fn brute_force(costs: &[Vec<f64>]) -> f64 {
        fn go(costs: &[Vec<f64>], row: usize, used: &mut Vec<bool>, remaining: usize) -> f64 {
            if remaining == 0 {
                return 0.0;
            }
            let rows_left = costs.len() - row;
            let mut best = f64::INFINITY;
            // leave this row unassigned if enough rows remain
            if rows_left > remaining {
                best = go(costs, row + 1, used, remaining);
            }
            for col in 0..used.len() {
                if !used[col] {
                    used[col] = true;
                    let cost = costs[row][col] + go(costs, row + 1, used, remaining - 1);
                    used[col] = false;
                    best = best.min(cost);
                }
            }
            best
        }

        let ncols = costs[0].len();
        go(costs, 0, &mut vec![false; ncols], costs.len().min(ncols))
    }

    #[test]
    fn test_square_matrix() {
        let costs = vec![
            vec![1.0, 2.0, 3.0],
            vec![2.0, 4.0, 6.0],
            vec![3.0, 6.0, 9.0],
        ];
        let pairs = solve(&costs);
        assert_eq!(pairs.len(), 3);
        assert_eq!(total(&costs, &pairs), 10.0);
    }

    #[test]
    fn test_identity_prefers_diagonal() {
        let costs = vec![
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
        ];
        assert_eq!(solve(&costs), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_more_rows_than_columns() {
        let costs = vec![vec![0.9], vec![0.1], vec![0.5]];
        assert_eq!(solve(&costs), vec![(1, 0)]);
    }

    #[test]
    fn test_more_columns_than_rows() {
        let costs = vec![vec![0.7, 0.2, 0.9]];
        assert_eq!(solve(&costs), vec![(0, 1)]);
    }

    #[test]
    fn test_empty_matrix() {
        assert!(solve(&[]).is_empty());
        assert!(solve(&[vec![]]).is_empty());
    }

    #[test]
    fn test_classic_example() {
        let costs = vec![
            vec![400.0, 150.0, 400.0],
            vec![400.0, 450.0, 600.0],
            vec![300.0, 225.0, 300.0],
        ];
        let pairs = solve(&costs);
        assert_eq!(total(&costs, &pairs), 850.0);
    }

    proptest! {
        #[test]
        fn solution_is_optimal(
            (rows, cols, values) in (1usize..=6, 1usize..=6)
                .prop_flat_map(|(r, c)| (Just(r), Just(c), proptest::collection::vec(0u8..20, r * c)))
        ) {
            let costs: Vec<Vec<f64>> = values
                .chunks(cols)
                .map(|row| row.iter().map(|&v| v as f64).collect())
                .collect();
            prop_assert_eq!(costs.len(), rows);

            let pairs = solve(&costs);
            prop_assert_eq!(pairs.len(), rows.min(cols));

            let mut seen_rows = vec![false; rows];
            let mut seen_cols = vec![false; cols];
            for &(i, j) in &pairs {
                prop_assert!(!seen_rows[i] && !seen_cols[j]);
                seen_rows[i] = true;
                seen_cols[j] = true;
            }

            prop_assert_eq!(total(&costs, &pairs), brute_force(&costs));
        }
    }
}
