#![no_std]

/// The four line axes of a grid, as `(row_step, col_step)`.
///
/// Vertical, horizontal, positive-slope diagonal and negative-slope diagonal.
/// Each axis is scanned in both directions, so only one sign is listed.
pub const AXES: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Counts consecutive cells equal to `player` starting next to `(row, col)`
/// and walking in direction `(row_step, col_step)`.
///
/// The walk stops at the grid edge, at the first non-matching cell, or after
/// `limit` matches, whichever comes first.
///
/// # Arguments
/// * `board` - Row-major cell values, `width * height` long
/// * `width` - Board width
/// * `height` - Board height
/// * `row`, `col` - Starting cell (not counted)
/// * `step` - Direction to walk in
/// * `player` - Cell value to match
/// * `limit` - Maximum number of cells to inspect
#[allow(clippy::too_many_arguments)]
pub fn count_direction(
    board: &[u8],
    width: usize,
    height: usize,
    row: usize,
    col: usize,
    step: (isize, isize),
    player: u8,
    limit: usize,
) -> usize {
    let mut count = 0;
    let mut r = row as isize;
    let mut c = col as isize;
    while count < limit {
        r += step.0;
        c += step.1;
        if r < 0 || c < 0 || r >= height as isize || c >= width as isize {
            break;
        }
        if board[r as usize * width + c as usize] != player {
            break;
        }
        count += 1;
    }
    count
}

/// Length of the longest same-player run passing through `(row, col)`,
/// capped at `line_size`.
///
/// Only `line_size - 1` cells are inspected on each side of the cell along
/// each axis, so the cost is O(line_size) regardless of board size.
/// Returns 0 when the cell is empty.
pub fn longest_run_through(
    board: &[u8],
    width: usize,
    height: usize,
    row: usize,
    col: usize,
    line_size: usize,
) -> usize {
    let player = board[row * width + col];
    if player == 0 {
        return 0;
    }
    let reach = line_size.saturating_sub(1);
    let mut best = 0;
    for &(dr, dc) in AXES.iter() {
        let run = 1
            + count_direction(board, width, height, row, col, (dr, dc), player, reach)
            + count_direction(board, width, height, row, col, (-dr, -dc), player, reach);
        if run > best {
            best = run;
        }
        if best >= line_size {
            return line_size;
        }
    }
    best
}

/// Checks whether the mark at `(row, col)` completes a line of `line_size`.
///
/// # Arguments
/// * `board` - Row-major cell values (0 means empty)
/// * `width` - Board width
/// * `height` - Board height
/// * `row`, `col` - The cell that was just filled
/// * `line_size` - Number of consecutive pieces needed to win
pub fn completes_line(
    board: &[u8],
    width: usize,
    height: usize,
    row: usize,
    col: usize,
    line_size: usize,
) -> bool {
    line_size > 0 && longest_run_through(board, width, height, row, col, line_size) >= line_size
}
