//! Tree-drawing for the flat pre-order output
//!
//! Every line is created assuming it is the last child of its parent, so it
//! carries a single `└` connector at the column matching its depth. Once the
//! whole output is known, [`convert_to_tree`] walks it once and turns those
//! assumptions into proper `├` / `│` connectors.

/// Connector drawn in front of the last child of a parent
pub const LAST_BRANCH: char = '└';
/// Connector drawn in front of a child that has a following sibling
pub const BRANCH: char = '├';
/// Continuation drawn in the columns of still-open parents
pub const VERTICAL: char = '│';
/// Columns used per depth level
pub const INDENT_WIDTH: usize = 4;

/// Annotation appended to an occurrence that closes a cycle
pub const CIRCULAR_MARKER: &str = " ↔ Circular Reference";
/// Annotation appended to an occurrence that was already displayed
pub const PROCESSED_MARKER: &str = " ↔ Processed Group";

/// Build the initial display line for `name` at `depth`
///
/// The root (depth 0) is the bare name.
pub fn indent(name: &str, depth: usize) -> String {
    if depth == 0 {
        return name.to_string();
    }

    let padding = INDENT_WIDTH * depth - INDENT_WIDTH;
    let mut line = String::with_capacity(padding + INDENT_WIDTH * 3 + name.len());
    line.extend(std::iter::repeat(' ').take(padding));
    line.push(LAST_BRANCH);
    line.push_str("── ");
    line.push_str(name);
    line
}

/// Rewrite the connectors of a pre-order list of display lines in place
///
/// For every line with a `└` at column `c`, the preceding lines are scanned
/// backwards: blanks at `c` become `│`, and the first `└` found at `c`
/// (the previous sibling) becomes `├`. Any other character at `c` is the
/// parent's label and ends the scan.
pub fn convert_to_tree(lines: &mut [String]) {
    let mut grid: Vec<Vec<char>> = lines.iter().map(|line| line.chars().collect()).collect();

    for i in 0..grid.len() {
        let Some(column) = grid[i].iter().position(|&c| c == LAST_BRANCH) else {
            continue;
        };

        for row in grid[..i].iter_mut().rev() {
            match row.get(column).copied() {
                Some(c) if c.is_whitespace() => row[column] = VERTICAL,
                Some(LAST_BRANCH) => {
                    row[column] = BRANCH;
                    break;
                }
                _ => break,
            }
        }
    }

    for (line, chars) in lines.iter_mut().zip(grid) {
        *line = chars.into_iter().collect();
    }
}
