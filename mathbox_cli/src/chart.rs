//! Text rendering of a [`GraphPlot`].

use mathbox_core::calculator::format_number;
use mathbox_core::expression::GraphPlot;

/// Draw `plot` on a `width` x `height` character grid with axes.
///
/// Gaps are left blank. Returns `None` when nothing can be drawn.
pub fn render(plot: &GraphPlot, width: usize, height: usize) -> Option<String> {
    if plot.error.is_some() || plot.points.len() < 2 {
        return None;
    }
    let width = width.max(2);
    let height = height.max(2);
    let (mut y_min, mut y_max) = plot.y_bounds()?;
    if y_max - y_min < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    let mut grid = vec![vec![' '; width]; height];
    let row_of = |y: f64| ((y_max - y) / (y_max - y_min) * (height - 1) as f64).round() as usize;
    let col_of = |x: f64| ((x - plot.x_min) / (plot.x_max - plot.x_min) * (width - 1) as f64).round() as usize;

    if (y_min..=y_max).contains(&0.0) {
        let axis = row_of(0.0);
        grid[axis].iter_mut().for_each(|c| *c = '-');
    }
    if (plot.x_min..=plot.x_max).contains(&0.0) {
        let axis = col_of(0.0);
        for row in grid.iter_mut() {
            row[axis] = if row[axis] == '-' { '+' } else { '|' };
        }
    }

    let last = plot.points.len() - 1;
    for (i, point) in plot.points.iter().enumerate() {
        let Some(y) = point.y else { continue };
        let col = (i * (width - 1) + last / 2) / last;
        grid[row_of(y)][col] = '*';
    }

    let mut out = format!(
        "y = {}   x: [{}, {}]   y: [{}, {}]\n",
        plot.equation,
        format_number(plot.x_min),
        format_number(plot.x_max),
        format_number(y_min),
        format_number(y_max),
    );
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathbox_core::expression::plot;

    #[test]
    fn parabola_touches_bottom_and_top() {
        let chart = render(&plot("x^2", "-10", "10"), 41, 11).unwrap();
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines.len(), 12);
        assert!(lines[0].starts_with("y = x^2"));
        // vertex at the origin sits on the bottom row, both ends on the top
        assert!(lines[11].contains('*'));
        assert!(lines[1].starts_with('*'));
        assert!(lines[1].ends_with('*'));
    }

    #[test]
    fn axes_cross_at_origin() {
        let chart = render(&plot("sin(x)", "-10", "10"), 21, 9).unwrap();
        assert!(chart.contains('+') || chart.contains('*'));
        assert!(chart.contains('|'));
        assert!(chart.contains('-'));
    }

    #[test]
    fn invalid_equation_draws_nothing() {
        assert!(render(&plot("x +* 2", "-10", "10"), 40, 10).is_none());
    }

    #[test]
    fn flat_line_is_padded() {
        let chart = render(&plot("3", "0", "1"), 10, 5).unwrap();
        assert!(chart.starts_with("y = 3   x: [0, 1]   y: [2, 4]"));
    }
}
