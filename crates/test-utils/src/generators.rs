//! Generators for synthetic coordinate axes and lat/lon grids.
//!
//! All grids are returned in row-major order (row 0 first).

/// Evenly spaced axis: `start, start + step, ...` with `len` samples.
///
/// # Example
///
/// ```
/// use test_utils::create_axis;
///
/// let lat = create_axis(10.0, -0.5, 4);
/// assert_eq!(lat, vec![10.0, 9.5, 9.0, 8.5]);
/// ```
pub fn create_axis(start: f64, step: f64, len: usize) -> Vec<f64> {
    (0..len).map(|i| start + step * i as f64).collect()
}

/// Latitude grid whose rows run north to south from `north` in `step`
/// degree increments, constant along each row.
pub fn create_latitude_grid(width: usize, height: usize, north: f32, step: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let lat = north - step * row as f32;
        data.extend(std::iter::repeat(lat).take(width));
    }
    data
}

/// Longitude grid whose columns run west to east from `west` in `step`
/// degree increments, constant along each column.
pub fn create_longitude_grid(width: usize, height: usize, west: f32, step: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        for col in 0..width {
            data.push(west + step * col as f32);
        }
    }
    data
}

/// A grid where each cell encodes its own position as `row * 1000 + col`.
///
/// Useful for checking that rows land at the expected physical index.
pub fn create_index_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((row * 1000 + col) as f32);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_grid_rows_are_constant() {
        let grid = create_latitude_grid(3, 2, 50.0, 1.0);
        assert_eq!(grid, vec![50.0, 50.0, 50.0, 49.0, 49.0, 49.0]);
    }

    #[test]
    fn test_longitude_grid_columns_are_constant() {
        let grid = create_longitude_grid(3, 2, 4.0, 0.5);
        assert_eq!(grid, vec![4.0, 4.5, 5.0, 4.0, 4.5, 5.0]);
    }

    #[test]
    fn test_index_grid() {
        let grid = create_index_grid(4, 3);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[5], 1001.0);
        assert_eq!(grid[11], 2003.0);
    }
}
