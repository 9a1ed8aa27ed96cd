//! Cube decoding: flat row-major value array -> one labeled row per observation.
//!
//! For a flat index `k`, the category offset along dimension `i` is
//! `(k / stride[i]) % size[i]`, where `stride[i]` is the product of the sizes
//! of every dimension after `i`. Missing observations produce no row.

use std::sync::Arc;

use crate::model::{Cell, Dataset, Row};

/// Row-major strides: `stride[i] = size[i+1] * ... * size[n-1]`, last is 1.
pub fn strides(sizes: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; sizes.len()];
    for i in (0..sizes.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * sizes[i + 1];
    }
    strides
}

/// Resolved categories of one dimension, ready to be cloned into rows.
struct Axis {
    size: usize,
    stride: usize,
    cells: Vec<Cell>,
}

impl Axis {
    fn resolve(dataset: &Dataset, position: usize, stride: usize) -> Self {
        let id = &dataset.id[position];
        let size = dataset.size.get(position).copied().unwrap_or(0);
        let cells = match dataset.dimension.get(id) {
            Some(dimension) => dimension
                .category
                .ordered_codes()
                .into_iter()
                .map(|code| Cell {
                    label: dimension.category.label_for(&code).to_string(),
                    code,
                })
                .collect(),
            None => {
                log::warn!("dimension '{id}' is listed in id but has no metadata");
                Vec::new()
            }
        };
        Self { size, stride, cells }
    }

    fn cell_at(&self, flat_index: usize) -> Cell {
        flat_index
            .checked_div(self.stride)
            .and_then(|q| q.checked_rem(self.size))
            .and_then(|offset| self.cells.get(offset))
            .cloned()
            .unwrap_or_default()
    }
}

/// Decode every non-missing observation, in ascending flat-index order.
pub fn decode(dataset: &Dataset) -> Vec<Row> {
    let dimensions: Arc<[String]> = dataset.id.iter().cloned().collect();
    let axes: Vec<Axis> = strides(&dataset.size)
        .into_iter()
        .enumerate()
        .map(|(i, stride)| Axis::resolve(dataset, i, stride))
        .collect();

    let mut rows = Vec::with_capacity(dataset.observation_count());
    for (k, value) in dataset.value.iter().enumerate() {
        let Some(value) = *value else {
            continue;
        };
        let cells = axes.iter().map(|axis| axis.cell_at(k)).collect();
        rows.push(Row::from_parts(value, Arc::clone(&dimensions), cells));
    }

    log::debug!(
        "decoded {} row(s) from {} cell(s) across {} dimension(s)",
        rows.len(),
        dataset.value.len(),
        dataset.id.len(),
    );
    rows
}

/// Flat index a row's codes address in `dataset`, or `None` if any code is
/// unknown there. Inverse of [`decode`] for well-formed cubes.
pub fn flat_index(dataset: &Dataset, row: &Row) -> Option<usize> {
    let strides = strides(&dataset.size);
    let mut index = 0;
    for (i, id) in dataset.id.iter().enumerate() {
        let code = row.code(id)?;
        let codes = dataset.dimension.get(id)?.category.ordered_codes();
        let position = codes.iter().position(|c| c == code)?;
        if position >= *dataset.size.get(i)? {
            return None;
        }
        index += position * strides[i];
    }
    Some(index)
}
