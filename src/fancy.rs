//! Index-array selection: gather (read) and scatter (write).
//!
//! A single index array selects either individual elements (element-wise
//! mode, when the index array's rank is at least the source's) or whole
//! subarrays along axis 0 (when its rank is smaller). Several index arrays
//! are broadcast to a common shape and select one coordinate per position.
//!
//! Index bounds are strict: unlike range slicing, an out-of-range index is
//! an error, not a clamp. Every index is validated before the first write,
//! so a failed scatter leaves the buffer untouched.

use crate::array::{normalize_index, NdArray};
use crate::broadcast::broadcast_shapes;
use crate::coords::CoordIter;
use crate::element::{Element, IndexElement};
use crate::{NdError, Result};

impl<T: Element> NdArray<T> {
    /// Select by one index array.
    ///
    /// Element-wise mode (`index.ndim() >= self.ndim()`): every index value
    /// picks one position in the row-major logical order of `self`; the
    /// result has the index array's shape. Axis mode (`index.ndim() <
    /// self.ndim()`): every index value picks a full subarray along axis 0;
    /// the result's shape is `index.dims() ++ self.dims()[1..]`.
    ///
    /// Negative indices count from the end; out of bounds is an error. The
    /// result is a fresh array, never a view.
    pub fn gather<I: IndexElement>(&self, index: &NdArray<I>) -> Result<NdArray<T>> {
        if index.ndim() >= self.ndim() {
            self.gather_elementwise(index)
        } else {
            self.gather_axis(index)
        }
    }

    fn gather_elementwise<I: IndexElement>(&self, index: &NdArray<I>) -> Result<NdArray<T>> {
        let positions = self.resolve_flat_indices(index)?;
        let data = positions.iter().map(|&k| self.get_flat(k)).collect();
        NdArray::from_vec_shaped(data, index.dims())
    }

    fn gather_axis<I: IndexElement>(&self, index: &NdArray<I>) -> Result<NdArray<T>> {
        let picks = resolve_axis_indices(index, self.dims()[0])?;
        let mut out_dims = index.dims().to_vec();
        out_dims.extend_from_slice(&self.dims()[1..]);
        let mut data = Vec::with_capacity(out_dims.iter().product());
        for &i in &picks {
            data.extend(self.subview(&[i as isize])?.to_vec());
        }
        NdArray::from_vec_shaped(data, &out_dims)
    }

    /// Select by several index arrays, one coordinate component each.
    ///
    /// The index arrays are broadcast to a common shape. With as many arrays
    /// as axes, every position of the common shape selects one element; with
    /// fewer, it selects the subarray over the remaining axes (result shape
    /// `common ++ self.dims()[n..]`). More arrays than axes is an error.
    pub fn gather_many<I: IndexElement>(&self, indices: &[&NdArray<I>]) -> Result<NdArray<T>> {
        let n = indices.len();
        if n > self.ndim() {
            return Err(NdError::TooManyIndices {
                given: n,
                rank: self.ndim(),
            });
        }
        if n == 0 {
            return Ok(self.clone());
        }
        if n == 1 {
            return self.gather(indices[0]);
        }
        let dim_lists: Vec<&[usize]> = indices.iter().map(|a| a.dims()).collect();
        let common = broadcast_shapes(&dim_lists)?;
        let views: Vec<NdArray<I>> = indices
            .iter()
            .map(|a| a.broadcast_to(&common))
            .collect::<Result<_>>()?;

        if n == self.ndim() {
            let mut data = Vec::with_capacity(common.iter().product());
            let mut it = CoordIter::new(&common);
            while let Some(c) = it.advance() {
                let sel = selection_at(&views, c);
                data.push(self.at(&sel)?);
            }
            NdArray::from_vec_shaped(data, &common)
        } else {
            let mut out_dims = common.clone();
            out_dims.extend_from_slice(&self.dims()[n..]);
            let mut data = Vec::with_capacity(out_dims.iter().product());
            let mut it = CoordIter::new(&common);
            while let Some(c) = it.advance() {
                let sel = selection_at(&views, c);
                data.extend(self.subview(&sel)?.to_vec());
            }
            NdArray::from_vec_shaped(data, &out_dims)
        }
    }

    /// [`gather`](NdArray::gather) into a caller-supplied array, whose dims
    /// must match the result exactly. `out` may be any view, including one
    /// aliasing `self`; nothing is written if validation fails.
    pub fn gather_into<I: IndexElement>(
        &self,
        index: &NdArray<I>,
        out: &NdArray<T>,
    ) -> Result<()> {
        let result = self.gather(index)?;
        write_gather_result(&result, out)
    }

    /// [`gather_many`](NdArray::gather_many) into a caller-supplied array.
    pub fn gather_many_into<I: IndexElement>(
        &self,
        indices: &[&NdArray<I>],
        out: &NdArray<T>,
    ) -> Result<()> {
        let result = self.gather_many(indices)?;
        write_gather_result(&result, out)
    }

    /// Write `values` at the positions a single index array selects, the
    /// mirror of [`gather`](NdArray::gather). `values` is broadcast to the
    /// selection's shape. All indices are validated before the first write.
    pub fn scatter<I: IndexElement>(
        &self,
        index: &NdArray<I>,
        values: &NdArray<T>,
    ) -> Result<()> {
        if index.ndim() >= self.ndim() {
            let positions = self.resolve_flat_indices(index)?;
            let vals = values.broadcast_to(index.dims())?.to_vec();
            for (&k, v) in positions.iter().zip(vals) {
                self.set_flat(k, v);
            }
        } else {
            let head = self.dims()[0];
            let picks = resolve_axis_indices(index, head)?;
            let mut sub_dims = index.dims().to_vec();
            sub_dims.extend_from_slice(&self.dims()[1..]);
            let vals = values.broadcast_to(&sub_dims)?;
            let mut targets = Vec::with_capacity(picks.len());
            for &i in &picks {
                targets.push(self.subview(&[i as isize])?);
            }
            let mut it = CoordIter::new(index.dims());
            let mut j = 0usize;
            while let Some(c) = it.advance() {
                let lead: Vec<isize> = c.iter().map(|&v| v as isize).collect();
                targets[j].assign(&vals.subview(&lead)?)?;
                j += 1;
            }
        }
        Ok(())
    }

    /// Scatter a single value to every selected position.
    pub fn scatter_value<I: IndexElement>(&self, index: &NdArray<I>, value: T) -> Result<()> {
        self.scatter(index, &NdArray::from_elem(&[], value))
    }

    /// Write `values` at the coordinates several index arrays select, the
    /// mirror of [`gather_many`](NdArray::gather_many). All coordinates are
    /// resolved before the first write.
    pub fn scatter_many<I: IndexElement>(
        &self,
        indices: &[&NdArray<I>],
        values: &NdArray<T>,
    ) -> Result<()> {
        let n = indices.len();
        if n > self.ndim() {
            return Err(NdError::TooManyIndices {
                given: n,
                rank: self.ndim(),
            });
        }
        if n == 0 {
            return self.assign(&values.broadcast_to(self.dims())?);
        }
        if n == 1 {
            return self.scatter(indices[0], values);
        }
        let dim_lists: Vec<&[usize]> = indices.iter().map(|a| a.dims()).collect();
        let common = broadcast_shapes(&dim_lists)?;
        let views: Vec<NdArray<I>> = indices
            .iter()
            .map(|a| a.broadcast_to(&common))
            .collect::<Result<_>>()?;

        if n == self.ndim() {
            // Resolve every target coordinate, then write.
            let mut resolved: Vec<Vec<usize>> = Vec::with_capacity(common.iter().product());
            let mut it = CoordIter::new(&common);
            while let Some(c) = it.advance() {
                let sel = selection_at(&views, c);
                let mut coords = Vec::with_capacity(sel.len());
                for (axis, &s) in sel.iter().enumerate() {
                    coords.push(normalize_index(s, self.dims()[axis])?);
                }
                resolved.push(coords);
            }
            let vals = values.broadcast_to(&common)?.to_vec();
            for (coords, v) in resolved.iter().zip(vals) {
                self.set_at_coords(coords, v);
            }
        } else {
            let mut out_dims = common.clone();
            out_dims.extend_from_slice(&self.dims()[n..]);
            let vals = values.broadcast_to(&out_dims)?;
            let mut targets = Vec::with_capacity(common.iter().product());
            let mut it = CoordIter::new(&common);
            while let Some(c) = it.advance() {
                let sel = selection_at(&views, c);
                targets.push((self.subview(&sel)?, c.to_vec()));
            }
            for (target, c) in targets {
                let lead: Vec<isize> = c.iter().map(|&v| v as isize).collect();
                target.assign(&vals.subview(&lead)?)?;
            }
        }
        Ok(())
    }

    /// Normalize every value of an element-wise index array against this
    /// array's logical size, upfront.
    fn resolve_flat_indices<I: IndexElement>(&self, index: &NdArray<I>) -> Result<Vec<usize>> {
        let size = self.len();
        let mut positions = Vec::with_capacity(index.len());
        for v in index.to_vec() {
            let raw = v.as_index();
            let mut k = raw;
            if k < 0 {
                k += size as i64;
            }
            if k < 0 || k >= size as i64 {
                return Err(NdError::FlatIndexOutOfBounds { index: raw, size });
            }
            positions.push(k as usize);
        }
        Ok(positions)
    }
}

fn resolve_axis_indices<I: IndexElement>(index: &NdArray<I>, axis_len: usize) -> Result<Vec<usize>> {
    index
        .to_vec()
        .into_iter()
        .map(|v| {
            let raw = v.as_index();
            normalize_index(raw as isize, axis_len)
        })
        .collect()
}

fn selection_at<I: IndexElement>(views: &[NdArray<I>], coord: &[usize]) -> Vec<isize> {
    views
        .iter()
        .map(|v| v.get_at(coord).as_index() as isize)
        .collect()
}

fn write_gather_result<T: Element>(result: &NdArray<T>, out: &NdArray<T>) -> Result<()> {
    if out.dims() != result.dims() {
        return Err(NdError::ShapeMismatch {
            expected: result.dims().to_vec(),
            got: out.dims().to_vec(),
        });
    }
    out.assign(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arange(n: usize) -> NdArray<i64> {
        NdArray::from_vec((0..n as i64).collect())
    }

    #[test]
    fn elementwise_gather_uses_flat_positions() {
        let x = arange(6);
        let picked = x.gather(&NdArray::from_vec(vec![5i64, 0, -1])).unwrap();
        assert_eq!(picked.to_vec(), vec![5, 0, 5]);
    }

    #[test]
    fn elementwise_gather_when_index_rank_reaches_source_rank() {
        let p = arange(6).reshape(&[2, 3]).unwrap();
        let idx = NdArray::from_vec_shaped(vec![5i64, 0, 1, 2, 2, 4], &[2, 3]).unwrap();
        let picked = p.gather(&idx).unwrap();
        assert_eq!(picked.dims(), &[2, 3]);
        assert_eq!(picked.to_vec(), vec![5, 0, 1, 2, 2, 4]);
    }

    #[test]
    fn axis_gather_picks_rows() {
        let p = arange(6).reshape(&[2, 3]).unwrap();
        let rows = p.gather(&NdArray::from_vec(vec![1i64, -2, 1])).unwrap();
        assert_eq!(rows.dims(), &[3, 3]);
        assert_eq!(rows.to_vec(), vec![3, 4, 5, 0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn gather_result_never_aliases() {
        let x = arange(4);
        let g = x.gather(&NdArray::from_vec(vec![0i64, 1])).unwrap();
        g.set_at(&[0], 99).unwrap();
        assert_eq!(x.to_vec(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn gather_respects_view_order() {
        let x = arange(5).flip(0).unwrap();
        let picked = x.gather(&NdArray::from_vec(vec![0i64, 4])).unwrap();
        assert_eq!(picked.to_vec(), vec![4, 0]);
    }

    #[test]
    fn scatter_elementwise_and_value() {
        let x = arange(6);
        x.scatter(
            &NdArray::from_vec(vec![0i64, -1]),
            &NdArray::from_vec(vec![99i64, 77]),
        )
        .unwrap();
        assert_eq!(x.to_vec(), vec![99, 1, 2, 3, 4, 77]);

        x.scatter_value(&NdArray::from_vec(vec![1i64, 2]), 0).unwrap();
        assert_eq!(x.to_vec(), vec![99, 0, 0, 3, 4, 77]);
    }

    #[test]
    fn scatter_axis_mode_writes_rows() {
        let p = arange(6).reshape(&[2, 3]).unwrap();
        p.scatter(
            &NdArray::from_vec(vec![1i64]),
            &NdArray::from_vec(vec![7i64, 8, 9]),
        )
        .unwrap();
        assert_eq!(p.to_vec(), vec![0, 1, 2, 7, 8, 9]);
    }

    #[test]
    fn scatter_many_sets_coordinates() {
        let p = arange(9).reshape(&[3, 3]).unwrap();
        let d = NdArray::from_vec(vec![0i64, 1, 2]);
        p.scatter_many(&[&d, &d], &NdArray::from_elem(&[], 0i64))
            .unwrap();
        assert_eq!(p.to_vec(), vec![0, 1, 2, 3, 0, 5, 6, 7, 0]);
    }
}
