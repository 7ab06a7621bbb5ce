//! Shape broadcasting: trailing-axis alignment with size-1 stretching.
//!
//! Two extents are compatible when they are equal or one of them is 1;
//! missing leading axes count as 1. Stretched and newly inserted axes get
//! stride 0, so a broadcast view repeats elements without copying. A write
//! through a stretched axis lands on every logical position along it.

use crate::array::NdArray;
use crate::element::Element;
use crate::layout::Layout;
use crate::{NdError, Result};

/// Common shape of two dim lists, or an error when they are incompatible.
pub fn broadcast_dims(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let rank = a.len().max(b.len());
    let mut out = vec![0usize; rank];
    for i in 0..rank {
        let da = leading_padded(a, rank, i);
        let db = leading_padded(b, rank, i);
        out[i] = if da == db {
            da
        } else if da == 1 {
            db
        } else if db == 1 {
            da
        } else {
            return Err(NdError::BroadcastMismatch(a.to_vec(), b.to_vec()));
        };
    }
    Ok(out)
}

/// Common shape of any number of dim lists (left fold of [`broadcast_dims`]).
pub fn broadcast_shapes(shapes: &[&[usize]]) -> Result<Vec<usize>> {
    let mut common: Vec<usize> = Vec::new();
    for dims in shapes {
        common = broadcast_dims(&common, dims)?;
    }
    Ok(common)
}

/// Layout viewing `layout`'s elements under `target` dims: stride 0 on every
/// stretched axis and every new leading axis.
pub fn broadcast_layout(layout: &Layout, target: &[usize]) -> Result<Layout> {
    let rank = layout.rank();
    if target.len() < rank {
        return Err(NdError::BroadcastMismatch(
            layout.dims().to_vec(),
            target.to_vec(),
        ));
    }
    let lead = target.len() - rank;
    let mut strides = vec![0isize; target.len()];
    for axis in 0..rank {
        let d = layout.dims()[axis];
        let t = target[lead + axis];
        strides[lead + axis] = if d == t {
            layout.strides()[axis]
        } else if d == 1 {
            0
        } else {
            return Err(NdError::BroadcastMismatch(
                layout.dims().to_vec(),
                target.to_vec(),
            ));
        };
    }
    Ok(Layout::from_parts(
        target.to_vec(),
        strides,
        layout.offset(),
    ))
}

/// Views of all inputs under their common broadcast shape. No copies; every
/// output aliases its input's buffer.
pub fn broadcast_arrays<T: Element>(arrays: &[&NdArray<T>]) -> Result<Vec<NdArray<T>>> {
    let dim_lists: Vec<&[usize]> = arrays.iter().map(|a| a.dims()).collect();
    let common = broadcast_shapes(&dim_lists)?;
    arrays.iter().map(|a| a.broadcast_to(&common)).collect()
}

impl<T: Element> NdArray<T> {
    /// View of this array stretched to `target` dims.
    pub fn broadcast_to(&self, target: &[usize]) -> Result<NdArray<T>> {
        Ok(self.with_layout(broadcast_layout(self.layout(), target)?))
    }
}

#[inline]
fn leading_padded(dims: &[usize], rank: usize, i: usize) -> usize {
    let lead = rank - dims.len();
    if i < lead {
        1
    } else {
        dims[i - lead]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_alignment() {
        assert_eq!(broadcast_dims(&[4, 3], &[3]).unwrap(), vec![4, 3]);
        assert_eq!(broadcast_dims(&[4, 1], &[3]).unwrap(), vec![4, 3]);
        assert_eq!(broadcast_dims(&[], &[2, 2]).unwrap(), vec![2, 2]);
        assert_eq!(
            broadcast_dims(&[1, 1, 3], &[1, 3, 1]).unwrap(),
            vec![1, 3, 3]
        );
    }

    #[test]
    fn incompatible_extents_fail() {
        assert!(matches!(
            broadcast_dims(&[3], &[2]),
            Err(NdError::BroadcastMismatch(_, _))
        ));
        assert!(broadcast_dims(&[4, 3], &[4, 2]).is_err());
    }

    #[test]
    fn n_ary_fold() {
        assert_eq!(
            broadcast_shapes(&[&[2, 1], &[1, 3], &[3]]).unwrap(),
            vec![2, 3]
        );
        assert_eq!(broadcast_shapes(&[]).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn broadcast_layout_inserts_zero_strides() {
        let l = Layout::row_major(&[3]);
        let b = broadcast_layout(&l, &[2, 3]).unwrap();
        assert_eq!(b.dims(), &[2, 3]);
        assert_eq!(b.strides(), &[0, 1]);

        let l = Layout::row_major(&[3, 1]);
        let b = broadcast_layout(&l, &[3, 4]).unwrap();
        assert_eq!(b.strides(), &[1, 0]);

        assert!(broadcast_layout(&l, &[3]).is_err());
        assert!(broadcast_layout(&l, &[4, 4]).is_err());
    }

    #[test]
    fn broadcast_view_repeats_without_copy() {
        let row = NdArray::from_vec(vec![1i64, 2, 3]);
        let grid = row.broadcast_to(&[2, 3]).unwrap();
        assert_eq!(grid.to_vec(), vec![1, 2, 3, 1, 2, 3]);
        assert!(grid.shares_buffer(&row));
        // A write through the stretched axis aliases both logical rows.
        grid.set_at(&[0, 1], 9).unwrap();
        assert_eq!(grid.at(&[1, 1]).unwrap(), 9);
        assert_eq!(row.to_vec(), vec![1, 9, 3]);
    }
}
