//! The array type: a shared buffer plus a strided layout.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use num_traits::{NumCast, ToPrimitive};

use crate::coords::CoordIter;
use crate::element::Element;
use crate::layout::Layout;
use crate::slice::{parse_selection, Slice};
use crate::{NdError, Result};

/// N-dimensional array over a shared contiguous buffer.
///
/// Cloning an `NdArray` is cheap and produces an *alias*: both handles share
/// the same buffer, and writes through either are visible through the other.
/// Slicing, [`permute`](NdArray::permute), [`flip`](NdArray::flip) and
/// broadcasting return aliasing views the same way. Use
/// [`copy`](NdArray::copy) for an independent duplicate.
///
/// The buffer is `Rc`-shared: arrays are `!Send` and all aliasing is confined
/// to one thread.
pub struct NdArray<T> {
    buf: Rc<RefCell<Vec<T>>>,
    layout: Layout,
}

impl<T> Clone for NdArray<T> {
    fn clone(&self) -> Self {
        Self {
            buf: Rc::clone(&self.buf),
            layout: self.layout.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for NdArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdArray")
            .field("dims", &self.layout.dims())
            .field("strides", &self.layout.strides())
            .field("offset", &self.layout.offset())
            .finish()
    }
}

impl<T: Element> NdArray<T> {
    /// 1-D array owning `data`.
    pub fn from_vec(data: Vec<T>) -> Self {
        let layout = Layout::row_major(&[data.len()]);
        Self {
            buf: Rc::new(RefCell::new(data)),
            layout,
        }
    }

    /// Array of shape `dims` owning `data` in row-major order.
    pub fn from_vec_shaped(data: Vec<T>, dims: &[usize]) -> Result<Self> {
        if data.len() != dims.iter().product::<usize>() {
            return Err(NdError::ReshapeMismatch {
                size: data.len(),
                dims: dims.to_vec(),
            });
        }
        Ok(Self {
            buf: Rc::new(RefCell::new(data)),
            layout: Layout::row_major(dims),
        })
    }

    /// Array of shape `dims` with every element equal to `value`.
    pub fn from_elem(dims: &[usize], value: T) -> Self {
        let size = dims.iter().product();
        Self {
            buf: Rc::new(RefCell::new(vec![value; size])),
            layout: Layout::row_major(dims),
        }
    }

    /// Array of shape `dims` built by calling `f` on every coordinate in
    /// row-major order.
    pub fn from_fn(dims: &[usize], mut f: impl FnMut(&[usize]) -> T) -> Self {
        let mut data = Vec::with_capacity(dims.iter().product());
        let mut it = CoordIter::new(dims);
        while let Some(c) = it.advance() {
            data.push(f(c));
        }
        Self {
            buf: Rc::new(RefCell::new(data)),
            layout: Layout::row_major(dims),
        }
    }

    /// Alias of the same buffer under a different layout.
    pub(crate) fn with_layout(&self, layout: Layout) -> Self {
        Self {
            buf: Rc::clone(&self.buf),
            layout,
        }
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        self.layout.dims()
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.rank()
    }

    /// Number of logical elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Whether `other` aliases the same buffer.
    pub fn shares_buffer(&self, other: &NdArray<T>) -> bool {
        Rc::ptr_eq(&self.buf, &other.buf)
    }

    // ------------------------------------------------------------------
    // Element access
    // ------------------------------------------------------------------

    /// Read one element at full-rank coordinates. Negative coordinates count
    /// from the end of their axis; out of bounds after normalization is an
    /// error.
    ///
    /// # Panics
    /// Panics if `coords.len() != self.ndim()`.
    pub fn at(&self, coords: &[isize]) -> Result<T> {
        let pos = self.resolve_coords(coords)?;
        Ok(self.buf.borrow()[pos])
    }

    /// Write one element at full-rank coordinates, with the same coordinate
    /// rules as [`at`](NdArray::at). The write lands in the shared buffer and
    /// is visible through every alias.
    ///
    /// # Panics
    /// Panics if `coords.len() != self.ndim()`.
    pub fn set_at(&self, coords: &[isize], value: T) -> Result<()> {
        let pos = self.resolve_coords(coords)?;
        self.buf.borrow_mut()[pos] = value;
        Ok(())
    }

    fn resolve_coords(&self, coords: &[isize]) -> Result<usize> {
        assert_eq!(coords.len(), self.ndim(), "wrong number of indices");
        let mut pos = self.layout.offset() as isize;
        for (axis, (&c, &s)) in coords
            .iter()
            .zip(self.layout.strides())
            .enumerate()
        {
            let i = normalize_index(c, self.layout.dims()[axis])?;
            pos += i as isize * s;
        }
        Ok(pos as usize)
    }

    /// The single element of a size-1 array.
    pub fn item(&self) -> Result<T> {
        if self.len() != 1 {
            return Err(NdError::ShapeMismatch {
                expected: vec![1],
                got: self.dims().to_vec(),
            });
        }
        let pos = self.layout.flat_index_of_nth(0);
        Ok(self.buf.borrow()[pos])
    }

    /// View with the leading axes fixed at `coords` (negative coordinates
    /// allowed). Rank drops by `coords.len()`.
    pub fn subview(&self, coords: &[isize]) -> Result<NdArray<T>> {
        let slices: Vec<Slice> = coords.iter().map(|&c| Slice::Index(c)).collect();
        self.slice(&slices)
    }

    /// Element at in-bounds unsigned coordinates (no negative handling).
    pub(crate) fn get_at(&self, coords: &[usize]) -> T {
        self.buf.borrow()[self.layout.flat_index(coords)]
    }

    pub(crate) fn set_at_coords(&self, coords: &[usize], value: T) {
        let pos = self.layout.flat_index(coords);
        self.buf.borrow_mut()[pos] = value;
    }

    /// The `k`-th element in row-major logical order.
    pub(crate) fn get_flat(&self, k: usize) -> T {
        self.buf.borrow()[self.layout.flat_index_of_nth(k)]
    }

    pub(crate) fn set_flat(&self, k: usize, value: T) {
        let pos = self.layout.flat_index_of_nth(k);
        self.buf.borrow_mut()[pos] = value;
    }

    // ------------------------------------------------------------------
    // Slicing and layout transforms
    // ------------------------------------------------------------------

    /// View selected by a per-axis slice list. Shares the buffer; no copy.
    pub fn slice(&self, slices: &[Slice]) -> Result<NdArray<T>> {
        Ok(self.with_layout(self.layout.compose(slices)?))
    }

    /// View selected by slice notation, e.g. `"1:5"`, `"::2, -1"`, `"..., 0"`.
    pub fn slice_expr(&self, expr: &str) -> Result<NdArray<T>> {
        self.slice(&parse_selection(expr)?)
    }

    /// Same elements under a new shape. Zero-copy view when the array is
    /// contiguous; otherwise the elements are compacted first.
    pub fn reshape(&self, dims: &[usize]) -> Result<NdArray<T>> {
        if self.len() != dims.iter().product::<usize>() {
            return Err(NdError::ReshapeMismatch {
                size: self.len(),
                dims: dims.to_vec(),
            });
        }
        if self.is_contiguous() {
            let layout = Layout::row_major(dims).with_offset(self.layout.offset());
            Ok(self.with_layout(layout))
        } else {
            let compact = self.copy();
            Ok(compact.with_layout(Layout::row_major(dims)))
        }
    }

    /// View with axes reordered by `perm`.
    pub fn permute(&self, perm: &[usize]) -> Result<NdArray<T>> {
        Ok(self.with_layout(self.layout.permute(perm)?))
    }

    /// View with the axis order reversed.
    pub fn transpose(&self) -> NdArray<T> {
        let dims: Vec<usize> = self.dims().iter().rev().copied().collect();
        let strides: Vec<isize> = self.strides().iter().rev().copied().collect();
        self.with_layout(Layout::from_parts(dims, strides, self.offset()))
    }

    /// View with one axis reversed.
    pub fn flip(&self, axis: usize) -> Result<NdArray<T>> {
        Ok(self.with_layout(self.layout.flip(axis)?))
    }

    // ------------------------------------------------------------------
    // Materialization
    // ------------------------------------------------------------------

    /// Elements in row-major logical order.
    pub fn to_vec(&self) -> Vec<T> {
        let buf = self.buf.borrow();
        let mut out = Vec::with_capacity(self.len());
        let mut it = CoordIter::new(self.dims());
        while let Some(c) = it.advance() {
            out.push(buf[self.layout.flat_index(c)]);
        }
        out
    }

    /// Independent compact duplicate. Never aliases `self`.
    pub fn copy(&self) -> NdArray<T> {
        NdArray {
            buf: Rc::new(RefCell::new(self.to_vec())),
            layout: Layout::row_major(self.dims()),
        }
    }

    /// Write `value` to every logical position of the view.
    pub fn fill(&self, value: T) {
        let mut buf = self.buf.borrow_mut();
        let mut it = CoordIter::new(self.dims());
        while let Some(c) = it.advance() {
            let pos = self.layout.flat_index(c);
            buf[pos] = value;
        }
    }

    /// Element-wise copy from `src`, which must have identical dims.
    ///
    /// Both sides go through their layouts, so either may be a strided or
    /// broadcast view.
    pub fn assign(&self, src: &NdArray<T>) -> Result<()> {
        if self.dims() != src.dims() {
            return Err(NdError::ShapeMismatch {
                expected: self.dims().to_vec(),
                got: src.dims().to_vec(),
            });
        }
        let mut it = CoordIter::new(self.dims());
        while let Some(c) = it.advance() {
            let v = src.get_at(c);
            self.set_at_coords(c, v);
        }
        Ok(())
    }

    /// Convert every element to `U`, failing on the first value `U` cannot
    /// represent. Always allocates.
    pub fn cast<U>(&self) -> Result<NdArray<U>>
    where
        T: ToPrimitive,
        U: Element + NumCast,
    {
        let mut data = Vec::with_capacity(self.len());
        for v in self.to_vec() {
            data.push(U::from(v).ok_or(NdError::CastFailure {
                to: std::any::type_name::<U>(),
            })?);
        }
        Ok(NdArray {
            buf: Rc::new(RefCell::new(data)),
            layout: Layout::row_major(self.dims()),
        })
    }
}

/// Resolve one signed index against an axis length: negative counts from the
/// end, anything out of bounds after that is an error.
pub(crate) fn normalize_index(index: isize, size: usize) -> Result<usize> {
    let mut i = index as i64;
    if i < 0 {
        i += size as i64;
    }
    if i < 0 || i >= size as i64 {
        return Err(NdError::IndexOutOfBounds {
            index: index as i64,
            size,
        });
    }
    Ok(i as usize)
}
