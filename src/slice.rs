//! Python-style axis selectors: parsing and bounds resolution.
//!
//! A [`Slice`] is one axis of a selection, either built programmatically or
//! parsed from the usual notation (`"3"`, `"1:5"`, `"::2"`, `"..."`, `""`).
//! [`Slice::resolve`] binds a selector to a concrete axis length, producing a
//! [`ResolvedSlice`] with clamped bounds and an exact element count.
//!
//! Bounds handling is asymmetric on purpose, matching NumPy: a single index
//! out of range is an error, while a range silently clamps to what exists
//! (`a[0:77]` of a length-5 axis is the whole axis).

use std::str::FromStr;

use crate::{NdError, Result};

/// One-axis selector, before it is bound to an axis length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slice {
    /// A single position; collapses the axis. Negative values count from the
    /// end.
    Index(isize),
    /// `start:stop:step`. `None` bounds are open (filled in from the axis
    /// length and step direction at resolution time).
    Range {
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
    },
    /// `...`: consumes as many axes as needed to pad the selection to full
    /// rank.
    Ellipsis,
    /// An inserted size-1 axis (empty string in notation).
    NewAxis,
}

/// A selector bound to a concrete axis length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedSlice {
    /// Single in-bounds position; the axis is dropped from the result.
    Index(usize),
    /// `count` positions starting at `start`, `step` apart (step is in axis
    /// units and may be negative).
    Range {
        start: usize,
        step: isize,
        count: usize,
    },
    /// No positions selected.
    Empty,
}

impl ResolvedSlice {
    /// Number of result positions along this axis, or `None` when the axis is
    /// dropped.
    pub fn count(&self) -> Option<usize> {
        match *self {
            ResolvedSlice::Index(_) => None,
            ResolvedSlice::Range { count, .. } => Some(count),
            ResolvedSlice::Empty => Some(0),
        }
    }
}

impl Slice {
    /// The full-axis selector `:`.
    pub const fn full() -> Self {
        Slice::Range {
            start: None,
            stop: None,
            step: 1,
        }
    }

    /// `start:stop` with unit step.
    pub const fn range(start: isize, stop: isize) -> Self {
        Slice::Range {
            start: Some(start),
            stop: Some(stop),
            step: 1,
        }
    }

    /// `start:stop:step` with open bounds as `None`.
    pub const fn stepped(start: Option<isize>, stop: Option<isize>, step: isize) -> Self {
        Slice::Range { start, stop, step }
    }

    /// Parse one axis of slice notation. Equivalent to `str::parse`.
    pub fn parse(text: &str) -> Result<Self> {
        text.parse()
    }

    /// Bind this selector to an axis of length `axis_len`.
    ///
    /// Index selectors are strict: out of bounds after negative normalization
    /// is an error. Range selectors are forgiving: bounds clamp to the axis
    /// and an inverted range is simply empty.
    pub fn resolve(&self, axis_len: usize) -> Result<ResolvedSlice> {
        let len = axis_len as i64;
        match *self {
            // Placeholders carry no bounds of their own; they are expanded
            // during composition, before any axis resolution happens.
            Slice::Ellipsis => Err(NdError::InvalidSlice {
                expr: "...".to_string(),
                reason: "an ellipsis cannot be resolved against a single axis",
            }),
            Slice::NewAxis => Err(NdError::InvalidSlice {
                expr: String::new(),
                reason: "a new-axis marker cannot be resolved against a single axis",
            }),
            Slice::Index(raw) => {
                let mut idx = raw as i64;
                if idx < 0 {
                    idx += len;
                }
                if idx < 0 || idx >= len {
                    return Err(NdError::IndexOutOfBounds {
                        index: raw as i64,
                        size: axis_len,
                    });
                }
                Ok(ResolvedSlice::Index(idx as usize))
            }
            Slice::Range { step: 0, .. } => Ok(ResolvedSlice::Empty),
            Slice::Range { start, stop, step } if step > 0 => {
                let step = step as i64;
                let mut lo = start.map_or(0, |v| v as i64);
                if lo < 0 {
                    lo = if -lo <= len { lo + len } else { 0 };
                }
                let mut hi = stop.map_or(len, |v| v as i64);
                if hi < 0 {
                    hi = if -hi <= len { hi + len } else { 0 };
                }
                hi = hi.min(len);
                if lo >= hi {
                    return Ok(ResolvedSlice::Empty);
                }
                Ok(ResolvedSlice::Range {
                    start: lo as usize,
                    step: step as isize,
                    count: ((hi - lo) as u64).div_ceil(step as u64) as usize,
                })
            }
            Slice::Range { start, stop, step } => {
                // step < 0: walk from high to low; the open stop bound means
                // "through index 0 inclusive", encoded as the exclusive -1.
                let step = step as i64;
                let mut lo = match start {
                    None => len - 1,
                    Some(v) => {
                        let mut s = v as i64;
                        if s < 0 {
                            if -s <= len {
                                s += len;
                            } else {
                                return Ok(ResolvedSlice::Empty);
                            }
                        }
                        s
                    }
                };
                lo = lo.min(len - 1);
                let hi = match stop {
                    None => -1,
                    Some(v) => {
                        let mut s = v as i64;
                        if s < 0 {
                            s = if -s <= len { s + len } else { -1 };
                        }
                        s.min(len - 1)
                    }
                };
                if lo <= hi {
                    return Ok(ResolvedSlice::Empty);
                }
                Ok(ResolvedSlice::Range {
                    start: lo as usize,
                    step: step as isize,
                    count: ((lo - hi) as u64).div_ceil((-step) as u64) as usize,
                })
            }
        }
    }
}

impl FromStr for Slice {
    type Err = NdError;

    fn from_str(text: &str) -> Result<Self> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Ok(Slice::NewAxis);
        }
        if compact == "..." {
            return Ok(Slice::Ellipsis);
        }
        let parts: Vec<&str> = compact.split(':').collect();
        match parts.as_slice() {
            [index] => Ok(Slice::Index(parse_int(index, text)?)),
            [start, stop] => Ok(Slice::Range {
                start: parse_bound(start, text)?,
                stop: parse_bound(stop, text)?,
                step: 1,
            }),
            [start, stop, step] => Ok(Slice::Range {
                start: parse_bound(start, text)?,
                stop: parse_bound(stop, text)?,
                step: parse_bound(step, text)?.unwrap_or(1),
            }),
            _ => Err(invalid(text, "at most two ':' separators per axis")),
        }
    }
}

/// Parse a comma-separated multi-axis selection, one [`Slice`] per axis.
///
/// Empty segments (including the empty string itself) are new-axis markers.
pub fn parse_selection(expr: &str) -> Result<Vec<Slice>> {
    expr.split(',').map(|part| part.parse()).collect()
}

fn parse_bound(part: &str, expr: &str) -> Result<Option<isize>> {
    if part.is_empty() {
        Ok(None)
    } else {
        parse_int(part, expr).map(Some)
    }
}

/// Permissive integer parse: any run of leading `+`/`-` signs is accepted and
/// the net sign is their product.
fn parse_int(part: &str, expr: &str) -> Result<isize> {
    let bytes = part.as_bytes();
    let mut sign = 1i64;
    let mut pos = 0;
    while pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
        if bytes[pos] == b'-' {
            sign = -sign;
        }
        pos += 1;
    }
    let digits = &part[pos..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(expr, "expected an integer"));
    }
    let magnitude: i64 = digits
        .parse()
        .map_err(|_| invalid(expr, "integer out of range"))?;
    Ok((sign * magnitude) as isize)
}

fn invalid(expr: &str, reason: &'static str) -> NdError {
    NdError::InvalidSlice {
        expr: expr.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: usize, step: isize, count: usize) -> ResolvedSlice {
        ResolvedSlice::Range { start, step, count }
    }

    #[test]
    fn parse_axis_forms() {
        assert_eq!("3".parse::<Slice>().unwrap(), Slice::Index(3));
        assert_eq!("-1".parse::<Slice>().unwrap(), Slice::Index(-1));
        assert_eq!("".parse::<Slice>().unwrap(), Slice::NewAxis);
        assert_eq!("...".parse::<Slice>().unwrap(), Slice::Ellipsis);
        assert_eq!(":".parse::<Slice>().unwrap(), Slice::full());
        assert_eq!("::".parse::<Slice>().unwrap(), Slice::full());
        assert_eq!("1:5".parse::<Slice>().unwrap(), Slice::range(1, 5));
        assert_eq!(
            "1:".parse::<Slice>().unwrap(),
            Slice::stepped(Some(1), None, 1)
        );
        assert_eq!(
            ":5".parse::<Slice>().unwrap(),
            Slice::stepped(None, Some(5), 1)
        );
        assert_eq!(
            "::2".parse::<Slice>().unwrap(),
            Slice::stepped(None, None, 2)
        );
        assert_eq!(
            "8:2:-2".parse::<Slice>().unwrap(),
            Slice::stepped(Some(8), Some(2), -2)
        );
    }

    #[test]
    fn parse_is_whitespace_and_sign_tolerant() {
        assert_eq!(" -1 ".parse::<Slice>().unwrap(), Slice::Index(-1));
        assert_eq!(
            " 1 : 10 : 2 ".parse::<Slice>().unwrap(),
            Slice::stepped(Some(1), Some(10), 2)
        );
        assert_eq!("+3".parse::<Slice>().unwrap(), Slice::Index(3));
        assert_eq!("--3".parse::<Slice>().unwrap(), Slice::Index(3));
        assert_eq!("+-3".parse::<Slice>().unwrap(), Slice::Index(-3));
    }

    #[test]
    fn parse_rejects_malformed_text() {
        assert!("a".parse::<Slice>().is_err());
        assert!("1.5".parse::<Slice>().is_err());
        assert!("1:2:3:4".parse::<Slice>().is_err());
        assert!("..".parse::<Slice>().is_err());
        assert!("1:b".parse::<Slice>().is_err());
    }

    #[test]
    fn parse_multi_axis_selection() {
        assert_eq!(
            parse_selection("1,:").unwrap(),
            vec![Slice::Index(1), Slice::full()]
        );
        assert_eq!(
            parse_selection("-1, -1").unwrap(),
            vec![Slice::Index(-1), Slice::Index(-1)]
        );
        assert_eq!(
            parse_selection("..., 0").unwrap(),
            vec![Slice::Ellipsis, Slice::Index(0)]
        );
        // A bare empty segment inserts a new axis.
        assert_eq!(
            parse_selection(",:").unwrap(),
            vec![Slice::NewAxis, Slice::full()]
        );
        assert_eq!(parse_selection("").unwrap(), vec![Slice::NewAxis]);
    }

    #[test]
    fn resolve_index_is_strict() {
        assert_eq!(
            Slice::Index(2).resolve(5).unwrap(),
            ResolvedSlice::Index(2)
        );
        assert_eq!(
            Slice::Index(-1).resolve(5).unwrap(),
            ResolvedSlice::Index(4)
        );
        assert!(Slice::Index(5).resolve(5).is_err());
        assert!(Slice::Index(-6).resolve(5).is_err());
        assert!(Slice::Index(0).resolve(0).is_err());
    }

    #[test]
    fn resolve_range_is_forgiving() {
        assert_eq!(Slice::range(0, 77).resolve(5).unwrap(), range(0, 1, 5));
        assert_eq!(
            Slice::stepped(Some(-77), None, 1).resolve(5).unwrap(),
            range(0, 1, 5)
        );
        assert_eq!(Slice::range(5, 2).resolve(5).unwrap(), ResolvedSlice::Empty);
        assert_eq!(
            Slice::range(7, 9).resolve(5).unwrap(),
            ResolvedSlice::Empty
        );
        assert_eq!(Slice::range(-3, -1).resolve(5).unwrap(), range(2, 1, 2));
    }

    #[test]
    fn resolve_negative_step() {
        // Full reversal.
        assert_eq!(
            Slice::stepped(None, None, -1).resolve(5).unwrap(),
            range(4, -1, 5)
        );
        // High start clamps to the last element.
        assert_eq!(
            Slice::stepped(Some(77), None, -1).resolve(5).unwrap(),
            range(4, -1, 5)
        );
        // Far-negative start is before the beginning: nothing to take.
        assert_eq!(
            Slice::stepped(Some(-77), None, -1).resolve(5).unwrap(),
            ResolvedSlice::Empty
        );
        // Far-negative stop means "through index 0 inclusive".
        assert_eq!(
            Slice::stepped(None, Some(-77), -1).resolve(5).unwrap(),
            range(4, -1, 5)
        );
        assert_eq!(
            Slice::stepped(Some(8), Some(2), -2).resolve(10).unwrap(),
            range(8, -2, 3)
        );
        assert_eq!(
            Slice::stepped(Some(2), Some(8), -1).resolve(10).unwrap(),
            ResolvedSlice::Empty
        );
    }

    #[test]
    fn resolve_zero_step_is_empty() {
        assert_eq!(
            Slice::stepped(Some(1), Some(4), 0).resolve(5).unwrap(),
            ResolvedSlice::Empty
        );
    }

    #[test]
    fn resolve_zero_length_axis() {
        assert_eq!(Slice::full().resolve(0).unwrap(), ResolvedSlice::Empty);
        assert_eq!(
            Slice::stepped(None, None, -1).resolve(0).unwrap(),
            ResolvedSlice::Empty
        );
    }

    // Resolved counts must agree with manually walking start, start+step, ...
    // while the position stays inside the axis.
    #[test]
    fn resolve_count_matches_manual_walk() {
        let notations = [
            ":", "::", "::2", "::3", "::-1", "::-2", "1:", ":3", "1:7", "7:1", "1:7:2", "7:1:-2",
            "-1:", ":-2", "-5:-1", "-1:-5:-1", "0:77", "-77:", "77::-1", "5:5", "2:8:3",
        ];
        for len in 0usize..8 {
            for text in notations {
                let slice: Slice = text.parse().unwrap();
                let resolved = slice.resolve(len).unwrap();
                let walked = match resolved {
                    ResolvedSlice::Index(_) => unreachable!(),
                    ResolvedSlice::Empty => 0,
                    ResolvedSlice::Range { start, step, count } => {
                        let mut pos = start as i64;
                        let mut n = 0usize;
                        while pos >= 0 && pos < len as i64 && n < count {
                            n += 1;
                            pos += step as i64;
                        }
                        // The walk must also have been about to leave range.
                        assert!(pos < 0 || pos >= len as i64 || n == count);
                        n
                    }
                };
                let count = resolved.count().unwrap();
                assert_eq!(
                    count, walked,
                    "notation {text:?} against axis length {len}"
                );
            }
        }
    }
}
