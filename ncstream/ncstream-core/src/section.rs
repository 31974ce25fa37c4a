//! Slice requests over a variable's index space.

use std::{fmt, str::FromStr};

use crate::{error::SectionError, schema::DimLength};

/// One dimension of a [`Section`]: `start..stop` (exclusive) every `stride`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    start: u64,
    stop: u64,
    stride: u64,
}

impl Range {
    /// Create a range. Fails when `start > stop` or `stride == 0`.
    pub fn new(start: u64, stop: u64, stride: u64) -> Result<Self, SectionError> {
        if start > stop || stride == 0 {
            return Err(SectionError::InvalidRange {
                start,
                stop,
                stride,
            });
        }
        Ok(Self {
            start,
            stop,
            stride,
        })
    }

    /// Unit-stride range.
    pub fn span(start: u64, stop: u64) -> Result<Self, SectionError> {
        Self::new(start, stop, 1)
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn stop(&self) -> u64 {
        self.stop
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Number of selected indices: `ceil((stop - start) / stride)`.
    pub fn len(&self) -> u64 {
        (self.stop - self.start).div_ceil(self.stride)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    /// The `i`-th selected index.
    pub fn index(&self, i: u64) -> u64 {
        self.start + i * self.stride
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stride == 1 {
            write!(f, "{}:{}", self.start, self.stop)
        } else {
            write!(f, "{}:{}:{}", self.start, self.stop, self.stride)
        }
    }
}

/// Ordered list of [`Range`]s, one per dimension. An empty section selects
/// the whole variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Section {
    ranges: Vec<Range>,
}

impl Section {
    pub fn new(ranges: Vec<Range>) -> Self {
        Self { ranges }
    }

    /// The "whole variable" section.
    pub fn whole() -> Self {
        Self::default()
    }

    /// Section selecting every index of `shape`.
    pub fn from_shape(shape: &[u64]) -> Self {
        Self {
            ranges: shape
                .iter()
                .map(|&n| Range {
                    start: 0,
                    stop: n,
                    stride: 1,
                })
                .collect(),
        }
    }

    pub fn is_whole(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn rank(&self) -> usize {
        self.ranges.len()
    }

    /// Resulting shape, one length per range.
    pub fn shape(&self) -> Vec<u64> {
        self.ranges.iter().map(Range::len).collect()
    }

    /// Number of selected elements. A whole section must be resolved against
    /// its variable (see [`VariableSchema::full_section`](crate::VariableSchema::full_section))
    /// before its size means anything.
    pub fn compute_size(&self) -> u64 {
        self.ranges
            .iter()
            .fold(1u64, |acc, r| acc.saturating_mul(r.len()))
    }

    /// Check rank and bounds against declared dimension lengths. Unknown
    /// dimensions are not bounds-checked. The whole section always fits.
    pub fn check_bounds(&self, dims: &[DimLength]) -> Result<(), SectionError> {
        if self.is_whole() {
            return Ok(());
        }
        if self.ranges.len() != dims.len() {
            return Err(SectionError::RankMismatch {
                got: self.ranges.len(),
                expected: dims.len(),
            });
        }
        for (dimension, (range, dim)) in self.ranges.iter().zip(dims).enumerate() {
            if let DimLength::Fixed(length) = *dim
                && range.stop > length
            {
                return Err(SectionError::OutOfBounds {
                    dimension,
                    start: range.start,
                    stop: range.stop,
                    length,
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<Range>> for Section {
    fn from(ranges: Vec<Range>) -> Self {
        Self::new(ranges)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{range}")?;
        }
        Ok(())
    }
}

/// Parses `start:stop[:stride]` ranges separated by `,`. The empty string is
/// the whole section.
impl FromStr for Section {
    type Err = SectionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::whole());
        }

        let parse_err = |detail: String| SectionError::Parse {
            text: text.to_string(),
            detail,
        };

        let mut ranges = Vec::new();
        for part in trimmed.split(',') {
            let numbers = part
                .split(':')
                .map(|n| {
                    n.trim()
                        .parse::<u64>()
                        .map_err(|e| parse_err(format!("'{}': {e}", n.trim())))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let range = match numbers.as_slice() {
                [start, stop] => Range::new(*start, *stop, 1)?,
                [start, stop, stride] => Range::new(*start, *stop, *stride)?,
                _ => return Err(parse_err(format!("'{part}' is not start:stop[:stride]"))),
            };
            ranges.push(range);
        }
        Ok(Self::new(ranges))
    }
}
