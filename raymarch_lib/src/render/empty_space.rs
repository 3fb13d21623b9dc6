use nalgebra::Point3;

use crate::{
    common::ValueRange, transfer_function::TransferFunction, volumetric::RangeIndex,
};

/// Number of points the transfer function opacity is checked at, over `<0;1>`
pub const OPACITY_RESOLUTION: usize = 256;

/// Blocks of the volume invisible under one transfer function.
///
/// A block is empty if the transfer function is transparent at both ends of the block's
/// value range and at every lookup point inside it.
/// Exact for piecewise linear transfer functions with breakpoints on the lookup grid,
/// like [`ColorRamp`](crate::transfer_function::ColorRamp) of default resolution.
#[derive(Debug, Clone)]
pub struct EmptySpaceMap<'a> {
    index: &'a RangeIndex,
    empty: Vec<bool>,
}

impl<'a> EmptySpaceMap<'a> {
    pub fn new<T>(index: &'a RangeIndex, tf: &T) -> EmptySpaceMap<'a>
    where
        T: TransferFunction + ?Sized,
    {
        let table = OpacityTable::new(tf);
        let empty = index
            .ranges()
            .iter()
            .map(|range| table.is_transparent(tf, range))
            .collect();

        EmptySpaceMap { index, empty }
    }

    /// Samples at voxel coordinate `pos` are invisible
    pub fn is_empty(&self, pos: &Point3<f32>) -> bool {
        self.index
            .block_at(pos)
            .map_or(false, |block| self.empty[block])
    }

    pub fn empty_blocks(&self) -> usize {
        self.empty.iter().filter(|&&e| e).count()
    }
}

/// Count of opaque lookup points, `prefix[i]` counts points `0..i`
struct OpacityTable {
    prefix: Vec<u32>,
}

impl OpacityTable {
    fn new<T>(tf: &T) -> OpacityTable
    where
        T: TransferFunction + ?Sized,
    {
        let last = (OPACITY_RESOLUTION - 1) as f32;
        let mut prefix = Vec::with_capacity(OPACITY_RESOLUTION + 1);
        prefix.push(0);
        let mut count = 0;
        for i in 0..OPACITY_RESOLUTION {
            if tf.evaluate(i as f32 / last).w > 0.0 {
                count += 1;
            }
            prefix.push(count);
        }
        OpacityTable { prefix }
    }

    fn is_transparent<T>(&self, tf: &T, range: &ValueRange) -> bool
    where
        T: TransferFunction + ?Sized,
    {
        if range.is_empty() {
            return false;
        }
        if tf.evaluate(range.low).w > 0.0 || tf.evaluate(range.high).w > 0.0 {
            return false;
        }

        let last = (OPACITY_RESOLUTION - 1) as f32;
        let first = (range.low.clamp(0.0, 1.0) * last).ceil() as usize;
        let end = (range.high.clamp(0.0, 1.0) * last).floor() as usize + 1;
        if first >= end {
            return true;
        }
        self.prefix[end] == self.prefix[first]
    }
}
