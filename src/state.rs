// SPDX-License-Identifier: GPL-3.0-or-later
use crate::render::{ColorMap, Interpolation};

/// The operator-controlled rendering choices.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DisplayState {
    colormap_index: usize,
    interpolation_index: usize,
    pub(crate) smoothing: bool,
}

impl DisplayState {
    pub(crate) fn new(colormap: ColorMap, interpolation: Interpolation, smoothing: bool) -> Self {
        Self {
            colormap_index: colormap.index(),
            interpolation_index: interpolation.index(),
            smoothing,
        }
    }

    pub(crate) fn colormap(&self) -> ColorMap {
        ColorMap::ALL[self.colormap_index]
    }

    pub(crate) fn interpolation(&self) -> Interpolation {
        Interpolation::ALL[self.interpolation_index]
    }

    pub(crate) fn cycle_colormap(&mut self) {
        self.colormap_index = (self.colormap_index + 1) % ColorMap::ALL.len();
    }

    pub(crate) fn cycle_interpolation(&mut self) {
        self.interpolation_index = (self.interpolation_index + 1) % Interpolation::ALL.len();
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new(ColorMap::default(), Interpolation::default(), true)
    }
}
