// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Useful constants.
//!
//! All constants *must* be double precision.

use std::f64::consts::{PI, SQRT_2};

/// MWA longitude (116:40:14.93) used when building a configuration from the
/// tile coordinate file \[degrees\]
pub const MWA_TILES_LONGITUDE_DEG: f64 = 116.0 + 40.0 / 60.0 + 14.93 / 3600.0;
/// MWA latitude (-26:42:11.95) used when building a configuration from the tile
/// coordinate file \[degrees\]
pub const MWA_TILES_LATITUDE_DEG: f64 = -(26.0 + 42.0 / 60.0 + 11.95 / 3600.0);
/// [MWA_TILES_LONGITUDE_DEG] in radians.
pub const MWA_TILES_LONGITUDE_RAD: f64 = MWA_TILES_LONGITUDE_DEG * PI / 180.0;
/// [MWA_TILES_LATITUDE_DEG] in radians.
pub const MWA_TILES_LATITUDE_RAD: f64 = MWA_TILES_LATITUDE_DEG * PI / 180.0;
/// MWA height above sea level used with the tile coordinate file \[metres\]
pub const MWA_TILES_HEIGHT_M: f64 = 377.0;
/// Effective diameter of an MWA tile (a 4x4 dipole grid spanning 5m) \[metres\]
pub const MWA_TILE_DIAMETER_M: f64 = 5.0 * SQRT_2;
/// The name given to MWA configurations.
pub const MWA_CONFIGURATION_NAME: &str = "MWA";
/// The default file name of the MWA tile coordinates.
pub const DEFAULT_MWA_TILES_FILENAME: &str = "MWAtiles.csv";

/// Default number of pixels along each spatial axis of a synthesized image.
pub const DEFAULT_NPIXEL: usize = 512;
/// Default celestial reference frame written into image WCS.
pub const DEFAULT_FRAME: &str = "ICRS";
/// Default equinox written into image WCS.
pub const DEFAULT_EQUINOX: f64 = 2000.0;

/// The oversampling the box convolution function is always built with.
pub const BOX_OVERSAMPLING: usize = 1;
/// The support the box convolution function is always built with \[cells\]
pub const BOX_SUPPORT: usize = 4;
