// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Containers for images, uv grids and convolution functions.
//!
//! Each container owns its pixels, a [`Wcs`] describing them and the
//! [`PolarisationFrame`] of its polarisation axis.

use std::fmt::Debug;

use marlu::{
    ndarray::{Array4, Array6, ArrayView4, ArrayView6, ArrayViewMut4, ArrayViewMut6},
    num_traits::Zero,
    Complex,
};
use strum_macros::{Display, IntoStaticStr};

use crate::{
    error::ImagingError,
    polarisation::PolarisationFrame,
    wcs::{Wcs, WcsAxis},
};

/// The element type of a container's pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum Dtype {
    /// [`f32`]
    #[strum(serialize = "float32")]
    Float32,
    /// [`f64`]
    #[strum(serialize = "float64")]
    Float64,
    /// [`Complex<f32>`]
    #[strum(serialize = "complex64")]
    Complex64,
    /// [`Complex<f64>`]
    #[strum(serialize = "complex128")]
    Complex128,
}

impl Dtype {
    /// Whether this is a complex type.
    pub fn is_complex(self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128)
    }
}

/// Types that can be the pixels of an [`Image`].
pub trait Pixel: Copy + Zero + Debug + PartialEq + Send + Sync + 'static {
    /// The tag of this type.
    const DTYPE: Dtype;
}

impl Pixel for f32 {
    const DTYPE: Dtype = Dtype::Float32;
}

impl Pixel for f64 {
    const DTYPE: Dtype = Dtype::Float64;
}

impl Pixel for Complex<f32> {
    const DTYPE: Dtype = Dtype::Complex64;
}

impl Pixel for Complex<f64> {
    const DTYPE: Dtype = Dtype::Complex128;
}

fn bad_shape(argument: &str, function: &str, expected: String, received: String) -> ImagingError {
    ImagingError::BadArrayShape {
        argument: argument.to_string(),
        function: function.to_string(),
        expected,
        received,
    }
}

/// An image with dimensions `[chan][pol][y][x]`, where `y` runs along
/// declination and `x` along right ascension.
#[derive(Clone, Debug)]
pub struct Image<T: Pixel> {
    pixels: Array4<T>,
    wcs: Wcs,
    polarisation_frame: PolarisationFrame,
}

impl<T: Pixel> Image<T> {
    /// Wrap an array as an image.
    ///
    /// # Errors
    ///
    /// [`ImagingError::BadArrayShape`] if the polarisation axis doesn't match
    /// the frame or the WCS doesn't have four axes.
    pub fn from_array(
        pixels: Array4<T>,
        wcs: Wcs,
        polarisation_frame: PolarisationFrame,
    ) -> Result<Self, ImagingError> {
        let (_, npol, _, _) = pixels.dim();
        if npol != polarisation_frame.npol() {
            return Err(bad_shape(
                "pixels",
                "Image::from_array",
                format!("{} polarisations ({polarisation_frame})", polarisation_frame.npol()),
                format!("{:?}", pixels.dim()),
            ));
        }
        if wcs.naxis() != 4 {
            return Err(bad_shape(
                "wcs",
                "Image::from_array",
                "4 axes".to_string(),
                format!("{} axes", wcs.naxis()),
            ));
        }
        Ok(Self {
            pixels,
            wcs,
            polarisation_frame,
        })
    }

    /// A zero-filled image.
    ///
    /// # Errors
    ///
    /// See [`Image::from_array`].
    pub fn zeros(
        shape: (usize, usize, usize, usize),
        wcs: Wcs,
        polarisation_frame: PolarisationFrame,
    ) -> Result<Self, ImagingError> {
        Self::from_array(Array4::zeros(shape), wcs, polarisation_frame)
    }

    /// The pixels, `[chan][pol][y][x]`.
    pub fn pixels(&self) -> ArrayView4<T> {
        self.pixels.view()
    }

    /// The pixels, mutably.
    pub fn pixels_mut(&mut self) -> ArrayViewMut4<T> {
        self.pixels.view_mut()
    }

    /// Take ownership of the pixels.
    pub fn into_pixels(self) -> Array4<T> {
        self.pixels
    }

    /// The world coordinate system.
    pub fn wcs(&self) -> &Wcs {
        &self.wcs
    }

    /// The polarisation frame of the polarisation axis.
    pub fn polarisation_frame(&self) -> PolarisationFrame {
        self.polarisation_frame
    }

    /// `(nchan, npol, ny, nx)`
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        self.pixels.dim()
    }

    /// The element type of the pixels.
    pub fn dtype(&self) -> Dtype {
        T::DTYPE
    }
}

/// A uv grid with dimensions `[chan][pol][v][u]`.
#[derive(Clone, Debug)]
pub struct GridData {
    pixels: Array4<Complex<f64>>,
    grid_wcs: Wcs,
    polarisation_frame: PolarisationFrame,
}

impl GridData {
    /// An empty grid for imaging into `im`. The uv cell is the reciprocal of
    /// the image's field of view.
    ///
    /// # Errors
    ///
    /// [`ImagingError::Wcs`] if the image has no `DEC` or `FREQ` axis.
    pub fn from_image<T: Pixel>(im: &Image<T>) -> Result<Self, ImagingError> {
        let (nchan, npol, ny, nx) = im.shape();
        let cellsize = im.wcs().cellsize_rad()?;
        let grid_wcs = Wcs {
            axes: vec![
                WcsAxis::new("UU", (nx / 2 + 1) as f64, 0.0, 1.0 / (nx as f64 * cellsize)),
                WcsAxis::new("VV", (ny / 2 + 1) as f64, 0.0, 1.0 / (ny as f64 * cellsize)),
                im.wcs().axes[2].clone(),
                im.wcs().axes[3].clone(),
            ],
            radesys: im.wcs().radesys.clone(),
            equinox: im.wcs().equinox,
        };
        Ok(Self {
            pixels: Array4::zeros((nchan, npol, ny, nx)),
            grid_wcs,
            polarisation_frame: im.polarisation_frame(),
        })
    }

    /// Wrap an array as a grid.
    ///
    /// # Errors
    ///
    /// [`ImagingError::BadArrayShape`] if the polarisation axis doesn't match
    /// the frame or the WCS doesn't have four axes.
    pub fn from_array(
        pixels: Array4<Complex<f64>>,
        grid_wcs: Wcs,
        polarisation_frame: PolarisationFrame,
    ) -> Result<Self, ImagingError> {
        let (_, npol, _, _) = pixels.dim();
        if npol != polarisation_frame.npol() || grid_wcs.naxis() != 4 {
            return Err(bad_shape(
                "pixels",
                "GridData::from_array",
                format!(
                    "{} polarisations ({polarisation_frame}) and 4 WCS axes",
                    polarisation_frame.npol()
                ),
                format!("{:?} and {} WCS axes", pixels.dim(), grid_wcs.naxis()),
            ));
        }
        Ok(Self {
            pixels,
            grid_wcs,
            polarisation_frame,
        })
    }

    /// The grid, `[chan][pol][v][u]`.
    pub fn pixels(&self) -> ArrayView4<Complex<f64>> {
        self.pixels.view()
    }

    /// The grid, mutably.
    pub fn pixels_mut(&mut self) -> ArrayViewMut4<Complex<f64>> {
        self.pixels.view_mut()
    }

    /// The world coordinate system of the grid.
    pub fn grid_wcs(&self) -> &Wcs {
        &self.grid_wcs
    }

    /// The polarisation frame of the polarisation axis.
    pub fn polarisation_frame(&self) -> PolarisationFrame {
        self.polarisation_frame
    }

    /// `(nchan, npol, nv, nu)`
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        self.pixels.dim()
    }

    /// The size of a uv cell `(du, dv)` \[wavelengths\]
    pub fn uv_cellsize(&self) -> (f64, f64) {
        (self.grid_wcs.axes[0].cdelt, self.grid_wcs.axes[1].cdelt)
    }
}

/// A gridding kernel with dimensions
/// `[chan][pol][oversample v][oversample u][support v][support u]`.
#[derive(Clone, Debug)]
pub struct ConvolutionFunction {
    pixels: Array6<Complex<f64>>,
    cf_wcs: Wcs,
    polarisation_frame: PolarisationFrame,
}

impl ConvolutionFunction {
    /// An empty convolution function for gridding into the uv plane of `im`.
    /// The polarisation frame defaults to the image's.
    ///
    /// # Errors
    ///
    /// [`ImagingError::BadArrayShape`] if `oversampling` or `support` is 0, or
    /// [`ImagingError::Wcs`] if the image has no `DEC` axis.
    pub fn from_image<T: Pixel>(
        im: &Image<T>,
        oversampling: usize,
        support: usize,
        polarisation_frame: Option<PolarisationFrame>,
    ) -> Result<Self, ImagingError> {
        if oversampling == 0 || support == 0 {
            return Err(bad_shape(
                "oversampling, support",
                "ConvolutionFunction::from_image",
                "non-zero values".to_string(),
                format!("{oversampling}, {support}"),
            ));
        }
        let polarisation_frame = polarisation_frame.unwrap_or_else(|| im.polarisation_frame());
        let (nchan, _, ny, nx) = im.shape();
        let cellsize = im.wcs().cellsize_rad()?;
        let du = 1.0 / (nx as f64 * cellsize);
        let dv = 1.0 / (ny as f64 * cellsize);
        let support_crpix = (support / 2 + 1) as f64;
        let oversampling_crpix = (oversampling / 2 + 1) as f64;
        let cf_wcs = Wcs {
            axes: vec![
                WcsAxis::new("UU", support_crpix, 0.0, du),
                WcsAxis::new("VV", support_crpix, 0.0, dv),
                WcsAxis::new("DUU", oversampling_crpix, 0.0, du / oversampling as f64),
                WcsAxis::new("DVV", oversampling_crpix, 0.0, dv / oversampling as f64),
                im.wcs().axes[2].clone(),
                im.wcs().axes[3].clone(),
            ],
            radesys: im.wcs().radesys.clone(),
            equinox: im.wcs().equinox,
        };
        Ok(Self {
            pixels: Array6::zeros((
                nchan,
                polarisation_frame.npol(),
                oversampling,
                oversampling,
                support,
                support,
            )),
            cf_wcs,
            polarisation_frame,
        })
    }

    /// The kernel taps.
    pub fn pixels(&self) -> ArrayView6<Complex<f64>> {
        self.pixels.view()
    }

    /// The kernel taps, mutably.
    pub fn pixels_mut(&mut self) -> ArrayViewMut6<Complex<f64>> {
        self.pixels.view_mut()
    }

    /// The world coordinate system of the kernel.
    pub fn cf_wcs(&self) -> &Wcs {
        &self.cf_wcs
    }

    /// The polarisation frame of the polarisation axis.
    pub fn polarisation_frame(&self) -> PolarisationFrame {
        self.polarisation_frame
    }

    /// The number of oversampled positions per uv cell.
    pub fn oversampling(&self) -> usize {
        self.pixels.dim().2
    }

    /// The width of the kernel \[uv cells\]
    pub fn support(&self) -> usize {
        self.pixels.dim().4
    }

    /// The element type of the taps.
    pub fn dtype(&self) -> Dtype {
        <Complex<f64> as Pixel>::DTYPE
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn image_wcs(npixel: usize, cellsize_deg: f64) -> Wcs {
        let crpix = (npixel / 2 + 1) as f64;
        Wcs {
            axes: vec![
                WcsAxis::new("RA---SIN", crpix, 0.0, -cellsize_deg),
                WcsAxis::new("DEC--SIN", crpix, -27.0, cellsize_deg),
                WcsAxis::new("STOKES", 1.0, 1.0, 1.0),
                WcsAxis::new("FREQ", 1.0, 150e6, 1e6),
            ],
            radesys: "ICRS".to_string(),
            equinox: 2000.0,
        }
    }

    #[test]
    fn test_image_checks_polarisations() {
        let wcs = image_wcs(8, 0.1);
        let image = Image::<f32>::zeros((2, 4, 8, 8), wcs.clone(), PolarisationFrame::Linear);
        let image = image.unwrap();
        assert_eq!(image.shape(), (2, 4, 8, 8));
        assert_eq!(image.dtype(), Dtype::Float32);
        assert_eq!(image.polarisation_frame(), PolarisationFrame::Linear);

        let result = Image::<f32>::zeros((2, 4, 8, 8), wcs, PolarisationFrame::StokesI);
        assert!(matches!(result, Err(ImagingError::BadArrayShape { .. })));
    }

    #[test]
    fn test_image_checks_wcs() {
        let mut wcs = image_wcs(8, 0.1);
        wcs.axes.pop();
        let result = Image::<f64>::zeros((1, 1, 8, 8), wcs, PolarisationFrame::StokesI);
        assert!(matches!(result, Err(ImagingError::BadArrayShape { .. })));
    }

    #[test]
    fn test_griddata_from_image() {
        let cellsize_deg = 0.05;
        let image = Image::<f32>::zeros(
            (3, 2, 16, 32),
            image_wcs(32, cellsize_deg),
            PolarisationFrame::LinearNp,
        )
        .unwrap();
        let griddata = GridData::from_image(&image).unwrap();
        assert_eq!(griddata.shape(), (3, 2, 16, 32));
        assert_eq!(griddata.polarisation_frame(), PolarisationFrame::LinearNp);

        let (du, dv) = griddata.uv_cellsize();
        let cellsize = cellsize_deg.to_radians();
        assert_abs_diff_eq!(du, 1.0 / (32.0 * cellsize), epsilon = 1e-9);
        assert_abs_diff_eq!(dv, 1.0 / (16.0 * cellsize), epsilon = 1e-9);
        assert_eq!(griddata.grid_wcs().axes[0].crpix, 17.0);
        assert_eq!(griddata.grid_wcs().axes[1].crpix, 9.0);
        assert_eq!(griddata.grid_wcs().axes[3].ctype, "FREQ");
    }

    #[test]
    fn test_convolution_function_from_image() {
        let image =
            Image::<f32>::zeros((2, 1, 8, 8), image_wcs(8, 0.1), PolarisationFrame::StokesI)
                .unwrap();
        let cf = ConvolutionFunction::from_image(&image, 3, 4, Some(PolarisationFrame::Linear))
            .unwrap();
        assert_eq!(cf.pixels().dim(), (2, 4, 3, 3, 4, 4));
        assert_eq!(cf.oversampling(), 3);
        assert_eq!(cf.support(), 4);
        assert_eq!(cf.polarisation_frame(), PolarisationFrame::Linear);
        assert!(cf.dtype().is_complex());

        let ctypes = cf
            .cf_wcs()
            .axes
            .iter()
            .map(|axis| axis.ctype.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ctypes, ["UU", "VV", "DUU", "DVV", "STOKES", "FREQ"]);
        assert_eq!(cf.cf_wcs().axes[0].crpix, 3.0);
        assert_eq!(cf.cf_wcs().axes[2].crpix, 2.0);

        let defaulted = ConvolutionFunction::from_image(&image, 1, 1, None).unwrap();
        assert_eq!(defaulted.polarisation_frame(), PolarisationFrame::StokesI);

        assert!(matches!(
            ConvolutionFunction::from_image(&image, 0, 4, None),
            Err(ImagingError::BadArrayShape { .. })
        ));
    }
}
