// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Box-car gridding, and transforming grids into images.

use log::{debug, trace, warn};
use marlu::{
    ndarray::{s, Array2, Array4},
    Complex,
};

use crate::{
    constants::{BOX_OVERSAMPLING, BOX_SUPPORT},
    error::ImagingError,
    fft::{coordinates, ifft2, sinc},
    image::{ConvolutionFunction, Dtype, GridData, Image, Pixel},
    polarisation::PolarisationFrame,
    synthesis::SpectralMode,
    visibility::Visibility,
    wcs::Wcs,
};

/// Make a box-car convolution function for gridding into the uv plane of
/// `im`, along with the grid correction function that undoes its taper.
///
/// The convolution function always has an oversampling of 1 and a support
/// of 4 with a single unit tap at support index `(2, 2)`; `oversampling` and
/// `support` are accepted but not used. The polarisation frame of the
/// convolution function defaults to the image's.
///
/// The grid correction is `1 / (sinc(ν_y) sinc(ν_x))` where `ν` is the
/// absolute Fourier coordinate of each pixel, the same in every channel and
/// polarisation, and shares the image's WCS.
///
/// # Errors
///
/// Will return [`ImagingError`] if the image WCS has no `DEC` axis, or the
/// containers are built with the wrong element types.
pub fn create_box_convolution_function<T: Pixel>(
    im: &Image<T>,
    oversampling: usize,
    support: usize,
    polarisation_frame: Option<PolarisationFrame>,
) -> Result<(Image<f32>, ConvolutionFunction), ImagingError> {
    debug!(
        "box convolution function: ignoring oversampling {oversampling} and support {support}, using {BOX_OVERSAMPLING} and {BOX_SUPPORT}"
    );
    let mut cf = ConvolutionFunction::from_image(
        im,
        BOX_OVERSAMPLING,
        BOX_SUPPORT,
        polarisation_frame,
    )?;
    cf.pixels_mut().fill(Complex::new(0.0, 0.0));
    cf.pixels_mut()
        .slice_mut(s![.., .., .., .., BOX_SUPPORT / 2, BOX_SUPPORT / 2])
        .fill(Complex::new(1.0, 0.0));

    let (nchan, npol, ny, nx) = im.shape();
    let taper_y = coordinates(ny).mapv(|nu| sinc(nu.abs()));
    let taper_x = coordinates(nx).mapv(|nu| sinc(nu.abs()));
    let gcf = Array4::from_shape_fn((nchan, npol, ny, nx), |(_, _, y, x)| {
        (1.0 / (taper_y[y] * taper_x[x])) as f32
    });
    let gcf = Image::from_array(gcf, im.wcs().clone(), im.polarisation_frame())?;

    if !cf.dtype().is_complex() {
        return Err(ImagingError::Postcondition {
            container: "convolution function",
            expected: "complex",
            found: cf.dtype(),
        });
    }
    if gcf.dtype() != Dtype::Float32 {
        return Err(ImagingError::Postcondition {
            container: "grid correction function",
            expected: Dtype::Float32.into(),
            found: gcf.dtype(),
        });
    }
    Ok((gcf, cf))
}

/// Add visibilities to the nearest cells of a grid, spread over the taps of
/// a convolution function, and return the summed weights `[chan][pol]`.
///
/// Grid channels are matched to the unique visibility frequencies in
/// ascending order, using the [`SpectralMode`] of the two channel counts:
/// everything goes to channel 0 of a single channel grid, each unique
/// frequency has its own channel in `channel` mode, and otherwise contiguous
/// blocks of unique frequencies share a channel. Samples whose nearest cell
/// is off the grid are skipped with a warning, and taps that fall off the
/// grid are dropped.
///
/// # Errors
///
/// [`ImagingError::PolarisationMismatch`] if `vis` and `griddata` have
/// different polarisation frames, [`ImagingError::BadArrayShape`] if `cf`
/// has a different number of polarisations, or
/// [`ImagingError::UnsupportedSpectralMode`] if the grid has more than one
/// channel but the visibilities have a single frequency.
pub fn grid_visibility_nearest(
    vis: &Visibility,
    griddata: &mut GridData,
    cf: &ConvolutionFunction,
) -> Result<Array2<f64>, ImagingError> {
    let (nchan, npol, nv, nu) = griddata.shape();
    if vis.polarisation_frame() != griddata.polarisation_frame() {
        return Err(ImagingError::PolarisationMismatch {
            vis: vis.polarisation_frame(),
            grid: griddata.polarisation_frame(),
        });
    }
    let cf_shape = cf.pixels().dim();
    if cf_shape.1 != npol {
        return Err(ImagingError::BadArrayShape {
            argument: "cf".into(),
            function: "grid_visibility_nearest".into(),
            expected: format!("{npol} polarisations"),
            received: format!("{} polarisations", cf_shape.1),
        });
    }

    let image_chans = grid_channels(vis, nchan)?;
    trace!("image channels of visibility channels: {image_chans:?}");

    let (du, dv) = griddata.uv_cellsize();
    let oversampling = cf.oversampling() as isize;
    let support = cf.support() as isize;
    let cf_pixels = cf.pixels();
    let vis_data = vis.vis();
    let mut grid = griddata.pixels_mut();
    let mut sumwt = Array2::<f64>::zeros((nchan, npol));
    let mut num_outside = 0;

    for ((timestep, baseline, vis_chan), uvw) in vis.uvw_lambda().indexed_iter() {
        let chan = image_chans[vis_chan];
        let cf_chan = chan.min(cf_shape.0 - 1);
        let (u_cells, v_cells) = (uvw.u / du, uvw.v / dv);
        let iu = u_cells.round() as isize + (nu / 2) as isize;
        let iv = v_cells.round() as isize + (nv / 2) as isize;
        if iu < 0 || iu >= nu as isize || iv < 0 || iv >= nv as isize {
            num_outside += 1;
            continue;
        }
        let ou = (((u_cells - u_cells.round()) * oversampling as f64).round() as isize
            + oversampling / 2)
            .clamp(0, oversampling - 1) as usize;
        let ov = (((v_cells - v_cells.round()) * oversampling as f64).round() as isize
            + oversampling / 2)
            .clamp(0, oversampling - 1) as usize;

        for sy in 0..support {
            let gy = iv + sy - support / 2;
            if gy < 0 || gy >= nv as isize {
                continue;
            }
            for sx in 0..support {
                let gx = iu + sx - support / 2;
                if gx < 0 || gx >= nu as isize {
                    continue;
                }
                for pol in 0..npol {
                    let sample = vis_data[[timestep, baseline, vis_chan, pol]];
                    let tap = cf_pixels[[cf_chan, pol, ov, ou, sy as usize, sx as usize]];
                    grid[[chan, pol, gy as usize, gx as usize]] +=
                        tap * Complex::new(sample.re as f64, sample.im as f64);
                }
            }
        }
        sumwt.row_mut(chan).map_inplace(|weight| *weight += 1.0);
    }

    if num_outside > 0 {
        warn!("{num_outside} visibilities fell outside of the uv grid and were not gridded");
    }
    Ok(sumwt)
}

/// The grid channel of each visibility channel.
fn grid_channels(vis: &Visibility, nchan: usize) -> Result<Vec<usize>, ImagingError> {
    let unique_freqs_hz = vis.unique_frequencies_hz();
    let vnchan = unique_freqs_hz.len();
    let mode = SpectralMode::classify(nchan, vnchan)?;
    debug!("gridding {vnchan} unique frequencies into {nchan} channels, {mode} mode");
    Ok(vis
        .frequency_hz()
        .iter()
        .map(|freq_hz| {
            let unique_idx = unique_freqs_hz
                .binary_search_by(|unique_hz| unique_hz.total_cmp(freq_hz))
                .unwrap_or_else(|idx| idx);
            match mode {
                SpectralMode::SingleChannel | SpectralMode::Mfs => 0,
                SpectralMode::Channel => unique_idx,
                SpectralMode::MultiChannelMfs => unique_idx * nchan / vnchan,
            }
        })
        .collect())
}

/// Transform a grid into an image.
///
/// Each `[chan][pol]` plane goes through a centred inverse FFT, is scaled by
/// the number of pixels in the plane, then multiplied by `gcf` if one is
/// given. The image takes `wcs` if given, otherwise the template's, and the
/// grid's polarisation frame.
///
/// # Errors
///
/// [`ImagingError::BadArrayShape`] if `gcf` isn't the same shape as the grid.
pub fn fft_griddata_to_image<T: Pixel>(
    griddata: &GridData,
    template: &Image<T>,
    gcf: Option<&Image<f32>>,
    wcs: Option<&Wcs>,
) -> Result<Image<Complex<f64>>, ImagingError> {
    let shape = griddata.shape();
    if let Some(gcf) = gcf {
        if gcf.shape() != shape {
            return Err(ImagingError::BadArrayShape {
                argument: "gcf".into(),
                function: "fft_griddata_to_image".into(),
                expected: format!("{shape:?}"),
                received: format!("{:?}", gcf.shape()),
            });
        }
    }

    let (_, _, ny, nx) = shape;
    let scale = (nx * ny) as f64;
    let mut pixels = Array4::<Complex<f64>>::zeros(shape);
    for (mut image_chan, grid_chan) in pixels
        .outer_iter_mut()
        .zip(griddata.pixels().outer_iter())
    {
        for (mut image_plane, grid_plane) in image_chan
            .outer_iter_mut()
            .zip(grid_chan.outer_iter())
        {
            image_plane.assign(&(ifft2(grid_plane) * scale));
        }
    }
    if let Some(gcf) = gcf {
        pixels.zip_mut_with(&gcf.pixels(), |pixel, &correction| {
            *pixel *= correction as f64;
        });
    }

    let wcs = wcs.unwrap_or_else(|| template.wcs()).clone();
    Image::from_array(pixels, wcs, griddata.polarisation_frame())
}
