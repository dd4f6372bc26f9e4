// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Visibilities and the uvw coordinates they were sampled at.

use log::{debug, trace};
use marlu::{
    constants::VEL_C,
    ndarray::{Array2, Array3, Array4, ArrayView2, ArrayView4, ArrayViewMut4},
    pos::xyz::xyzs_to_cross_uvws,
    Complex, RADec, UVW,
};
use thiserror::Error;

use crate::{configuration::Configuration, polarisation::PolarisationFrame};

#[derive(Error, Debug)]
/// Errors that can occur when constructing [`Visibility`].
pub enum VisibilityError {
    #[error("No frequencies were supplied")]
    /// An empty frequency array.
    NoFrequencies,

    #[error("{num_freqs} frequencies were supplied, but {num_bandwidths} channel bandwidths")]
    /// Every frequency needs a channel bandwidth.
    BandwidthMismatch {
        /// The number of frequencies
        num_freqs: usize,
        /// The number of channel bandwidths
        num_bandwidths: usize,
    },

    #[error("bad array shape supplied to argument {argument} of function {function}. expected {expected}, received {received}")]
    /// Error for bad array shape in provided argument
    BadArrayShape {
        /// The argument name within the function
        argument: String,
        /// The function name
        function: String,
        /// The expected shape
        expected: String,
        /// The shape that was received instead
        received: String,
    },
}

/// Visibilities of an observation, along with their uvws, frequencies and
/// polarisations.
#[derive(Clone, Debug)]
pub struct Visibility {
    /// dimensions `[timestep][baseline]` \[metres\]
    uvw: Array2<UVW>,
    frequency_hz: Vec<f64>,
    channel_bandwidth_hz: Vec<f64>,
    /// dimensions `[timestep][baseline][channel][pol]`
    vis: Array4<Complex<f32>>,
    phase_centre: RADec,
    polarisation_frame: PolarisationFrame,
}

impl Visibility {
    /// Create a new visibility container.
    ///
    /// # Errors
    ///
    /// Will return [`VisibilityError`] if there are no frequencies, the
    /// frequencies and bandwidths differ in length, or `vis` isn't
    /// `[timestep][baseline][channel][pol]` for the given uvws, frequencies
    /// and polarisation frame.
    pub fn new(
        uvw: Array2<UVW>,
        frequency_hz: Vec<f64>,
        channel_bandwidth_hz: Vec<f64>,
        vis: Array4<Complex<f32>>,
        phase_centre: RADec,
        polarisation_frame: PolarisationFrame,
    ) -> Result<Self, VisibilityError> {
        if frequency_hz.is_empty() {
            return Err(VisibilityError::NoFrequencies);
        }
        if frequency_hz.len() != channel_bandwidth_hz.len() {
            return Err(VisibilityError::BandwidthMismatch {
                num_freqs: frequency_hz.len(),
                num_bandwidths: channel_bandwidth_hz.len(),
            });
        }
        let (num_timesteps, num_baselines) = uvw.dim();
        let expected = (
            num_timesteps,
            num_baselines,
            frequency_hz.len(),
            polarisation_frame.npol(),
        );
        if vis.dim() != expected {
            return Err(VisibilityError::BadArrayShape {
                argument: "vis".into(),
                function: "Visibility::new".into(),
                expected: format!("{expected:?}"),
                received: format!("{:?}", vis.dim()),
            });
        }
        Ok(Self {
            uvw,
            frequency_hz,
            channel_bandwidth_hz,
            vis,
            phase_centre,
            polarisation_frame,
        })
    }

    /// Zero-valued visibilities of every cross-correlation baseline of
    /// `config` for a single timestep at local sidereal time `lst_rad`.
    ///
    /// # Errors
    ///
    /// See [`Visibility::new`].
    pub fn simulate_snapshot(
        config: &Configuration,
        phase_centre: RADec,
        lst_rad: f64,
        frequency_hz: Vec<f64>,
        channel_bandwidth_hz: Vec<f64>,
        polarisation_frame: PolarisationFrame,
    ) -> Result<Self, VisibilityError> {
        let uvws = xyzs_to_cross_uvws(&config.xyz, phase_centre.to_hadec(lst_rad));
        debug!(
            "simulating {} baselines of {} at LST {:.4} rad",
            uvws.len(),
            config.name,
            lst_rad
        );
        let num_baselines = uvws.len();
        let uvw = Array2::from_shape_vec((1, num_baselines), uvws).map_err(|e| {
            VisibilityError::BadArrayShape {
                argument: "config".into(),
                function: "Visibility::simulate_snapshot".into(),
                expected: format!("(1, {num_baselines})"),
                received: e.to_string(),
            }
        })?;
        let vis = Array4::zeros((
            1,
            num_baselines,
            frequency_hz.len(),
            polarisation_frame.npol(),
        ));
        Self::new(
            uvw,
            frequency_hz,
            channel_bandwidth_hz,
            vis,
            phase_centre,
            polarisation_frame,
        )
    }

    /// The uvws, `[timestep][baseline]` \[metres\]
    pub fn uvw(&self) -> ArrayView2<UVW> {
        self.uvw.view()
    }

    /// The centre frequency of each channel \[Hz\]
    pub fn frequency_hz(&self) -> &[f64] {
        &self.frequency_hz
    }

    /// The bandwidth of each channel \[Hz\]
    pub fn channel_bandwidth_hz(&self) -> &[f64] {
        &self.channel_bandwidth_hz
    }

    /// The visibilities, `[timestep][baseline][channel][pol]`
    pub fn vis(&self) -> ArrayView4<Complex<f32>> {
        self.vis.view()
    }

    /// The visibilities, mutably.
    pub fn vis_mut(&mut self) -> ArrayViewMut4<Complex<f32>> {
        self.vis.view_mut()
    }

    /// The direction the visibility phases are referenced to.
    pub fn phase_centre(&self) -> RADec {
        self.phase_centre
    }

    /// The polarisation frame of the visibilities.
    pub fn polarisation_frame(&self) -> PolarisationFrame {
        self.polarisation_frame
    }

    /// The distinct channel frequencies in ascending order \[Hz\]
    pub fn unique_frequencies_hz(&self) -> Vec<f64> {
        let mut freqs = self.frequency_hz.clone();
        freqs.sort_by(f64::total_cmp);
        freqs.dedup();
        freqs
    }

    /// The uvws in wavelengths, `[timestep][baseline][channel]`
    pub fn uvw_lambda(&self) -> Array3<UVW> {
        let (num_timesteps, num_baselines) = self.uvw.dim();
        Array3::from_shape_fn(
            (num_timesteps, num_baselines, self.frequency_hz.len()),
            |(t, b, f)| self.uvw[[t, b]] * self.frequency_hz[f] / VEL_C,
        )
    }

    /// The largest |u| or |v| over all samples \[wavelengths\]
    pub fn uvmax_lambda(&self) -> f64 {
        let uvmax = self
            .uvw_lambda()
            .iter()
            .flat_map(|uvw| [uvw.u.abs(), uvw.v.abs()])
            .fold(0.0, f64::max);
        trace!("uvmax = {uvmax} wavelengths");
        uvmax
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use marlu::{LatLngHeight, ENH};

    use super::*;

    fn uvw_metres() -> Array2<UVW> {
        Array2::from_shape_vec(
            (1, 2),
            vec![
                UVW {
                    u: 10.0,
                    v: -30.0,
                    w: 500.0,
                },
                UVW {
                    u: -20.0,
                    v: 5.0,
                    w: -900.0,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_checks_frequencies() {
        let phase_centre = RADec::new(0.0, -0.5);
        let result = Visibility::new(
            uvw_metres(),
            vec![],
            vec![],
            Array4::zeros((1, 2, 0, 1)),
            phase_centre,
            PolarisationFrame::StokesI,
        );
        assert!(matches!(result, Err(VisibilityError::NoFrequencies)));

        let result = Visibility::new(
            uvw_metres(),
            vec![150e6],
            vec![40e3, 40e3],
            Array4::zeros((1, 2, 1, 1)),
            phase_centre,
            PolarisationFrame::StokesI,
        );
        assert!(matches!(
            result,
            Err(VisibilityError::BandwidthMismatch { .. })
        ));
    }

    #[test]
    fn test_new_checks_vis_shape() {
        let result = Visibility::new(
            uvw_metres(),
            vec![150e6],
            vec![40e3],
            Array4::zeros((1, 2, 1, 1)),
            RADec::new(0.0, -0.5),
            PolarisationFrame::Linear,
        );
        assert!(matches!(result, Err(VisibilityError::BadArrayShape { .. })));
    }

    #[test]
    fn test_uvw_lambda_and_uvmax() {
        let freqs = vec![VEL_C / 2.0, VEL_C, VEL_C];
        let vis = Visibility::new(
            uvw_metres(),
            freqs,
            vec![1.0; 3],
            Array4::zeros((1, 2, 3, 1)),
            RADec::new(0.0, -0.5),
            PolarisationFrame::StokesI,
        )
        .unwrap();

        let uvw_lambda = vis.uvw_lambda();
        assert_eq!(uvw_lambda.dim(), (1, 2, 3));
        assert_abs_diff_eq!(uvw_lambda[[0, 0, 0]].v, -15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(uvw_lambda[[0, 1, 1]].u, -20.0, epsilon = 1e-9);
        // w is ignored
        assert_abs_diff_eq!(vis.uvmax_lambda(), 30.0, epsilon = 1e-9);
        assert_eq!(vis.unique_frequencies_hz(), vec![VEL_C / 2.0, VEL_C]);
    }

    #[test]
    fn test_simulate_snapshot() {
        let location = LatLngHeight {
            longitude_rad: 0.0,
            latitude_rad: -0.5,
            height_metres: 0.0,
        };
        let enhs = [
            ENH {
                e: 0.0,
                n: 0.0,
                h: 0.0,
            },
            ENH {
                e: 100.0,
                n: 0.0,
                h: 0.0,
            },
            ENH {
                e: 0.0,
                n: 50.0,
                h: 0.0,
            },
        ];
        let config = Configuration::from_enh("test", location, &enhs, 4.0);
        // zenith
        let phase_centre = RADec::new(1.0, location.latitude_rad);
        let vis = Visibility::simulate_snapshot(
            &config,
            phase_centre,
            1.0,
            vec![VEL_C],
            vec![1e6],
            PolarisationFrame::Linear,
        )
        .unwrap();

        assert_eq!(vis.uvw().dim(), (1, 3));
        assert_eq!(vis.vis().dim(), (1, 3, 1, 4));
        assert!(vis.vis().iter().all(|v| *v == Complex::new(0.0, 0.0)));

        // at zenith, baselines project straight onto the uv plane with no w.
        let lengths = vis
            .uvw()
            .iter()
            .map(|uvw| (uvw.u * uvw.u + uvw.v * uvw.v).sqrt())
            .collect::<Vec<_>>();
        let mut expected = vec![100.0, 50.0, (100.0_f64 * 100.0 + 50.0 * 50.0).sqrt()];
        let mut lengths_sorted = lengths.clone();
        lengths_sorted.sort_by(f64::total_cmp);
        expected.sort_by(f64::total_cmp);
        for (length, expected) in lengths_sorted.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(length, expected, epsilon = 1e-6);
        }
        for uvw in vis.uvw().iter() {
            assert_abs_diff_eq!(uvw.w, 0.0, epsilon = 1e-6);
        }
        assert_abs_diff_eq!(vis.uvmax_lambda(), 100.0, epsilon = 1e-6);
    }
}
