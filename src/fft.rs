// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Centred two dimensional Fourier transforms and Fourier coordinates.
//!
//! The phase centre of an `n` sample axis is at index `n / 2`, so centred
//! transforms shift that index to 0 before transforming and back afterwards.

use std::f64::consts::PI;

use marlu::ndarray::{Array1, Array2, ArrayView2, Axis};
use rustfft::{num_complex::Complex64, FftDirection, FftPlanner};

/// The Fourier coordinates of an `n` sample axis, `(i - n / 2) / n`, which
/// span `[-0.5, 0.5)` in ascending order.
pub fn coordinates(n: usize) -> Array1<f64> {
    let half = (n / 2) as f64;
    Array1::from_iter((0..n).map(|i| (i as f64 - half) / n as f64))
}

/// The normalised sinc function, `sin(πx) / (πx)`.
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Move the sample at index `n / 2` of both axes to index 0.
pub fn ifftshift2<T: Clone>(array: ArrayView2<T>) -> Array2<T> {
    let (ny, nx) = array.dim();
    Array2::from_shape_fn((ny, nx), |(y, x)| {
        array[[(y + ny / 2) % ny, (x + nx / 2) % nx]].clone()
    })
}

/// Move the sample at index 0 of both axes to index `n / 2`.
pub fn fftshift2<T: Clone>(array: ArrayView2<T>) -> Array2<T> {
    let (ny, nx) = array.dim();
    Array2::from_shape_fn((ny, nx), |(y, x)| {
        array[[(y + ny - ny / 2) % ny, (x + nx - nx / 2) % nx]].clone()
    })
}

/// Transform every lane of `array` along `axis` in place (unnormalised).
fn fft_axis(
    planner: &mut FftPlanner<f64>,
    array: &mut Array2<Complex64>,
    axis: Axis,
    direction: FftDirection,
) {
    let fft = planner.plan_fft(array.len_of(axis), direction);
    let mut buffer = Vec::with_capacity(array.len_of(axis));
    for mut lane in array.lanes_mut(axis) {
        buffer.clear();
        buffer.extend(lane.iter().copied());
        fft.process(&mut buffer);
        lane.iter_mut()
            .zip(buffer.iter())
            .for_each(|(sample, &transformed)| *sample = transformed);
    }
}

fn fft2_centred(array: ArrayView2<Complex64>, direction: FftDirection) -> Array2<Complex64> {
    let mut shifted = ifftshift2(array);
    if !shifted.is_empty() {
        let mut planner = FftPlanner::new();
        fft_axis(&mut planner, &mut shifted, Axis(1), direction);
        fft_axis(&mut planner, &mut shifted, Axis(0), direction);
    }
    fftshift2(shifted.view())
}

/// Centred forward 2D FFT, unnormalised.
pub fn fft2(array: ArrayView2<Complex64>) -> Array2<Complex64> {
    fft2_centred(array, FftDirection::Forward)
}

/// Centred inverse 2D FFT, normalised by the number of samples, so that
/// `ifft2(fft2(x)) == x`.
pub fn ifft2(array: ArrayView2<Complex64>) -> Array2<Complex64> {
    let mut result = fft2_centred(array, FftDirection::Inverse);
    let scale = 1.0 / result.len().max(1) as f64;
    result.mapv_inplace(|sample| sample * scale);
    result
}
