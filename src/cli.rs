// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command Line Interface helpers for rascil_tweaks

use std::{
    ffi::OsString,
    fmt::{Debug, Display},
    path::PathBuf,
    str::FromStr,
};

use clap::{arg, command, ArgMatches, ErrorKind::ArgumentNotFound, ValueHint::FilePath};
use log::{debug, info, trace};
use marlu::{ndarray::Array2, Complex, RADec};
use prettytable::{cell, format as prettyformat, row, table};

use crate::{
    args::{ImageArgs, ARG_FILE_HELP},
    configuration::Configuration,
    constants::{BOX_OVERSAMPLING, BOX_SUPPORT, DEFAULT_MWA_TILES_FILENAME},
    error::RascilTweaksError::{self, DryRun},
    gridding::{create_box_convolution_function, fft_griddata_to_image, grid_visibility_nearest},
    image::{GridData, Image},
    polarisation::PolarisationFrame,
    synthesis::{create_image_from_visibility, ImageOptions},
    visibility::Visibility,
    wcs::Wcs,
};

/// The frequency of the simulated snapshot if none is given \[Hz\]
const DEFAULT_SIM_FREQ_HZ: &str = "150000000";
/// The channel width of the simulated snapshot if none is given \[Hz\]
const DEFAULT_SIM_CHAN_WIDTH_HZ: &str = "40000";

/// Args for imaging a simulated snapshot of an array.
pub struct RascilTweaksContext {
    /// Where the tile positions were read from
    pub tiles_path: PathBuf,
    /// The array layout
    pub config: Configuration,
    /// Local sidereal time of the snapshot \[radians\]
    pub lst_rad: f64,
    /// Phase centre of the simulated visibilities
    pub sim_phase_centre: RADec,
    /// Frequencies of the simulated visibilities \[Hz\]
    pub sim_freqs_hz: Vec<f64>,
    /// Channel width of the simulated visibilities \[Hz\]
    pub sim_chan_width_hz: f64,
    /// Polarisation frame of the simulated visibilities
    pub sim_pol: PolarisationFrame,
    /// Image geometry options
    pub image_options: ImageOptions,
    /// requested kernel oversampling
    pub oversampling: usize,
    /// requested kernel support
    pub support: usize,
}

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

/// stolen from hyperdrive
/// Write many info-level log lines of how this executable was compiled.
///
/// # Errors
///
/// propagates writeln! fails
pub fn fmt_build_info(f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match GIT_HEAD_REF {
        Some(hr) => {
            let dirty = GIT_DIRTY.unwrap_or(false);
            writeln!(
                f,
                "Compiled on git commit hash: {}{}",
                GIT_COMMIT_HASH.unwrap_or("<unknown>"),
                if dirty { " (dirty)" } else { "" }
            )?;
            writeln!(f, "            git head ref: {hr}")?;
        }
        None => writeln!(f, "Compiled on git commit hash: <no git info>")?,
    }
    writeln!(f, "            {BUILT_TIME_UTC}")?;
    writeln!(f, "         with compiler {RUSTC_VERSION}")?;
    writeln!(f)?;
    Ok(())
}

/// A table of the axes of a world coordinate system.
pub fn fmt_wcs(wcs: &Wcs) -> String {
    let mut wcs_table = table!(["", "ctype", "crpix", "crval", "cdelt"]);
    wcs_table.set_format(*prettyformat::consts::FORMAT_CLEAN);
    for (axis_idx, axis) in wcs.axes.iter().enumerate() {
        wcs_table.add_row(row![r =>
            format!("{}:", axis_idx + 1),
            axis.ctype,
            axis.crpix,
            format!("{:.6e}", axis.crval),
            format!("{:.6e}", axis.cdelt)
        ]);
    }
    format!("{} (equinox {})\n{}", wcs.radesys, wcs.equinox, wcs_table)
}

fn value_of<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>, RascilTweaksError>
where
    T: FromStr,
    <T as FromStr>::Err: Display,
{
    match matches.value_of_t::<T>(name) {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.kind() == ArgumentNotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn values_of<T>(matches: &ArgMatches, name: &str) -> Result<Option<Vec<T>>, RascilTweaksError>
where
    T: FromStr,
    <T as FromStr>::Err: Display,
{
    match matches.values_of_t::<T>(name) {
        Ok(values) => Ok(Some(values)),
        Err(err) if err.kind() == ArgumentNotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

impl Display for RascilTweaksContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} version {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
        )?;

        fmt_build_info(f)?;

        writeln!(
            f,
            "Tile positions:       {} ({} tiles)",
            self.tiles_path.display(),
            self.config.num_antennas()
        )?;
        writeln!(f, "Array position:       {}", &self.config.location)?;
        writeln!(
            f,
            "LST:                  {:.4}°",
            self.lst_rad.to_degrees()
        )?;
        writeln!(f, "Phase centre:         {}", &self.sim_phase_centre)?;
        writeln!(
            f,
            "Simulated channels:   {} x {} Hz from {:?} Hz, {}",
            self.sim_freqs_hz.len(),
            self.sim_chan_width_hz,
            self.sim_freqs_hz.first(),
            self.sim_pol
        )?;
        write!(f, "Image options:\n{}", self.image_options)?;
        if self.oversampling != BOX_OVERSAMPLING || self.support != BOX_SUPPORT {
            writeln!(
                f,
                "Box kernel oversampling {} and support {} will be ignored.",
                self.oversampling, self.support
            )?;
        }
        Ok(())
    }
}

impl RascilTweaksContext {
    fn get_matches<I, T>(args: I) -> Result<ArgMatches, RascilTweaksError>
    where
        I: IntoIterator<Item = T> + Debug,
        T: Into<OsString> + Clone,
    {
        let app = command!()
            .next_line_help(false)
            .about(
                "Synthesize an image for a snapshot of an array layout, grid a \
                    point source into it with a box-car kernel and image it.",
            )
            .args(&[
                // input options
                arg!(-t --tiles <PATH> "Tile positions file, east north height [metres] per line")
                    .required(false)
                    .default_value(DEFAULT_MWA_TILES_FILENAME)
                    .value_hint(FilePath)
                    .help_heading("INPUT"),
                arg!(--"args-file" <PATH>)
                    .help(ARG_FILE_HELP.as_str())
                    .required(false)
                    .value_hint(FilePath)
                    .help_heading("INPUT"),
                arg!(--"dry-run" "Just print the summary and exit"),

                // simulation options
                arg!(--lst <DEGREES> "Local sidereal time of the snapshot")
                    .required(false)
                    .default_value("0")
                    .allow_hyphen_values(true)
                    .help_heading("SIMULATION"),
                arg!(--"sim-phase-centre" "Phase centre of the snapshot (degrees), default zenith")
                    .value_names(&["RA", "DEC"])
                    .allow_hyphen_values(true)
                    .required(false)
                    .help_heading("SIMULATION"),
                arg!(--"sim-freqs" <HZ>... "Channel frequencies of the snapshot")
                    .multiple_values(true)
                    .required(false)
                    .default_value(DEFAULT_SIM_FREQ_HZ)
                    .help_heading("SIMULATION"),
                arg!(--"sim-chan-width" <HZ> "Channel width of the snapshot")
                    .required(false)
                    .default_value(DEFAULT_SIM_CHAN_WIDTH_HZ)
                    .help_heading("SIMULATION"),
                arg!(--"sim-pol" <NAMES>... "Polarisation frame, or its components, of the snapshot")
                    .multiple_values(true)
                    .required(false)
                    .default_value("stokesI")
                    .help_heading("SIMULATION"),

                // image options
                arg!(--"image-centre" "Image centre (degrees)")
                    .value_names(&["RA", "DEC"])
                    .allow_hyphen_values(true)
                    .required(false)
                    .help_heading("IMAGE"),
                arg!(--"phase-centre" "Override phase centre of the image (degrees)")
                    .value_names(&["RA", "DEC"])
                    .allow_hyphen_values(true)
                    .required(false)
                    .help_heading("IMAGE"),
                arg!(--freqs <HZ>... "Override image frequencies, the first is the reference")
                    .multiple_values(true)
                    .required(false)
                    .help_heading("IMAGE"),
                arg!(--nchan <COUNT> "Number of image channels")
                    .required(false)
                    .help_heading("IMAGE"),
                arg!(--"chan-width" <HZ> "Image channel width")
                    .required(false)
                    .help_heading("IMAGE"),
                arg!(--npixel <PIXELS> "Image width and height")
                    .required(false)
                    .help_heading("IMAGE"),
                arg!(--cellsize <RADIANS> "Image cellsize")
                    .required(false)
                    .help_heading("IMAGE"),
                arg!(--"no-override-cellsize" "Keep a cellsize coarser than critical")
                    .help_heading("IMAGE"),
                arg!(--pol <NAMES>... "Image polarisation frame, or its components")
                    .multiple_values(true)
                    .required(false)
                    .help_heading("IMAGE"),
                arg!(--frame <FRAME> "Celestial reference frame")
                    .required(false)
                    .help_heading("IMAGE"),
                arg!(--equinox <YEARS> "Equinox of the celestial reference frame")
                    .required(false)
                    .help_heading("IMAGE"),

                // gridding options
                arg!(--oversampling <COUNT> "Box kernel oversampling, always 1")
                    .required(false)
                    .default_value("1")
                    .help_heading("GRIDDING"),
                arg!(--support <COUNT> "Box kernel support, always 4")
                    .required(false)
                    .default_value("4")
                    .help_heading("GRIDDING"),
            ]);

        Ok(app.try_get_matches_from(args)?)
    }

    fn parse_image_matches(matches: &ArgMatches) -> Result<ImageOptions, RascilTweaksError> {
        let cli_args = ImageArgs {
            image_centre: values_of(matches, "image-centre")?,
            phase_centre: values_of(matches, "phase-centre")?,
            freqs_hz: values_of(matches, "freqs")?,
            nchan: value_of(matches, "nchan")?,
            channel_bandwidth_hz: value_of(matches, "chan-width")?,
            npixel: value_of(matches, "npixel")?,
            cellsize_rad: value_of(matches, "cellsize")?,
            no_override_cellsize: matches.is_present("no-override-cellsize"),
            pol: values_of(matches, "pol")?,
            frame: value_of(matches, "frame")?,
            equinox: value_of(matches, "equinox")?,
        };
        let image_args = match matches.value_of("args-file") {
            Some(args_file) => {
                debug!("Merging command-line arguments with the argument file");
                cli_args.merge_file(args_file)?
            }
            None => cli_args,
        };
        trace!("image args:\n{:?}", &image_args);
        Ok(image_args.into_options()?)
    }

    /// Parse an iterator of arguments, `args` into a `RascilTweaksContext`.
    ///
    /// # Errors
    ///
    /// Can raise:
    /// - `clap::Error` if clap cannot parse `args`
    /// - `ConfigurationError` if the tile file can't be read
    /// - `ArgsError` if the image arguments are invalid
    /// - `DryRun` if `--dry-run` was given
    pub fn from_args<I, T>(args: I) -> Result<Self, RascilTweaksError>
    where
        I: IntoIterator<Item = T> + Debug,
        T: Into<OsString> + Clone,
    {
        debug!("args:\n{:?}", &args);

        let matches = Self::get_matches(args)?;
        trace!("arg matches:\n{:?}", &matches);

        let tiles_path = PathBuf::from(
            matches
                .value_of("tiles")
                .unwrap_or(DEFAULT_MWA_TILES_FILENAME),
        );
        let config = Configuration::mwa_from_tile_file(&tiles_path)?;
        debug!("{} tiles read from {}", config.num_antennas(), tiles_path.display());

        let lst_rad = value_of::<f64>(&matches, "lst")?
            .unwrap_or_default()
            .to_radians();
        let sim_phase_centre = match values_of::<f64>(&matches, "sim-phase-centre")? {
            Some(v) => RADec::new(v[0].to_radians(), v[1].to_radians()),
            None => RADec::new(lst_rad, config.location.latitude_rad),
        };
        let sim_freqs_hz = values_of(&matches, "sim-freqs")?.unwrap_or_default();
        let sim_chan_width_hz = value_of(&matches, "sim-chan-width")?.unwrap_or_default();
        let sim_pol = match matches.values_of("sim-pol") {
            Some(names) => PolarisationFrame::from_names(names.collect::<Vec<_>>().as_slice())?,
            None => PolarisationFrame::default(),
        };

        let image_options = Self::parse_image_matches(&matches)?;
        let oversampling = value_of(&matches, "oversampling")?.unwrap_or(BOX_OVERSAMPLING);
        let support = value_of(&matches, "support")?.unwrap_or(BOX_SUPPORT);

        let result = Self {
            tiles_path,
            config,
            lst_rad,
            sim_phase_centre,
            sim_freqs_hz,
            sim_chan_width_hz,
            sim_pol,
            image_options,
            oversampling,
            support,
        };

        info!("{}", &result);

        if matches.is_present("dry-run") {
            return Err(DryRun {});
        }

        Ok(result)
    }

    /// Simulate a snapshot of unit visibilities (a point source at the phase
    /// centre), grid it into a synthesized image template with a box-car
    /// kernel, and transform the grid into an image.
    ///
    /// Returns the grid-corrected image and the summed weights `[chan][pol]`.
    ///
    /// # Errors
    ///
    /// can raise:
    /// - `VisibilityError` if the simulation parameters are inconsistent
    /// - `ImagingError` if the image can't be synthesized, or the image
    ///     polarisations don't match the snapshot's.
    pub fn run(self) -> Result<(Image<Complex<f64>>, Array2<f64>), RascilTweaksError> {
        let RascilTweaksContext {
            config,
            lst_rad,
            sim_phase_centre,
            sim_freqs_hz,
            sim_chan_width_hz,
            sim_pol,
            image_options,
            oversampling,
            support,
            ..
        } = self;

        let sim_chan_widths_hz = vec![sim_chan_width_hz; sim_freqs_hz.len()];
        let mut vis = Visibility::simulate_snapshot(
            &config,
            sim_phase_centre,
            lst_rad,
            sim_freqs_hz,
            sim_chan_widths_hz,
            sim_pol,
        )?;
        vis.vis_mut().fill(Complex::new(1.0, 0.0));

        let template = create_image_from_visibility(&vis, &image_options)?;
        let (nchan, npol, ny, nx) = template.shape();
        info!("Image shape ({nchan}, {npol}, {ny}, {nx}), WCS:\n{}", fmt_wcs(template.wcs()));

        let (gcf, cf) =
            create_box_convolution_function(&template, oversampling, support, None)?;
        let mut griddata = GridData::from_image(&template)?;
        let (du, dv) = griddata.uv_cellsize();
        debug!("uv cell {du:.3} x {dv:.3} wavelengths");
        let sumwt = grid_visibility_nearest(&vis, &mut griddata, &cf)?;
        info!("Sum of weights: {sumwt}");

        let image = fft_griddata_to_image(&griddata, &template, Some(&gcf), None)?;
        if let Some(((chan, pol, y, x), peak)) = image
            .pixels()
            .indexed_iter()
            .max_by(|(_, a), (_, b)| a.norm().total_cmp(&b.norm()))
        {
            info!("Image peak {peak:.4} at channel {chan}, polarisation {pol}, pixel ({x}, {y})");
        }

        Ok((image, sumwt))
    }
}

#[cfg(test)]
mod argparse_tests {
    use std::io::Write;

    use approx::assert_abs_diff_eq;
    use tempfile::NamedTempFile;

    use super::*;

    fn tile_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# east north height").unwrap();
        for (e, n) in [(0.0, 0.0), (40.0, 10.0), (-25.0, 60.0), (80.0, -45.0), (-70.0, -20.0)] {
            writeln!(file, "{e},{n},377").unwrap();
        }
        file
    }

    #[test]
    fn test_parse_missing_tiles() {
        let result = RascilTweaksContext::from_args([
            "rascil_tweaks",
            "--tiles",
            "/this/does/not/exist.csv",
        ]);
        assert!(matches!(
            result,
            Err(RascilTweaksError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_defaults() {
        let tiles = tile_file();
        let ctx = RascilTweaksContext::from_args([
            "rascil_tweaks",
            "-t",
            tiles.path().to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(ctx.config.num_antennas(), 5);
        assert_eq!(ctx.lst_rad, 0.0);
        assert_eq!(ctx.sim_freqs_hz, vec![150e6]);
        assert_eq!(ctx.sim_chan_width_hz, 40e3);
        assert_eq!(ctx.sim_pol, PolarisationFrame::StokesI);
        assert_abs_diff_eq!(ctx.sim_phase_centre.dec, ctx.config.location.latitude_rad);
        assert_eq!(ctx.image_options, ImageOptions::default());
        assert_eq!((ctx.oversampling, ctx.support), (1, 4));

        let display = format!("{}", &ctx);
        assert!(display.contains("5 tiles"));
    }

    #[test]
    fn test_parse_image_args() {
        let tiles = tile_file();
        #[rustfmt::skip]
        let ctx = RascilTweaksContext::from_args([
            "rascil_tweaks",
            "-t", tiles.path().to_str().unwrap(),
            "--phase-centre", "10.0", "-27.0",
            "--npixel", "128",
            "--cellsize", "0.001",
            "--no-override-cellsize",
            "--pol", "XX", "YY",
            "--frame", "FK5",
        ])
        .unwrap();
        let options = ctx.image_options;
        assert_abs_diff_eq!(options.phase_centre.unwrap().dec, (-27_f64).to_radians());
        assert_eq!(options.npixel, 128);
        assert_eq!(options.cellsize_rad, Some(0.001));
        assert!(!options.override_cellsize);
        assert_eq!(options.polarisation_frame, Some(PolarisationFrame::LinearNp));
        assert_eq!(options.frame, "FK5");
    }

    #[test]
    fn test_parse_args_file() {
        let tiles = tile_file();
        let mut args_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(args_file, "npixel = 64\nnchan = 1\nequinox = 1950.0").unwrap();
        #[rustfmt::skip]
        let ctx = RascilTweaksContext::from_args([
            "rascil_tweaks",
            "-t", tiles.path().to_str().unwrap(),
            "--args-file", args_file.path().to_str().unwrap(),
            "--npixel", "32",
        ])
        .unwrap();
        assert_eq!(ctx.image_options.npixel, 32);
        assert_eq!(ctx.image_options.num_chans, Some(1));
        assert_eq!(ctx.image_options.equinox, 1950.0);
    }

    #[test]
    fn test_parse_invalid_npixel() {
        let tiles = tile_file();
        #[rustfmt::skip]
        let result = RascilTweaksContext::from_args([
            "rascil_tweaks",
            "-t", tiles.path().to_str().unwrap(),
            "--npixel", "lots",
        ]);
        assert!(matches!(result, Err(RascilTweaksError::ClapError(_))));

        #[rustfmt::skip]
        let result = RascilTweaksContext::from_args([
            "rascil_tweaks",
            "-t", tiles.path().to_str().unwrap(),
            "--npixel", "0",
        ]);
        assert!(matches!(result, Err(RascilTweaksError::Args(_))));
    }

    #[test]
    fn test_dry_run() {
        let tiles = tile_file();
        #[rustfmt::skip]
        let result = RascilTweaksContext::from_args([
            "rascil_tweaks",
            "-t", tiles.path().to_str().unwrap(),
            "--dry-run",
        ]);
        assert!(matches!(result, Err(DryRun {})));
    }

    #[test]
    fn test_run_images_point_source_at_centre() {
        let tiles = tile_file();
        #[rustfmt::skip]
        let ctx = RascilTweaksContext::from_args([
            "rascil_tweaks",
            "-t", tiles.path().to_str().unwrap(),
            "--npixel", "64",
        ])
        .unwrap();
        let (image, sumwt) = ctx.run().unwrap();
        assert_eq!(image.shape(), (1, 1, 64, 64));
        // 5 tiles make 10 baselines, all within the grid.
        assert_eq!(sumwt[[0, 0]], 10.0);
        let centre = image.pixels()[[0, 0, 32, 32]];
        assert_abs_diff_eq!(centre.re, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(centre.im, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_run_images_channels_wider_apart_than_their_width() {
        let tiles = tile_file();
        #[rustfmt::skip]
        let ctx = RascilTweaksContext::from_args([
            "rascil_tweaks",
            "-t", tiles.path().to_str().unwrap(),
            "--npixel", "64",
            "--sim-freqs", "150e6", "151.28e6",
        ])
        .unwrap();
        assert_eq!(ctx.sim_chan_width_hz, 40e3);
        let (image, sumwt) = ctx.run().unwrap();
        assert_eq!(image.shape(), (2, 1, 64, 64));
        assert_eq!(sumwt, marlu::ndarray::array![[10.0], [10.0]]);
        for chan in 0..2 {
            assert_abs_diff_eq!(image.pixels()[[chan, 0, 32, 32]].re, 10.0, epsilon = 1e-9);
        }
    }
}
