// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::ErrorKind::{DisplayHelp, DisplayVersion};
use log::{info, trace};
use rascil_tweaks::{
    cli::RascilTweaksContext,
    RascilTweaksError::{ClapError, DryRun},
};
use std::{env, ffi::OsString, fmt::Debug};

fn main_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    I: Debug,
{
    let ctx = match RascilTweaksContext::from_args(args) {
        Ok(ctx) => ctx,
        Err(DryRun {}) => {
            info!("Dry run. Nothing will be imaged.");
            return 0;
        }
        Err(ClapError(inner)) => {
            // Swallow broken pipe errors
            trace!("clap error: {:?}", inner.kind());
            let _ = inner.print();
            match inner.kind() {
                DisplayHelp | DisplayVersion => return 0,
                _ => return 1,
            }
        }
        Err(e) => {
            eprintln!("error parsing args: {e}");
            return 1;
        }
    };

    match ctx.run() {
        Ok((image, sumwt)) => {
            let (nchan, npol, ny, nx) = image.shape();
            info!(
                "imaged {} weights into {nchan} channels, {npol} polarisations of {nx}x{ny} pixels",
                sumwt.sum()
            );
            0
        }
        Err(e) => {
            eprintln!("imaging error: {e}");
            1
        }
    }
}

fn main() {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );
    trace!("start main");
    let retcode = main_with_args(env::args());
    trace!("end main");
    std::process::exit(retcode);
}
