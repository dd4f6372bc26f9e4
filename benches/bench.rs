use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rascil_tweaks::{
    constants::MWA_TILE_DIAMETER_M,
    create_box_convolution_function, create_image_from_visibility, fft_griddata_to_image,
    grid_visibility_nearest,
    marlu::{Complex, RADec, ENH},
    Configuration, GridData, ImageOptionsBuilder, PolarisationFrame, Visibility,
};
use std::env;

const NPIXEL: usize = 512;

/// A tile file from `RASCIL_TWEAKS_TILES` if it's set, otherwise 128 tiles on
/// a jittered 16 x 8 grid.
fn get_configuration() -> Configuration {
    if let Ok(path) = env::var("RASCIL_TWEAKS_TILES") {
        return Configuration::mwa_from_tile_file(path).unwrap();
    }
    let enhs: Vec<ENH> = (0..128)
        .map(|i| {
            let (row, col) = ((i / 16) as f64, (i % 16) as f64);
            ENH {
                e: col * 37.0 + (row * 7.3) % 11.0,
                n: row * 53.0 + (col * 5.1) % 13.0,
                h: 0.0,
            }
        })
        .collect();
    Configuration::from_enh(
        "MWA",
        Configuration::mwa_location(),
        &enhs,
        MWA_TILE_DIAMETER_M,
    )
}

fn get_visibility(frame: PolarisationFrame) -> Visibility {
    let config = get_configuration();
    let phase_centre = RADec::new(0.0, config.location.latitude_rad);
    let freqs_hz: Vec<f64> = (0..4).map(|i| 150e6 + i as f64 * 1.28e6).collect();
    let mut vis = Visibility::simulate_snapshot(
        &config,
        phase_centre,
        0.0,
        freqs_hz,
        vec![1.28e6; 4],
        frame,
    )
    .unwrap();
    vis.vis_mut().fill(Complex::new(1.0, 0.0));
    vis
}

fn bench_create_image_from_visibility(crt: &mut Criterion) {
    let vis = get_visibility(PolarisationFrame::Linear);
    let options = ImageOptionsBuilder::default().npixel(NPIXEL).build().unwrap();

    crt.bench_function(
        format!("create_image_from_visibility - {NPIXEL} pixels").as_str(),
        |bch| {
            bch.iter(|| create_image_from_visibility(black_box(&vis), black_box(&options)).unwrap());
        },
    );
}

fn bench_grid_visibility_nearest(crt: &mut Criterion) {
    let vis = get_visibility(PolarisationFrame::Linear);
    let options = ImageOptionsBuilder::default().npixel(NPIXEL).build().unwrap();
    let template = create_image_from_visibility(&vis, &options).unwrap();
    let (_, cf) = create_box_convolution_function(&template, 1, 4, None).unwrap();
    let mut griddata = GridData::from_image(&template).unwrap();

    crt.bench_function(
        format!("grid_visibility_nearest - {} baselines", vis.uvw().dim().1).as_str(),
        |bch| {
            bch.iter(|| {
                grid_visibility_nearest(black_box(&vis), black_box(&mut griddata), black_box(&cf))
                    .unwrap()
            });
        },
    );
}

fn bench_fft_griddata_to_image(crt: &mut Criterion) {
    let vis = get_visibility(PolarisationFrame::StokesI);
    let options = ImageOptionsBuilder::default().npixel(NPIXEL).build().unwrap();
    let template = create_image_from_visibility(&vis, &options).unwrap();
    let (gcf, cf) = create_box_convolution_function(&template, 1, 4, None).unwrap();
    let mut griddata = GridData::from_image(&template).unwrap();
    grid_visibility_nearest(&vis, &mut griddata, &cf).unwrap();

    crt.bench_function(
        format!("fft_griddata_to_image - {NPIXEL}x{NPIXEL}").as_str(),
        |bch| {
            bch.iter(|| {
                fft_griddata_to_image(
                    black_box(&griddata),
                    black_box(&template),
                    black_box(Some(&gcf)),
                    None,
                )
                .unwrap()
            });
        },
    );
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets =
        bench_create_image_from_visibility,
        bench_grid_visibility_nearest,
        bench_fft_griddata_to_image,
);
criterion_main!(benches);
