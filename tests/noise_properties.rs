//! Statistical and contract checks for forward-diffusion noise.

use aesir_utils::diffusion::NoiseSchedule;
use aesir_utils::{add_diffusion_noise, DenseImage, Error, NoiseInjector, PixelRange};
use approx::assert_abs_diff_eq;
use ndarray::{Array3, ArrayD};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn mean_and_variance(values: &ArrayD<f32>) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| (f64::from(v) - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean, variance)
}

fn textured_tensor() -> Array3<f32> {
    Array3::from_shape_fn((3, 32, 32), |(c, y, x)| {
        ((c * 7 + y * 3 + x) % 11) as f32 / 10.0 - 0.5
    })
}

#[test]
fn pure_noise_at_max_steps() {
    let injector = NoiseInjector::default();
    let image = DenseImage::from(Array3::<f32>::from_elem((64, 64, 3), 0.5));

    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let noised = injector.apply(&image, 1000, &mut rng).unwrap();
        let (mean, variance) = mean_and_variance(noised.as_tensor().unwrap());

        assert_abs_diff_eq!(mean, 0.0, epsilon = 0.05);
        assert_abs_diff_eq!(variance, 1.0, epsilon = 0.05);
    }
}

#[test]
fn residual_variance_grows_with_step() {
    let injector = NoiseInjector::default();
    let schedule = *injector.schedule();
    let data = textured_tensor();
    let image = DenseImage::from(data.clone());

    let mut previous = -1.0;
    for step in (0..=1000).step_by(50) {
        let mut rng = StdRng::seed_from_u64(99);
        let noised = injector.apply(&image, step, &mut rng).unwrap();

        let (signal_scale, _) = schedule.coefficients(u32::try_from(step).unwrap());
        let retained = data.mapv(|v| v * signal_scale as f32).into_dyn();
        let residual = noised.as_tensor().unwrap() - &retained;
        let (_, variance) = mean_and_variance(&residual);

        if step == 0 {
            assert_abs_diff_eq!(variance, 0.0, epsilon = 1e-12);
        }
        assert!(
            variance > previous,
            "variance {variance} at step {step} did not exceed {previous}"
        );
        previous = variance;
    }
}

#[test]
fn residual_matches_noise_coefficient() {
    let schedule = NoiseSchedule::default();
    let injector = NoiseInjector::new(schedule);
    let image = DenseImage::from(Array3::<f32>::zeros((3, 64, 64)));

    let mut rng = StdRng::seed_from_u64(2024);
    let noised = injector.apply(&image, 100, &mut rng).unwrap();
    let (_, variance) = mean_and_variance(noised.as_tensor().unwrap());

    assert_abs_diff_eq!(variance, 1.0 - schedule.alpha_bar(100), epsilon = 0.03);
}

#[test]
fn step_zero_is_identity_for_every_representation() {
    let injector = NoiseInjector::default();
    let inputs = [
        DenseImage::from(textured_tensor()),
        DenseImage::tensor(textured_tensor().mapv(|v| v + 0.5), PixelRange::Unit),
        DenseImage::tensor(textured_tensor().mapv(|v| (v + 0.5) * 255.0), PixelRange::Byte),
        DenseImage::from(Array3::from_shape_fn((4, 4, 3), |(y, x, c)| (y * 60 + x * 5 + c) as u8)),
        DenseImage::from(image::RgbaImage::from_fn(6, 5, |x, y| {
            image::Rgba([x as u8 * 40, y as u8 * 50, 7, 255])
        })),
    ];

    for input in &inputs {
        let mut rng = StdRng::seed_from_u64(0);
        let output = injector.apply(input, 0, &mut rng).unwrap();
        assert_eq!(output.shape(), input.shape());

        match (input.as_tensor(), output.as_tensor()) {
            (Some(a), Some(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    assert_abs_diff_eq!(*x, *y, epsilon = 1e-4);
                }
            }
            _ => assert_eq!(&output, input),
        }
    }
}

#[test]
fn out_of_range_steps_fail() {
    let image = DenseImage::from(textured_tensor());
    let mut rng = StdRng::seed_from_u64(0);

    for step in [-1, 1001] {
        let err = add_diffusion_noise(&image, step, 0.01, 1000, &mut rng).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }), "{err}");
    }

    assert!(add_diffusion_noise(&image, 10, 0.01, 10, &mut rng).is_ok());
    assert!(add_diffusion_noise(&image, 11, 0.01, 10, &mut rng).is_err());
}

#[test]
fn plain_text_is_unsupported() {
    let err = DenseImage::from_any(String::from("a picture of a cat")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { .. }));
}

#[test]
fn seeded_calls_are_bit_identical() {
    let injector = NoiseInjector::default();
    let image = DenseImage::from(textured_tensor());

    let first = injector
        .apply(&image, 640, &mut StdRng::seed_from_u64(17))
        .unwrap();
    let second = injector
        .apply(&image, 640, &mut StdRng::seed_from_u64(17))
        .unwrap();

    let bits = |img: &DenseImage| -> Vec<u32> {
        img.as_tensor().unwrap().iter().map(|v| v.to_bits()).collect()
    };
    assert_eq!(bits(&first), bits(&second));
}
