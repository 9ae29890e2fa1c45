use super::*;

fn source() -> SourceImage {
    SourceImage::from_bytes("s.png", "image/png", vec![0u8; 4]).unwrap()
}

#[test]
fn steps_are_evenly_spaced_and_end_at_100() {
    for n in MIN_STEPS..=MAX_STEPS {
        let steps = quality_steps(n).unwrap();
        assert_eq!(steps.len(), usize::from(n));
        assert_eq!(steps.last().unwrap().get(), 100.0, "n = {n}");
        for (idx, q) in steps.iter().enumerate() {
            let expected = 100.0 / f64::from(n) * (idx + 1) as f64;
            assert!((q.get() - expected).abs() < 1e-9, "n = {n}, idx = {idx}");
        }
        assert!(steps.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn five_steps_are_round_numbers() {
    let steps: Vec<f64> = quality_steps(5).unwrap().iter().map(|q| q.get()).collect();
    assert_eq!(steps, vec![20.0, 40.0, 60.0, 80.0, 100.0]);
}

#[test]
fn step_count_out_of_range_is_rejected() {
    for n in [0, 11, u8::MAX] {
        assert!(matches!(quality_steps(n), Err(ImgcmpError::Validation(_))));
    }
}

#[test]
fn request_parameters_carry_mode_and_preset() {
    let req = SweepRequest::new(source(), 3)
        .lossless(true)
        .preset(Some(WebpPreset::Drawing));
    let params = req.parameters().unwrap();
    assert_eq!(params.len(), 3);
    assert!(params.iter().all(|p| p.lossless && p.preset == Some(WebpPreset::Drawing)));
    assert_eq!(params[2].quality, Quality::MAX);
}

#[test]
fn request_with_bad_step_count_has_no_parameters() {
    let req = SweepRequest::new(source(), 0);
    assert!(req.parameters().is_err());
}
