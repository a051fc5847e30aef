use rust_photo_scaler::{Dimensions, compute_fit};

fn assert_aspect_preserved(w0: u32, h0: u32, w1: u32, h1: u32) {
    // One pixel of rounding on the derived side is the most we can lose.
    let r0 = (w0 as f64) / (h0 as f64);
    let lo = (w1 as f64 - 0.5).max(0.5) / (h1 as f64 + 0.5);
    let hi = (w1 as f64 + 0.5) / (h1 as f64 - 0.5).max(0.5);
    assert!(
        lo <= r0 && r0 <= hi,
        "aspect changed: {w0}x{h0} -> {w1}x{h1}"
    );
}

#[test]
fn landscape_photo_into_1080p_box() {
    let fit = compute_fit(Dimensions::new(4032, 3024), 1920, 1080).unwrap();
    assert_eq!((fit.target_width, fit.target_height), (1440, 1080));
    assert_eq!(fit.subsample, 2);
    assert_aspect_preserved(4032, 3024, fit.target_width, fit.target_height);
}

#[test]
fn portrait_photo_into_portrait_box() {
    let fit = compute_fit(Dimensions::new(3024, 4032), 1080, 1920).unwrap();
    assert_eq!((fit.target_width, fit.target_height), (1080, 1440));
    assert_eq!(fit.subsample, 2);
}

#[test]
fn fit_is_idempotent() {
    let a = compute_fit(Dimensions::new(1234, 567), 300, 200).unwrap();
    let b = compute_fit(Dimensions::new(1234, 567), 300, 200).unwrap();
    assert_eq!(a, b);
}

#[test]
fn fit_properties_hold_across_shapes() {
    let sides = [1u32, 3, 17, 100, 333, 640, 1000, 4096];
    let boxes = [1u32, 2, 50, 99, 256, 1080, 5000];
    for &w in &sides {
        for &h in &sides {
            for &bw in &boxes {
                for &bh in &boxes {
                    let fit = compute_fit(Dimensions::new(w, h), bw, bh).unwrap();
                    assert!(fit.target_width <= bw, "{w}x{h} in {bw}x{bh}: {fit:?}");
                    assert!(fit.target_height <= bh, "{w}x{h} in {bw}x{bh}: {fit:?}");
                    assert!(fit.target_width >= 1 && fit.target_height >= 1);
                    assert!(fit.subsample.is_power_of_two(), "{fit:?}");
                    assert!(fit.target_width == bw || fit.target_height == bh);

                    // Subsampled decode still covers the target...
                    let s = fit.subsample;
                    assert!(w / s >= fit.target_width || s == 1, "{fit:?}");
                    assert!(h / s >= fit.target_height || s == 1, "{fit:?}");
                    // ...and one more halving would not.
                    assert!(
                        w / s / 2 < fit.target_width || h / s / 2 < fit.target_height,
                        "{w}x{h} in {bw}x{bh}: {fit:?}"
                    );

                    let clamped = fit.target_width == 1 || fit.target_height == 1;
                    if !clamped {
                        assert_aspect_preserved(w, h, fit.target_width, fit.target_height);
                    }
                }
            }
        }
    }
}
