//! Position strategy distribution tests.

use ants_core::{
    position::{edge_biased, fixed_center, ring_biased, uniform, PositionStrategy, Point},
    rng::{RandomSource, RngBank, ScriptedRng, StreamSlot},
};

const CANVAS: f64 = 600.0;

fn in_canvas(p: &Point) -> bool {
    (0.0..=CANVAS).contains(&p.x) && (0.0..=CANVAS).contains(&p.y)
}

#[test]
fn ring_radius_is_bimodal_with_one_in_five_inside() {
    const N: usize = 10_000;
    let mut rng = RngBank::new(0xA11_CE).stream(StreamSlot::Motion);
    let center = fixed_center(CANVAS);
    let max = CANVAS / 2.0;

    let mut inner = 0usize;
    for _ in 0..N {
        let p = ring_biased(CANVAS, &mut rng);
        assert!(in_canvas(&p), "ring sample outside canvas: {p:?}");

        let r = p.distance_to(&center);
        if (r - 0.2 * max).abs() < 1e-6 {
            inner += 1;
        } else {
            assert!((r - 0.8 * max).abs() < 1e-6, "radius {r} is neither ring");
        }
    }

    let share = inner as f64 / N as f64;
    assert!(
        (share - 0.2).abs() < 0.03,
        "inner share {share:.3} is too far from 0.2"
    );
}

#[test]
fn ring_covers_both_half_planes() {
    let mut rng = RngBank::new(17).stream(StreamSlot::Motion);
    let max = CANVAS / 2.0;
    let (mut left, mut right) = (0, 0);
    for _ in 0..1000 {
        let p = ring_biased(CANVAS, &mut rng);
        if p.x < max { left += 1 } else { right += 1 }
    }
    assert!(left > 300 && right > 300, "left={left} right={right}");
}

#[test]
fn edge_samples_always_lie_on_a_computed_edge() {
    let mut rng = RngBank::new(0xED6E).stream(StreamSlot::Motion);
    for _ in 0..5000 {
        let s = edge_biased(CANVAS, &mut rng);
        let p = s.point;
        let on_edge = p.x == s.margin || p.x == s.far_edge || p.y == s.margin || p.y == s.far_edge;
        assert!(on_edge, "edge sample {p:?} not on margin {} / far edge {}", s.margin, s.far_edge);
        assert!(in_canvas(&p), "edge sample outside canvas: {p:?}");
    }
}

#[test]
fn edge_band_width_follows_band_roll() {
    // side roll, band roll, along roll
    let mut wide = ScriptedRng::new(vec![0.9, 0.5, 0.0]);
    let mut narrow = ScriptedRng::new(vec![0.9, 0.8, 0.0]);

    let w = edge_biased(100.0, &mut wide);
    let n = edge_biased(100.0, &mut narrow);

    assert!((w.margin - 10.0).abs() < 1e-9 && (w.far_edge - 90.0).abs() < 1e-9);
    assert!((n.margin - 30.0).abs() < 1e-9 && (n.far_edge - 70.0).abs() < 1e-9);
}

#[test]
fn uniform_fills_the_canvas() {
    let mut rng = RngBank::new(3).stream(StreamSlot::Motion);
    let mut quadrants = [0usize; 4];
    for _ in 0..4000 {
        let p = uniform(CANVAS, &mut rng);
        assert!((0.0..CANVAS).contains(&p.x) && (0.0..CANVAS).contains(&p.y));
        let q = usize::from(p.x >= CANVAS / 2.0) + 2 * usize::from(p.y >= CANVAS / 2.0);
        quadrants[q] += 1;
    }
    assert!(quadrants.iter().all(|&c| c > 800), "quadrants {quadrants:?}");
}

#[test]
fn center_ignores_the_random_source() {
    let mut rng = ScriptedRng::new(vec![0.3]);
    let p = PositionStrategy::Center.sample(CANVAS, &mut rng);
    assert_eq!(p, Point::new(300.0, 300.0));
    assert_eq!(rng.next_f64(), 0.3, "center must not draw from the source");
}
