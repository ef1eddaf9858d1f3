/// Preferred offset of one advert repeat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTarget {
    pub advert_index: usize,
    pub target: i64,
}

/// Spreads the repeats of every advert evenly over the window
///
/// Advert `i` with `n` repeats aims at `(k + phase_i) * window / n`. The
/// phase staggers adverts so they do not all start at opening time.
/// Results are ordered by target, ties by advert index.
pub fn spread_repeats(window_len: i64, repeats: &[u32]) -> Vec<RepeatTarget> {
    let scheduled = repeats.iter().filter(|&&n| n > 0).count();
    let mut targets = Vec::with_capacity(repeats.iter().map(|&n| n as usize).sum());
    let mut stagger = 0usize;

    for (advert_index, &n) in repeats.iter().enumerate() {
        if n == 0 {
            continue;
        }
        let interval = window_len as f64 / f64::from(n);
        let phase = stagger as f64 / scheduled as f64;
        for k in 0..n {
            targets.push(RepeatTarget {
                advert_index,
                target: ((f64::from(k) + phase) * interval).floor() as i64,
            });
        }
        stagger += 1;
    }

    targets.sort_by(|a, b| {
        a.target
            .cmp(&b.target)
            .then(a.advert_index.cmp(&b.advert_index))
    });
    targets
}
