use rand::Rng;

/// Returns a uniformly shuffled copy of `items`, leaving the input untouched.
///
/// Fisher-Yates from the back: each position `i` swaps with a uniformly chosen
/// `j` in `0..=i`, so every permutation is equally likely.
pub fn shuffled<T: Clone, R: Rng + ?Sized>(rng: &mut R, items: &[T]) -> Vec<T> {
    let mut output = items.to_vec();

    for i in (1..output.len()).rev() {
        let j = rng.gen_range(0..=i);
        output.swap(i, j);
    }

    output
}
