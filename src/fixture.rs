//! Reference host routine with one instrumented change.
//!
//! The accumulator seed of [`even_total`] changed from `-1` (old) to `0`
//! (new). For `a = 2, b = 4` the old build computes 5 and the new one 6.
//! Arithmetic wraps on overflow.

use crate::context::ExecutionContext;
use crate::site::VariantSite;

/// Site of the even-total seed change.
pub const EVEN_SEED_SITE: VariantSite = VariantSite::numbered(1);

/// Odd totals below this are clamped to zero.
const ODD_TOTAL_FLOOR: i64 = -100_000;

/// Sum of the odd inputs.
pub fn odd_total(a: i64, b: i64) -> i64 {
    [a, b]
        .into_iter()
        .filter(|value| value % 2 != 0)
        .fold(0, i64::wrapping_add)
}

/// Sum of the even inputs, seeded through [`EVEN_SEED_SITE`].
pub fn even_total(ctx: &ExecutionContext, a: i64, b: i64) -> i64 {
    let seed = ctx.select(&EVEN_SEED_SITE, -1, 0);
    [a, b]
        .into_iter()
        .filter(|value| value % 2 == 0)
        .fold(seed, i64::wrapping_add)
}

/// Odd total plus even total.
pub fn compute(ctx: &ExecutionContext, a: i64, b: i64) -> i64 {
    let mut odd = odd_total(a, b);
    let even = even_total(ctx, a, b);
    if odd < ODD_TOTAL_FLOOR {
        odd = 0;
    }
    odd.wrapping_add(even)
}
