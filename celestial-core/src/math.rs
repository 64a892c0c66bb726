/// Reduce `x` into `[0, y)`, unlike `libm::fmod` which keeps the sign of `x`.
#[inline]
pub fn fmodulo(x: f64, y: f64) -> f64 {
    let r = libm::fmod(x, y);
    if r < 0.0 {
        let shifted = r + y;
        if shifted >= y {
            0.0
        } else {
            shifted
        }
    } else {
        r
    }
}
