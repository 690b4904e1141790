//! Stateless hash-based 2D gradient noise generator.

/// Get the noise value at the given 2D coordinates for the given seed. The
/// value is deterministic and continuous, in a range of approximately -1 to 1,
/// and exactly zero on integer lattice points. There is no state and no I/O,
/// so this is safe to call from concurrent generation tasks.
pub fn sample(x: f32, y: f32, seed: i32) -> f32 {

    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let sx = fade(x - x0 as f32);
    let sy = fade(y - y0 as f32);

    let n0 = grad_dot(x0, y0, x, y, seed);
    let n1 = grad_dot(x1, y0, x, y, seed);
    let ix0 = lerp(sx, n0, n1);

    let n0 = grad_dot(x0, y1, x, y, seed);
    let n1 = grad_dot(x1, y1, x, y, seed);
    let ix1 = lerp(sx, n0, n1);

    lerp(sy, ix0, ix1)

}

/// Quintic fade curve, flattening the interpolation factor near the lattice.
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(factor: f32, from: f32, to: f32) -> f32 {
    from + factor * (to - from)
}

/// Dot product between the pseudo-random unit gradient of a lattice corner
/// and the offset from that corner to the sampled point. The gradient angle
/// is derived from a hash of the corner and the seed.
#[inline]
fn grad_dot(ix: i32, iy: i32, x: f32, y: f32, seed: i32) -> f32 {
    let mut hash = ix.wrapping_mul(374761393).wrapping_add(iy.wrapping_mul(668265263)) ^ seed;
    hash = (hash ^ (hash >> 13)).wrapping_mul(1274126177);
    let angle = (hash & 1023) as f32 / 1023.0 * std::f32::consts::TAU;
    let (sin, cos) = angle.sin_cos();
    cos * (x - ix as f32) + sin * (y - iy as f32)
}
