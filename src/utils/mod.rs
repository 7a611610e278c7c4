pub mod metrics;
pub mod validation;

/// Dot product accumulated in `f64`, strictly left to right.
///
/// Accumulation order is fixed so repeated runs stay bit-identical.
pub fn sequential_dot<'a, T>(
    a: impl IntoIterator<Item = &'a T>,
    b: impl IntoIterator<Item = &'a T>,
) -> f64
where
    T: Copy + Into<f64> + 'a,
{
    a.into_iter()
        .zip(b)
        .fold(0.0, |sum, (&x, &y)| {
            let (x, y): (f64, f64) = (x.into(), y.into());
            sum + x * y
        })
}
