/// Router Module Index
///
/// Splits the endpoints by whether they sit behind the auth gate. The gate itself is the
/// `Authorized` extractor in each handler signature, so the split documents intent rather
/// than applying a layer.

/// Routes that accept anonymous callers.
pub mod public;

/// Routes whose handlers take `Authorized<T>` and so reject bad credentials before running.
pub mod authenticated;
