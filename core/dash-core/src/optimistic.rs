//! Apply a tentative value, await confirmation, revert on failure.

use std::future::Future;

/// Sets `tentative` through `set` before `confirm` resolves.
///
/// If confirmation fails the value read by `get` beforehand is written back
/// and the error is returned. On success the tentative value stays; callers
/// typically reconcile from the server afterwards.
pub async fn apply_tentative<V, R, E, G, S, C, Fut>(
    get: G,
    set: S,
    tentative: V,
    confirm: C,
) -> Result<R, E>
where
    G: FnOnce() -> V,
    S: Fn(V),
    C: FnOnce() -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let prior = get();
    set(tentative);
    match confirm().await {
        Ok(value) => Ok(value),
        Err(err) => {
            set(prior);
            Err(err)
        }
    }
}
