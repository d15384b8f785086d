/// Serves a value from the metadata cache, computing and caching it on a miss.
///
/// # Arguments
/// * `$cache`: a [`Cache`](crate::db::Cache).
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) for the value.
/// * `$ttl`: time-to-live for the cached value in seconds.
/// * `$block`: future computing the value when it is not cached.
///
/// Use it as the tail expression of a function returning `AppResult`, so the
/// error type is inferred from the signature.
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache, key, ttl, async move {
///     self.fetch("/movie/popular", &params).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
