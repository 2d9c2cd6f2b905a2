/// Cache-aside for AI responses.
///
/// Returns the cached value for `$key` when present. Otherwise runs `$block` on a
/// spawned task that also stores the value, and awaits that task. Dropping the
/// caller leaves the task running, so a response that arrives late is still
/// cached. Errors from the block propagate and nothing is cached.
///
/// `$block` must be a `'static` future: move owned clones into it.
///
/// # Example
/// ```rust,ignore
/// let service = self.clone();
/// let perfumes: Vec<Perfume> = cached!(self.cache, CacheKey::Prompt(prompt.clone()), async move {
///     service.fetch_recommendations(&prompt).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await {
            tracing::debug!(key = %key, "Response cache hit");
            Ok(cached)
        } else {
            tracing::debug!(key = %key, "Response cache miss");
            let cache = $cache.clone();
            let fetch = $block;
            let task = tokio::spawn(async move {
                let result = fetch.await;
                if let Ok(value) = &result {
                    cache.set_in_background(&key, value);
                }
                result
            });
            match task.await {
                Ok(result) => result,
                Err(e) => Err(e.into()),
            }
        }
    }};
}
