//! Connectivity check.

use innovacart_firebase::Repositories;

use super::CliError;

/// Verify the database answers and report what it holds.
///
/// # Errors
///
/// Returns `CliError::Invalid` when the database is unreachable, or
/// `CliError::Repository` if a read fails.
pub async fn run(repos: &Repositories) -> Result<(), CliError> {
    let backend = repos.database.backend_name();
    if !repos.database.connected().await {
        return Err(CliError::Invalid(format!("{backend} database is not reachable")));
    }

    let (products, orders, coupons) = tokio::try_join!(
        repos.products.list(),
        repos.orders.list(),
        repos.coupons.list()
    )?;
    tracing::info!(
        backend,
        products = products.len(),
        orders = orders.len(),
        coupons = coupons.len(),
        "Database reachable"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use innovacart_firebase::RealtimeDatabase;

    #[tokio::test]
    async fn test_memory_backend_is_reachable() {
        let repos = Repositories::new(RealtimeDatabase::memory());
        run(&repos).await.unwrap();
    }
}
