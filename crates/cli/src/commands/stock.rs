//! Stock maintenance commands.

use rentacam_admin::services::ProductService;

use super::connect;

/// Reconcile product stock with inventory and print the report.
///
/// # Errors
///
/// Returns an error if the store is unreachable or an update fails.
pub async fn reconcile(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = connect().await?;
    let report = ProductService::new(&store).reconcile_stock(force).await?;

    tracing::info!("Reconciliation complete!");
    tracing::info!("  Products checked: {}", report.checked);
    tracing::info!("  Products adjusted: {}", report.adjusted.len());
    for adjustment in &report.adjusted {
        tracing::info!(
            "    - {} ({}): {} -> {}",
            adjustment.product_id,
            adjustment.inventory_id,
            adjustment.from,
            adjustment.to
        );
    }
    if !report.missing_inventory.is_empty() {
        tracing::warn!(
            "  Products pointing at missing inventory: {}",
            report.missing_inventory.len()
        );
        for product_id in &report.missing_inventory {
            tracing::warn!("    - {product_id}");
        }
    }

    Ok(())
}
