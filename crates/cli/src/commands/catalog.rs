//! Catalog commands: `products`, `product`, `restock`.

use emporium_core::{Product, ProductId};

use super::{CliError, Context};

/// List the catalog, or the results of a search.
pub async fn list(ctx: &Context, search: Option<&str>) -> Result<(), CliError> {
    let mut products = ctx.product_store();
    let result = match search {
        Some(query) => products.search_products(query).await,
        None => products.fetch_products().await,
    };
    let items = result.map_err(|e| CliError::action(products.status(), e))?;

    #[allow(clippy::print_stdout)]
    {
        if items.is_empty() {
            println!("No products found.");
        }
        for product in &items {
            println!("{}", summary_line(product));
        }
    }
    Ok(())
}

/// Show one product in full.
pub async fn show(ctx: &Context, id: ProductId) -> Result<(), CliError> {
    let mut products = ctx.product_store();
    let product = products
        .fetch_product(id)
        .await
        .map_err(|e| CliError::action(products.status(), e))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{} (#{})", product.name, product.id);
        println!("  Price:    {}", product.price);
        println!("  Stock:    {}", stock_label(&product));
        if let Some(category) = &product.category {
            println!("  Category: {category}");
        }
        if let Some(brand) = &product.brand {
            println!("  Brand:    {brand}");
        }
        if let Some(description) = &product.description {
            println!();
            println!("{description}");
        }
    }
    Ok(())
}

/// Set the stock level of a product.
///
/// Runs with the saved session attached when there is one.
pub async fn restock(ctx: &Context, id: ProductId, quantity: i32) -> Result<(), CliError> {
    let mut users = ctx.user_store();
    if users.initialize_auth().await.is_none() {
        tracing::debug!("No saved session, updating inventory anonymously");
    }

    let mut products = ctx.product_store();
    let product = products
        .update_inventory(id, quantity)
        .await
        .map_err(|e| CliError::action(products.status(), e))?;

    tracing::info!(product_id = %product.id, stock = ?product.stock, "Inventory updated");
    #[allow(clippy::print_stdout)]
    {
        println!("{}: {}", product.name, stock_label(&product));
    }
    Ok(())
}

fn summary_line(product: &Product) -> String {
    format!(
        "{:>6}  {:<32} {:>10}  {}",
        product.id.to_string(),
        product.name,
        product.price.to_string(),
        stock_label(product)
    )
}

fn stock_label(product: &Product) -> String {
    match product.stock {
        Some(stock) if stock > 0 => format!("{stock} in stock"),
        Some(_) => "out of stock".to_string(),
        None => "stock unknown".to_string(),
    }
}
