//! Order commands: `orders`, `order`, `checkout`.

use emporium_core::{Order, OrderId, PaymentRequest};

use super::{CartLine, CliError, Context};

/// Parsed `checkout` arguments.
pub struct Checkout {
    pub lines: Vec<CartLine>,
    pub shipping_address: String,
    pub payment_method: String,
    pub pay: bool,
}

/// List the signed-in user's orders.
pub async fn list(ctx: &Context) -> Result<(), CliError> {
    let user = ctx.signed_in_user().await?;

    let mut orders = ctx.order_store();
    let history = orders
        .fetch_user_orders(user.id)
        .await
        .map_err(|e| CliError::action(orders.status(), e))?;

    #[allow(clippy::print_stdout)]
    {
        if history.is_empty() {
            println!("No orders yet.");
        }
        for order in &history {
            println!(
                "{:>6}  {:<10} {:>10}  {} item(s)",
                order.id.to_string(),
                order.status.to_string(),
                order.total().to_string(),
                order.items.len()
            );
        }
    }
    Ok(())
}

/// Show one order with its lines.
pub async fn show(ctx: &Context, id: OrderId) -> Result<(), CliError> {
    ctx.signed_in_user().await?;

    let mut orders = ctx.order_store();
    let order = orders
        .fetch_order(id)
        .await
        .map_err(|e| CliError::action(orders.status(), e))?;

    #[allow(clippy::print_stdout)]
    {
        for line in order_lines(&order) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Fill a cart from the `--item` arguments, place the order, and
/// optionally pay for it.
pub async fn checkout(ctx: &Context, checkout: Checkout) -> Result<(), CliError> {
    let user = ctx.signed_in_user().await?;

    let mut products = ctx.product_store();
    let mut orders = ctx.order_store();
    for line in &checkout.lines {
        let product = products
            .fetch_product(line.product_id)
            .await
            .map_err(|e| CliError::action(products.status(), e))?;
        let already = orders
            .cart()
            .get(product.id)
            .map_or(0, |item| item.quantity);
        orders.add_to_cart(&product);
        orders.update_cart_item_quantity(
            product.id,
            i64::from(already) + i64::from(line.quantity),
        );
    }
    tracing::info!(
        lines = orders.cart().len(),
        items = orders.cart_item_count(),
        total = %orders.cart_total(),
        "Cart ready"
    );

    let order = orders
        .checkout(
            user.id,
            &checkout.shipping_address,
            Some(checkout.payment_method.as_str()),
        )
        .await
        .map_err(|e| CliError::action(orders.status(), e))?;

    #[allow(clippy::print_stdout)]
    {
        println!("Order #{} placed.", order.id);
        for line in order_lines(&order) {
            println!("{line}");
        }
    }

    if checkout.pay {
        let request = PaymentRequest::new(
            order.id,
            user.id,
            order.total(),
            checkout.payment_method.as_str(),
        );
        let payment = orders
            .process_payment(&request)
            .await
            .map_err(|e| CliError::action(orders.status(), e))?;

        #[allow(clippy::print_stdout)]
        {
            println!("Payment #{}: {:?}", payment.id, payment.status);
            if let Some(reason) = &payment.failure_reason {
                println!("  Reason: {reason}");
            }
        }
    }
    Ok(())
}

fn order_lines(order: &Order) -> Vec<String> {
    let mut lines = vec![format!("Order #{} [{}]", order.id, order.status)];
    for item in &order.items {
        lines.push(format!(
            "  {} x {} @ {} = {}",
            item.quantity,
            item.product_name,
            item.price,
            item.line_total()
        ));
    }
    lines.push(format!("  Total: {}", order.total()));
    if let Some(address) = &order.shipping_address {
        lines.push(format!("  Ship to: {address}"));
    }
    lines
}
