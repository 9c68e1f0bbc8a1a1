mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

use bistro_api::{
    auth::policy::{self, OrderScope, DELIVERY_CREW, MANAGER},
    entities::{OrderItem, OrderStatus},
    errors::ServiceError,
    services::{cart::AddToCartInput, orders::UpdateOrderInput},
};

async fn fill_cart(app: &TestApp, user_id: Uuid) {
    let cat = app.seed_category(&format!("cat-{user_id}")).await;
    let pizza = app.seed_menu_item(cat.id, "Pizza", dec!(10.00)).await;
    let salad = app.seed_menu_item(cat.id, "Salad", dec!(5.25)).await;

    for (item, quantity) in [(pizza.id, 2), (salad.id, 1)] {
        app.state
            .services
            .cart
            .add_item(
                user_id,
                AddToCartInput {
                    menu_item_id: item,
                    quantity,
                },
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn checkout_snapshots_cart_and_empties_it() {
    let app = TestApp::new().await;
    let user = app.create_user("ursula", &[], false).await;
    fill_cart(&app, user.id).await;

    let placed = app
        .state
        .services
        .orders
        .place_order(user.id)
        .await
        .expect("checkout should succeed");

    assert_eq!(placed.order.status, OrderStatus::Placed);
    assert_eq!(placed.order.user_id, user.id);
    assert_eq!(placed.order.delivery_crew_id, None);
    assert_eq!(placed.order.total, dec!(25.25));
    assert_eq!(placed.items.len(), 2);

    let pizza_line = placed
        .items
        .iter()
        .find(|item| item.quantity == 2)
        .expect("pizza line missing");
    assert_eq!(pizza_line.unit_price, dec!(10.00));
    assert_eq!(pizza_line.price, dec!(20.00));

    // The cart is gone once the order exists.
    assert!(app.state.services.cart.list(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn checkout_on_empty_cart_fails_and_creates_nothing() {
    let app = TestApp::new().await;
    let user = app.create_user("victor", &[], false).await;

    let result = app.state.services.orders.place_order(user.id).await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    let orders = app
        .state
        .services
        .orders
        .list_orders(OrderScope::OwnedBy(user.id))
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn listing_is_scoped_by_role() {
    let app = TestApp::new().await;
    let customer_a = app.create_user("cust-a", &[], false).await;
    let customer_b = app.create_user("cust-b", &[], false).await;
    let crew = app.create_user("crew-1", &[DELIVERY_CREW], false).await;

    fill_cart(&app, customer_a.id).await;
    fill_cart(&app, customer_b.id).await;
    let order_a = app.state.services.orders.place_order(customer_a.id).await.unwrap();
    app.state.services.orders.place_order(customer_b.id).await.unwrap();

    // Assign order A to the crew member.
    app.state
        .services
        .orders
        .update_order(
            order_a.order.id,
            UpdateOrderInput {
                delivery_crew_id: Some(crew.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let all = app
        .state
        .services
        .orders
        .list_orders(OrderScope::All)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let assigned = app
        .state
        .services
        .orders
        .list_orders(OrderScope::AssignedTo(crew.id))
        .await
        .unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].order.id, order_a.order.id);

    let own = app
        .state
        .services
        .orders
        .list_orders(OrderScope::OwnedBy(customer_b.id))
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_ne!(own[0].order.id, order_a.order.id);
}

#[tokio::test]
async fn crew_may_update_status_but_not_total() {
    let app = TestApp::new().await;
    let customer = app.create_user("cust-c", &[], false).await;
    let crew = app.create_user("crew-2", &[DELIVERY_CREW], false).await;

    fill_cart(&app, customer.id).await;
    let order = app.state.services.orders.place_order(customer.id).await.unwrap();
    let order = app
        .state
        .services
        .orders
        .update_order(
            order.order.id,
            UpdateOrderInput {
                delivery_crew_id: Some(crew.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let crew_caller = bistro_api::auth::AuthUser {
        user_id: crew.id,
        username: crew.username.clone(),
        roles: vec![DELIVERY_CREW.to_string()],
        is_superuser: false,
    };

    let status_change = UpdateOrderInput {
        status: Some(OrderStatus::InProgress),
        ..Default::default()
    };
    policy::authorize_order_update(&crew_caller, &order.order, status_change.only_status())
        .expect("crew may change status on their order");

    let updated = app
        .state
        .services
        .orders
        .update_order(order.order.id, status_change)
        .await
        .unwrap();
    assert_eq!(updated.order.status, OrderStatus::InProgress);

    // Touching the total as crew is rejected by policy before the
    // service is ever reached.
    let total_change = UpdateOrderInput {
        status: Some(OrderStatus::Delivered),
        total: Some(dec!(1.00)),
        ..Default::default()
    };
    let verdict =
        policy::authorize_order_update(&crew_caller, &updated.order, total_change.only_status());
    assert!(matches!(verdict, Err(ServiceError::Forbidden(_))));
}

#[tokio::test]
async fn partial_update_keeps_untouched_fields() {
    let app = TestApp::new().await;
    let customer = app.create_user("cust-d", &[], false).await;
    fill_cart(&app, customer.id).await;
    let placed = app.state.services.orders.place_order(customer.id).await.unwrap();

    let updated = app
        .state
        .services
        .orders
        .update_order(
            placed.order.id,
            UpdateOrderInput {
                status: Some(OrderStatus::Delivered),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.order.status, OrderStatus::Delivered);
    assert_eq!(updated.order.total, placed.order.total);
    assert_eq!(updated.order.delivery_crew_id, None);
}

#[tokio::test]
async fn assigning_unknown_user_is_rejected() {
    let app = TestApp::new().await;
    let customer = app.create_user("cust-e", &[], false).await;
    fill_cart(&app, customer.id).await;
    let placed = app.state.services.orders.place_order(customer.id).await.unwrap();

    let result = app
        .state
        .services
        .orders
        .update_order(
            placed.order.id,
            UpdateOrderInput {
                delivery_crew_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn deleting_an_order_removes_its_items() {
    let app = TestApp::new().await;
    let customer = app.create_user("cust-f", &[], false).await;
    fill_cart(&app, customer.id).await;
    let placed = app.state.services.orders.place_order(customer.id).await.unwrap();

    app.state
        .services
        .orders
        .delete_order(placed.order.id)
        .await
        .expect("delete should succeed");

    let leftover = OrderItem::find().all(&*app.state.db).await.unwrap();
    assert!(leftover.is_empty(), "order items must be cascaded away");

    let result = app.state.services.orders.get_order(placed.order.id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn manager_scope_is_all_orders() {
    let app = TestApp::new().await;
    let manager = app.create_user("mgr-1", &[MANAGER], false).await;

    let caller = bistro_api::auth::AuthUser {
        user_id: manager.id,
        username: manager.username.clone(),
        roles: vec![MANAGER.to_string()],
        is_superuser: false,
    };

    assert_eq!(policy::order_list_scope(&caller), OrderScope::All);
}
