use crate::catalog::CatalogSnapshot;
use crate::error::ServiceError;
use crate::orders::{parse_order_id, OrderLookup};
use crate::products::{NewEntry, ProductList};
use actix_web::{web, HttpResponse};
use common::model::product::Size;
use common::requests::{AddProductRequest, ScanOrderRequest};
use log::{info, warn};
use std::sync::Arc;

pub(crate) async fn list(products: web::Data<ProductList>) -> HttpResponse {
    HttpResponse::Ok().json(products.snapshot().await)
}

pub(crate) async fn add(
    payload: web::Json<AddProductRequest>,
    products: web::Data<ProductList>,
    catalog: web::Data<CatalogSnapshot>,
    orders: web::Data<dyn OrderLookup>,
) -> Result<HttpResponse, ServiceError> {
    let req = payload.into_inner();
    let item = products
        .add(NewEntry::manual(req.style_number, req.size, req.quantity), &catalog)
        .await?;
    info!("Added style {} ({}) at rack {}", item.style_number, item.size, item.rack_space);
    notify_press_table(orders.into_inner(), item.style_number, item.size);
    Ok(HttpResponse::Created().json(item))
}

pub(crate) async fn scan(
    payload: web::Json<ScanOrderRequest>,
    products: web::Data<ProductList>,
    catalog: web::Data<CatalogSnapshot>,
    orders: web::Data<dyn OrderLookup>,
) -> Result<HttpResponse, ServiceError> {
    let req = payload.into_inner();
    let order_id = parse_order_id(&req.order_id)?;
    let order = orders.fetch_order(order_id).await?;

    let entry = NewEntry {
        style_number: order.style_number,
        size: order.size,
        quantity: req.quantity,
        order_id: Some(order.order_id),
        parent_style_number: order.parent_style_number,
    };
    let item = products.add(entry, &catalog).await?;
    info!(
        "Added order {:05}: style {} ({}) at rack {}",
        order_id, item.style_number, item.size, item.rack_space
    );
    notify_press_table(orders.into_inner(), item.style_number, item.size);
    Ok(HttpResponse::Created().json(item))
}

pub(crate) async fn edit(
    index: web::Path<usize>,
    payload: web::Json<AddProductRequest>,
    products: web::Data<ProductList>,
    catalog: web::Data<CatalogSnapshot>,
) -> Result<HttpResponse, ServiceError> {
    let req = payload.into_inner();
    let item = products
        .replace(
            index.into_inner(),
            NewEntry::manual(req.style_number, req.size, req.quantity),
            &catalog,
        )
        .await?;
    Ok(HttpResponse::Ok().json(item))
}

pub(crate) async fn remove(
    index: web::Path<usize>,
    products: web::Data<ProductList>,
) -> Result<HttpResponse, ServiceError> {
    let removed = products.remove(index.into_inner()).await?;
    Ok(HttpResponse::Ok().json(removed))
}

pub(crate) async fn clear(products: web::Data<ProductList>) -> Result<HttpResponse, ServiceError> {
    let removed = products.clear().await?;
    info!("Cleared {} products", removed);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "removed": removed })))
}

/// Ships the first press-table record for this style and size, in the background.
fn notify_press_table(orders: Arc<dyn OrderLookup>, style_number: u32, size: Size) {
    tokio::spawn(async move {
        match orders.ship_matching(style_number, size).await {
            Ok(Some(order_id)) => info!("Moved order {} to shipping", order_id),
            Ok(None) => info!("No press-table record for style {} ({})", style_number, size),
            Err(e) => warn!("Failed to move style {} ({}) to shipping: {}", style_number, size, e),
        }
    });
}

#[cfg(test)]
mod tests {
    use crate::catalog::CatalogSnapshot;
    use crate::orders::{OrderError, OrderLookup, OrderRecord};
    use crate::products::store::MemoryProductStore;
    use crate::products::ProductList;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use async_trait::async_trait;
    use common::model::catalog::CatalogRecord;
    use common::model::product::{LineItem, Size};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeOrders {
        shipped: Mutex<Vec<(u32, Size)>>,
    }

    #[async_trait]
    impl OrderLookup for FakeOrders {
        async fn fetch_order(&self, order_id: u32) -> Result<OrderRecord, OrderError> {
            if order_id != 4242 {
                return Err(OrderError::NotFound(order_id));
            }
            Ok(OrderRecord {
                order_id,
                style_number: 10004,
                size: Size::L,
                parent_style_number: Some(10000),
            })
        }

        async fn ship_matching(&self, style_number: u32, size: Size) -> Result<Option<u32>, OrderError> {
            if let Ok(mut shipped) = self.shipped.lock() {
                shipped.push((style_number, size));
            }
            Ok(None)
        }
    }

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::new(vec![CatalogRecord {
            style_code: 10004,
            rack_space: "'A-12'".into(),
            style_id: "S10004".into(),
            primary_color: "Red".into(),
        }])
    }

    macro_rules! app {
        ($store:expr) => {{
            let orders: Arc<dyn OrderLookup> = Arc::new(FakeOrders::default());
            let products = ProductList::load(Box::new(Arc::clone(&$store))).unwrap();
            test::init_service(
                App::new()
                    .app_data(web::Data::new(catalog()))
                    .app_data(web::Data::new(products))
                    .app_data(web::Data::from(orders))
                    .service(crate::services::products::configure_routes()),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn add_edit_delete_round_trip() {
        let store = Arc::new(MemoryProductStore::default());
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/products")
            .set_json(serde_json::json!({ "style_number": 10004, "size": "M", "quantity": 2 }))
            .to_request();
        let item: LineItem = test::call_and_read_body_json(&app, req).await;
        assert_eq!(item.rack_space, "A-12");

        let req = test::TestRequest::post()
            .uri("/api/products")
            .set_json(serde_json::json!({ "style_number": 99999, "size": "S" }))
            .to_request();
        let item: LineItem = test::call_and_read_body_json(&app, req).await;
        assert_eq!(item.rack_space, "Not found");

        let req = test::TestRequest::put()
            .uri("/api/products/1")
            .set_json(serde_json::json!({ "style_number": 10004, "size": "XL", "quantity": 5 }))
            .to_request();
        let item: LineItem = test::call_and_read_body_json(&app, req).await;
        assert_eq!(item.size, Size::Xl);

        let req = test::TestRequest::delete().uri("/api/products/0").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/products").to_request();
        let items: Vec<LineItem> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(store.save_count(), 4);

        let req = test::TestRequest::delete().uri("/api/products/7").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn scan_validates_order_id_and_adds_entry() {
        let store = Arc::new(MemoryProductStore::default());
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/products/scan")
            .set_json(serde_json::json!({ "order_id": "123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/products/scan")
            .set_json(serde_json::json!({ "order_id": "04242" }))
            .to_request();
        let item: LineItem = test::call_and_read_body_json(&app, req).await;
        assert_eq!(item.order_id, Some(4242));
        assert_eq!(item.parent_style_number, Some(10000));
        assert_eq!(item.rack_space, "A-12");
        assert_eq!(item.quantity, 1);

        let req = test::TestRequest::post()
            .uri("/api/products/scan")
            .set_json(serde_json::json!({ "order_id": "11111" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
