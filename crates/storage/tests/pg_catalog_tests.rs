//! PostgreSQL catalog tests.
//!
//! Skipped unless `TEST_DATABASE_URL` points at a scratch database.

use storage::{LayerCatalog, PgLayerCatalog};
use tile_common::default_layers;

async fn connect() -> Option<PgLayerCatalog> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("SKIPPED: TEST_DATABASE_URL not set");
            return None;
        }
    };
    let catalog = PgLayerCatalog::connect(&url).await.unwrap();
    catalog.migrate().await.unwrap();
    Some(catalog)
}

#[tokio::test]
async fn test_seed_lookup_and_list() {
    let Some(catalog) = connect().await else {
        return;
    };

    // Seeding twice must not duplicate rows.
    catalog.ensure_seeded(&default_layers()).await.unwrap();
    assert_eq!(catalog.ensure_seeded(&default_layers()).await.unwrap(), 0);

    let modis = catalog
        .lookup("gibs:MODIS_Terra_CorrectedReflectance_TrueColor")
        .await
        .unwrap()
        .expect("seeded layer");
    assert_eq!(modis.kind(), "gibs");
    assert_eq!(modis.max_zoom(), Some(9));

    assert!(catalog.lookup("gibs:missing").await.unwrap().is_none());

    let layers = catalog.list().await.unwrap();
    assert!(layers.len() >= default_layers().len());
    let bodies: Vec<&str> = layers.iter().map(|l| l.body()).collect();
    let mut sorted = bodies.clone();
    sorted.sort();
    assert_eq!(bodies, sorted);
}
