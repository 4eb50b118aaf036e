use catsync_core::RawItem;
use rust_decimal::Decimal;

use super::*;

fn item(key: &str, sku: &str, color: &str, size: &str, images: &[&str]) -> RawItem {
    RawItem {
        sku: sku.to_string(),
        grouping_key: key.to_string(),
        title: format!("Product {key}"),
        description: String::new(),
        vendor: "Deerhunter".to_string(),
        color: color.to_string(),
        size: size.to_string(),
        wholesale_price: Some(Decimal::new(100, 0)),
        retail_price: Decimal::new(400, 0),
        is_outlet: false,
        images: images.iter().map(ToString::to_string).collect(),
        stock: 5,
        barcode: None,
        tags: Vec::new(),
    }
}

#[test]
fn groups_in_first_seen_order() {
    let items = vec![
        item("B", "b1", "Green", "M", &[]),
        item("A", "a1", "Green", "M", &[]),
        item("B", "b2", "Green", "L", &[]),
        item("C", "c1", "", "", &[]),
        item("A", "a2", "Brown", "M", &[]),
    ];
    let grouping = group(&items);
    let keys: Vec<&str> = grouping
        .products
        .iter()
        .map(|p| p.grouping_key.as_str())
        .collect();
    assert_eq!(keys, vec!["B", "A", "C"]);
    let skus: Vec<&str> = grouping.products[0]
        .variants
        .iter()
        .map(|v| v.sku.as_str())
        .collect();
    assert_eq!(skus, vec!["b1", "b2"]);
    assert!(grouping.rejected.is_empty());
}

#[test]
fn every_item_lands_in_its_own_product() {
    let items = vec![
        item("A", "a1", "Green", "M", &[]),
        item("B", "b1", "Green", "M", &[]),
        item("A", "a2", "Green", "L", &[]),
    ];
    let grouping = group(&items);
    let total: usize = grouping.products.iter().map(|p| p.variants.len()).sum();
    assert_eq!(total, items.len());
    for product in &grouping.products {
        for variant in &product.variants {
            let source = items.iter().find(|i| i.sku == variant.sku).unwrap();
            assert_eq!(source.grouping_key, product.grouping_key);
        }
    }
}

#[test]
fn duplicate_option_tuple_rejects_whole_product() {
    let items = vec![
        item("A", "a1", "Green", "M", &[]),
        item("B", "b1", "Green", "M", &[]),
        item("A", "a2", "green", "m", &[]),
        item("A", "a3", "Green", "L", &[]),
    ];
    let grouping = group(&items);
    assert_eq!(grouping.products.len(), 1);
    assert_eq!(grouping.products[0].grouping_key, "B");
    assert_eq!(grouping.rejected.len(), 1);
    let dup = &grouping.rejected[0];
    assert_eq!(dup.grouping_key, "A");
    assert_eq!(dup.first_sku, "a1");
    assert_eq!(dup.duplicate_sku, "a2");
}

#[test]
fn images_are_deduplicated_by_canonical_key() {
    let items = vec![
        item(
            "A",
            "a1",
            "Green",
            "M",
            &["D_M_F_3733-642.jpg", "D_M_F_3733-642_1.jpg"],
        ),
        item(
            "A",
            "a2",
            "Green",
            "L",
            &["D_M_F_3733-642_4f68b42b-9d99-41c0.jpg", "D_M_F_3733-643.jpg"],
        ),
    ];
    let grouping = group(&items);
    let product = &grouping.products[0];
    let sources: Vec<&str> = product.images.iter().map(|i| i.source.as_str()).collect();
    assert_eq!(sources, vec!["D_M_F_3733-642.jpg", "D_M_F_3733-643.jpg"]);

    let mut keys: Vec<_> = product.images.iter().map(|i| i.key.clone()).collect();
    keys.dedup();
    assert_eq!(keys.len(), product.images.len());
}

#[test]
fn first_image_per_color_is_recorded() {
    let items = vec![
        item("A", "a1", "Green", "M", &["green_front.jpg", "green_back.jpg"]),
        item("A", "a2", "GREEN", "L", &["green_side.jpg"]),
        item("A", "a3", "Brown", "M", &["brown_front.jpg"]),
        item("A", "a4", "", "XL", &["nocolor.jpg"]),
    ];
    let product = &group(&items).products[0];
    assert_eq!(product.color_images.len(), 2);
    assert_eq!(product.color_images["green"].as_str(), "green_front");
    assert_eq!(product.color_images["brown"].as_str(), "brown_front");
}

#[test]
fn tags_are_unioned_across_variants() {
    let mut a1 = item("A", "a1", "Green", "M", &[]);
    a1.tags = vec!["Jackor".to_string(), "Herr".to_string()];
    let mut a2 = item("A", "a2", "Green", "L", &[]);
    a2.tags = vec!["Herr".to_string(), "Outlet".to_string()];
    let product = &group(&[a1, a2]).products[0];
    let tags: Vec<&str> = product.tags.iter().map(String::as_str).collect();
    assert_eq!(tags, vec!["Herr", "Jackor", "Outlet"]);
}

#[test]
fn handle_is_derived_from_title() {
    let mut a = item("A", "a1", "", "", &[]);
    a.title = "Lady Pro 2.0 Jacka".to_string();
    assert_eq!(group(&[a]).products[0].handle, "lady-pro-2-0-jacka");
}

#[test]
fn empty_input_yields_nothing() {
    let grouping = group(&[]);
    assert!(grouping.products.is_empty());
    assert!(grouping.rejected.is_empty());
}
