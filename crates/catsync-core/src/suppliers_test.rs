use super::*;

const DEERHUNTER_YAML: &str = r#"
suppliers:
  - name: deerhunter
    vendor: Deerhunter
    resumable: true
    validate_images: true
    feed:
      format: csv
      location: ./feeds/deerhunter.csv
    fields:
      title: Product_Name
      description: [Description]
      sku: [Product_Number, Colour_Number, Size]
      grouping: { kind: field, field: Product_Number }
      color: Colour_Name
      size: Size
      retail_price: Retail_Price
      outlet: { field: Outlet, values: ["yes"] }
      stock: Stock
      barcode: EAN
      images: [Image_URL, Image1, Image2]
    stock_levels:
      nostock: 0
      lowstock: 10
      instock: 50
    category_rules:
      - { field: Product_Name, keyword: jacka, tag: Jackor, mode: contains }
    ignored_fields: [Composition]
"#;

#[test]
fn parses_full_supplier_schema() {
    let file = parse_suppliers(DEERHUNTER_YAML).expect("valid yaml");
    let supplier = file.find("Deerhunter").expect("case-insensitive lookup");
    assert_eq!(supplier.feed.format, FeedFormat::Csv);
    assert_eq!(supplier.feed.delimiter, ';');
    assert_eq!(supplier.feed.record_element, "product");
    assert_eq!(
        supplier.fields.grouping,
        GroupingKey::Field {
            field: "Product_Number".to_string()
        }
    );
    assert_eq!(supplier.stock_levels.get("instock"), Some(&50));
    assert_eq!(supplier.category_rules[0].mode, MatchMode::Contains);
    assert_eq!(supplier.unrecognized_fields, UnrecognizedFields::Warn);
    assert!(supplier.resumable);
    assert!(supplier.validate_images);
}

#[test]
fn known_fields_include_every_mapped_column() {
    let file = parse_suppliers(DEERHUNTER_YAML).unwrap();
    let known = file.suppliers[0].known_fields();
    for field in [
        "Product_Name",
        "Description",
        "Product_Number",
        "Colour_Number",
        "Size",
        "Colour_Name",
        "Retail_Price",
        "Outlet",
        "Stock",
        "EAN",
        "Image_URL",
        "Image2",
        "Composition",
    ] {
        assert!(known.contains(field), "missing {field}");
    }
    assert!(!known.contains("Series"));
}

#[test]
fn title_handle_grouping_parses() {
    let yaml = DEERHUNTER_YAML.replace(
        "{ kind: field, field: Product_Number }",
        "{ kind: title_handle }",
    );
    let file = parse_suppliers(&yaml).unwrap();
    assert_eq!(file.suppliers[0].fields.grouping, GroupingKey::TitleHandle);
}

#[test]
fn duplicate_supplier_names_rejected() {
    let yaml = format!(
        "{}{}",
        DEERHUNTER_YAML,
        DEERHUNTER_YAML
            .trim_start()
            .trim_start_matches("suppliers:\n")
            .replace("name: deerhunter", "name: DEERHUNTER")
    );
    let err = parse_suppliers(&yaml).unwrap_err();
    assert!(
        matches!(err, ConfigError::Validation(ref msg) if msg.contains("duplicate")),
        "got: {err:?}"
    );
}

#[test]
fn supplier_name_with_path_characters_rejected() {
    let yaml = DEERHUNTER_YAML.replace("name: deerhunter", "name: ../deerhunter");
    let err = parse_suppliers(&yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn missing_image_fields_rejected() {
    let yaml = DEERHUNTER_YAML.replace("images: [Image_URL, Image1, Image2]", "images: []");
    let err = parse_suppliers(&yaml).unwrap_err();
    assert!(
        matches!(err, ConfigError::Validation(ref msg) if msg.contains("image")),
        "got: {err:?}"
    );
}

#[test]
fn empty_outlet_values_rejected() {
    let yaml = DEERHUNTER_YAML.replace(r#"values: ["yes"]"#, "values: []");
    assert!(matches!(
        parse_suppliers(&yaml),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn malformed_yaml_is_parse_error() {
    let err = parse_suppliers("suppliers: [ {name: x").unwrap_err();
    assert!(matches!(err, ConfigError::SuppliersFileParse(_)));
}

#[test]
fn load_suppliers_reports_missing_file() {
    let err = load_suppliers(Path::new("/nonexistent/catsync/suppliers.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::SuppliersFileIo { .. }));
}
