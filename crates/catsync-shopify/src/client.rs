//! HTTP client for the Shopify Admin REST API.

use std::time::Duration;

use catsync_engine::{
    CommercePlatform, PlatformError, ProductDraft, RemoteProduct, RemoteVariant,
    SmartCollection, VariantDraft, VariantUpdate,
};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ShopifyError;
use crate::types::{
    CollectionRule, ImageBody, ImageEnvelope, InventoryLevelBody, LocationsResponse,
    NewProductBody, NewSmartCollectionBody, ProductEnvelope, ProductUpdateBody, ProductsResponse,
    PublishBody, SingleImageResponse, SingleProductResponse, SingleSmartCollectionResponse,
    SingleVariantResponse, SmartCollectionEnvelope, SmartCollectionsResponse, VariantBody,
    VariantEnvelope, VariantImageBody, VariantUpdateBody,
};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Longest error body kept in error messages.
const MAX_ERROR_BODY: usize = 500;

/// Client for one store's Admin API, e.g.
/// `https://shop.myshopify.com/admin/api/2023-04`.
///
/// The client does not retry; callers wrap calls in a retry policy and rely
/// on the [`PlatformError`] classification of every failure.
pub struct ShopifyAdminClient {
    client: Client,
    base_url: String,
}

impl ShopifyAdminClient {
    /// # Errors
    ///
    /// Returns [`ShopifyError::InvalidToken`] when the token is not a valid
    /// header value, or [`ShopifyError::Http`] if the client cannot be built.
    pub fn new(base_url: &str, access_token: &str, timeout_secs: u64) -> Result<Self, ShopifyError> {
        let mut token =
            HeaderValue::from_str(access_token).map_err(|_| ShopifyError::InvalidToken)?;
        token.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_TOKEN_HEADER, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Sends `request`, classifies the status and decodes the JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, ShopifyError> {
        let body = Self::send_raw(request).await?;
        serde_json::from_str(&body).map_err(|source| ShopifyError::Deserialize {
            context: context.to_string(),
            source,
        })
    }

    async fn send_raw(request: RequestBuilder) -> Result<String, ShopifyError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(ShopifyError::RateLimited { retry_after_secs });
        }

        let body = response.text().await?;
        if !status.is_success() {
            let mut body = body;
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(ShopifyError::UnexpectedStatus {
                status: status.as_u16(),
                url,
                body,
            });
        }
        Ok(body)
    }

    async fn write<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        context: &str,
    ) -> Result<T, ShopifyError> {
        self.send(self.request(method, path).json(body), context).await
    }

    async fn write_ignoring_body<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), ShopifyError> {
        Self::send_raw(self.request(method, path).json(body)).await?;
        Ok(())
    }
}

/// Shopify sends whole or fractional seconds (`"2.0"`).
fn parse_retry_after(raw: &str) -> Option<u64> {
    let secs: f64 = raw.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = secs.ceil() as u64;
    Some(whole)
}

impl CommercePlatform for ShopifyAdminClient {
    async fn find_product(&self, handle: &str) -> Result<Option<RemoteProduct>, PlatformError> {
        let request = self
            .request(Method::GET, "products.json")
            .query(&[("handle", handle), ("fields", "id,handle,variants")]);
        let response: ProductsResponse = self.send(request, "product lookup").await?;
        Ok(response
            .products
            .into_iter()
            .find(|p| p.handle == handle)
            .map(RemoteProduct::from))
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<RemoteProduct, PlatformError> {
        let body = ProductEnvelope {
            product: NewProductBody::from(draft),
        };
        let response: SingleProductResponse = self
            .write(Method::POST, "products.json", &body, "product create")
            .await?;
        tracing::debug!(handle = %draft.handle, product_id = response.product.id, "product created");
        Ok(response.product.into())
    }

    async fn update_product(
        &self,
        product_id: u64,
        draft: &ProductDraft,
    ) -> Result<RemoteProduct, PlatformError> {
        let body = ProductEnvelope {
            product: ProductUpdateBody::new(product_id, draft),
        };
        let response: SingleProductResponse = self
            .write(
                Method::PUT,
                &format!("products/{product_id}.json"),
                &body,
                "product update",
            )
            .await?;
        Ok(response.product.into())
    }

    async fn create_variant(
        &self,
        product_id: u64,
        draft: &VariantDraft,
    ) -> Result<RemoteVariant, PlatformError> {
        let body = VariantEnvelope {
            variant: VariantBody::from(draft),
        };
        let response: SingleVariantResponse = self
            .write(
                Method::POST,
                &format!("products/{product_id}/variants.json"),
                &body,
                "variant create",
            )
            .await?;
        Ok(response.variant.into())
    }

    async fn update_variant(
        &self,
        variant_id: u64,
        update: &VariantUpdate,
    ) -> Result<(), PlatformError> {
        let body = VariantEnvelope {
            variant: VariantUpdateBody::new(variant_id, update),
        };
        self.write_ignoring_body(Method::PUT, &format!("variants/{variant_id}.json"), &body)
            .await?;
        Ok(())
    }

    async fn upload_image(&self, product_id: u64, src: &str) -> Result<u64, PlatformError> {
        let body = ImageEnvelope {
            image: ImageBody { src },
        };
        let response: SingleImageResponse = self
            .write(
                Method::POST,
                &format!("products/{product_id}/images.json"),
                &body,
                "image upload",
            )
            .await?;
        Ok(response.image.id)
    }

    async fn assign_variant_image(
        &self,
        variant_id: u64,
        image_id: u64,
    ) -> Result<(), PlatformError> {
        let body = VariantEnvelope {
            variant: VariantImageBody {
                id: variant_id,
                image_id,
            },
        };
        self.write_ignoring_body(Method::PUT, &format!("variants/{variant_id}.json"), &body)
            .await?;
        Ok(())
    }

    async fn resolve_location(&self, preferred: Option<u64>) -> Result<u64, PlatformError> {
        if let Some(id) = preferred {
            return Ok(id);
        }
        let response: LocationsResponse = self
            .send(self.request(Method::GET, "locations.json"), "location list")
            .await?;
        response
            .locations
            .into_iter()
            .find(|l| l.active)
            .map(|l| l.id)
            .ok_or_else(|| ShopifyError::Missing("store has no active location".to_string()).into())
    }

    async fn set_inventory_level(
        &self,
        location_id: u64,
        inventory_item_id: u64,
        available: i64,
    ) -> Result<(), PlatformError> {
        let body = InventoryLevelBody {
            location_id,
            inventory_item_id,
            available,
        };
        self.write_ignoring_body(Method::POST, "inventory_levels/set.json", &body)
            .await?;
        Ok(())
    }

    async fn publish(&self, product_id: u64) -> Result<(), PlatformError> {
        let body = ProductEnvelope {
            product: PublishBody {
                id: product_id,
                published: true,
                published_scope: "global",
            },
        };
        self.write_ignoring_body(Method::PUT, &format!("products/{product_id}.json"), &body)
            .await?;
        Ok(())
    }

    async fn list_smart_collections(&self) -> Result<Vec<SmartCollection>, PlatformError> {
        let request = self
            .request(Method::GET, "smart_collections.json")
            .query(&[("limit", "250"), ("fields", "id,title")]);
        let response: SmartCollectionsResponse =
            self.send(request, "smart collection list").await?;
        Ok(response
            .smart_collections
            .into_iter()
            .map(SmartCollection::from)
            .collect())
    }

    async fn create_smart_collection(&self, tag: &str) -> Result<SmartCollection, PlatformError> {
        let body = SmartCollectionEnvelope {
            smart_collection: NewSmartCollectionBody {
                title: tag,
                rules: vec![CollectionRule {
                    column: "tag",
                    relation: "equals",
                    condition: tag,
                }],
                published: true,
            },
        };
        let response: SingleSmartCollectionResponse = self
            .write(
                Method::POST,
                "smart_collections.json",
                &body,
                "smart collection create",
            )
            .await?;
        Ok(response.smart_collection.into())
    }
}
