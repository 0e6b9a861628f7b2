//! Catalog endpoints: products, search, categories, tags and admin CRUD.

use serde::Deserialize;
use tracing::info;

use super::{segment, ApiClient};
use crate::error::{ClientError, Result};
use crate::types::{ListBody, Product, ProductInput, ProductQuery};
use crate::ui::forms::validate_product;

/// `/categories` and `/tags` answer with plain strings or `{name}` objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NameEntry {
    Plain(String),
    Named {
        #[serde(alias = "nombre")]
        name: String,
    },
}

impl NameEntry {
    fn into_name(self) -> String {
        match self {
            NameEntry::Plain(name) | NameEntry::Named { name } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NameList {
    Categories { categories: Vec<NameEntry> },
    Tags { tags: Vec<NameEntry> },
    Other(ListBody<NameEntry>),
}

impl NameList {
    fn into_names(self) -> Vec<String> {
        let entries = match self {
            NameList::Categories { categories } => categories,
            NameList::Tags { tags } => tags,
            NameList::Other(body) => body.into_vec(),
        };
        entries.into_iter().map(NameEntry::into_name).collect()
    }
}

/// `{product: {...}}` or the bare product
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductBody {
    Wrapped { product: Product },
    Bare(Product),
}

impl From<ProductBody> for Product {
    fn from(body: ProductBody) -> Self {
        match body {
            ProductBody::Wrapped { product } | ProductBody::Bare(product) => product,
        }
    }
}

impl ApiClient {
    /// `GET /api/products/`
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let qs = query.to_query_string();
        let path = if qs.is_empty() {
            "/api/products/".to_string()
        } else {
            format!("/api/products/?{}", qs)
        };
        self.get_public_list(&path).await
    }

    /// `GET /api/products/search?q=`
    pub async fn search_products(&self, term: &str) -> Result<Vec<Product>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ClientError::invalid("q", "Escribe algo para buscar"));
        }
        self.get_public_list(&format!("/api/products/search?q={}", urlencoding::encode(term)))
            .await
    }

    /// `GET /api/products/:id`
    pub async fn product(&self, id: &str) -> Result<Product> {
        let body: ProductBody = self
            .get_public(&format!("/api/products/{}", segment(id)))
            .await?;
        Ok(body.into())
    }

    /// `GET /api/products/categories`
    pub async fn categories(&self) -> Result<Vec<String>> {
        let list: NameList = self.get_public("/api/products/categories").await?;
        Ok(list.into_names())
    }

    /// `GET /api/products/tags`
    pub async fn tags(&self) -> Result<Vec<String>> {
        let list: NameList = self.get_public("/api/products/tags").await?;
        Ok(list.into_names())
    }

    /// Admin: `POST /api/products/`
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product> {
        validate_product(input)?;
        self.require_admin().await?;
        let body: ProductBody = self.post("/api/products/", input).await?;
        let product: Product = body.into();
        info!("Created product {} ({})", product.name, product.id);
        Ok(product)
    }

    /// Admin: `PUT /api/products/:id`
    pub async fn update_product(&self, id: &str, input: &ProductInput) -> Result<Product> {
        validate_product(input)?;
        self.require_admin().await?;
        let body: ProductBody = self
            .put(&format!("/api/products/{}", segment(id)), input)
            .await?;
        info!("Updated product {}", id);
        Ok(body.into())
    }

    /// Admin: `DELETE /api/products/:id`
    pub async fn delete_product(&self, id: &str) -> Result<()> {
        self.require_admin().await?;
        self.delete(&format!("/api/products/{}", segment(id))).await?;
        info!("Deleted product {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_list_shapes() {
        let plain: NameList = serde_json::from_str(r#"["Pisos", "Azulejos"]"#).unwrap();
        assert_eq!(plain.into_names(), vec!["Pisos", "Azulejos"]);

        let named: NameList =
            serde_json::from_str(r#"{"categories": [{"name": "Pisos"}, {"nombre": "Muros"}]}"#).unwrap();
        assert_eq!(named.into_names(), vec!["Pisos", "Muros"]);

        let tags: NameList = serde_json::from_str(r#"{"tags": ["mate", "rústico"]}"#).unwrap();
        assert_eq!(tags.into_names(), vec!["mate", "rústico"]);
    }

    #[test]
    fn test_product_body_shapes() {
        let wrapped: ProductBody =
            serde_json::from_str(r#"{"product": {"_id": "p1", "name": "Roble"}}"#).unwrap();
        assert_eq!(Product::from(wrapped).id, "p1");

        let bare: ProductBody = serde_json::from_str(r#"{"_id": "p2", "nombre": "Pizarra"}"#).unwrap();
        assert_eq!(Product::from(bare).name, "Pizarra");
    }
}
