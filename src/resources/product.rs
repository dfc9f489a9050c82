//! `commercetools_product`

use tracing::{debug, info, warn};

use super::{localized_string, require_version, Resource, LOCALIZED_STRING_DOC};
use crate::client::models::{
    LocalizedString, Product, ProductDraft, ProductUpdateAction, ResourceIdentifier,
};
use crate::client::Client;
use crate::error::ProviderError;
use crate::resource_data::ResourceData;
use crate::retry::{retry_context, CREATE_TIMEOUT};
use crate::schema::{Attribute, AttributeFlags, Schema};

const TYPE_NAME: &str = "commercetools_product";

/// Products describe sellable goods based on a product type.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductResource;

impl ProductResource {
    fn draft(data: &ResourceData) -> Result<ProductDraft, ProviderError> {
        let required = |name: &str| -> Result<LocalizedString, ProviderError> {
            localized_string(data, name)?.ok_or_else(|| {
                ProviderError::Validation(format!("attribute '{}' is required", name))
            })
        };

        Ok(ProductDraft {
            product_type: data
                .get_str("product_type")
                .map(|id| ResourceIdentifier::by_id("product-type", id)),
            name: required("name")?,
            slug: required("slug")?,
            key: data.get_str("key").map(str::to_string),
            description: localized_string(data, "description")?,
        })
    }

    fn update_actions(data: &ResourceData) -> Result<Vec<ProductUpdateAction>, ProviderError> {
        let mut actions = Vec::new();

        if data.has_change("name") {
            if let Some(name) = localized_string(data, "name")? {
                actions.push(ProductUpdateAction::ChangeName {
                    name,
                    staged: false,
                });
            }
        }
        if data.has_change("slug") {
            if let Some(slug) = localized_string(data, "slug")? {
                actions.push(ProductUpdateAction::ChangeSlug {
                    slug,
                    staged: false,
                });
            }
        }
        if data.has_change("key") {
            actions.push(ProductUpdateAction::SetKey {
                key: data.get_str("key").map(str::to_string),
            });
        }
        if data.has_value_change("description") {
            actions.push(ProductUpdateAction::SetDescription {
                description: localized_string(data, "description")?,
                staged: false,
            });
        }

        Ok(actions)
    }

    fn apply(data: &mut ResourceData, product: &Product) -> Result<(), ProviderError> {
        let staged = &product.master_data.staged;
        data.set("version", product.version)?;
        data.set("key", &product.key)?;
        data.set("product_type", &product.product_type.id)?;
        data.set("name", &staged.name)?;
        data.set("slug", &staged.slug)?;
        data.set("description", &staged.description)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Resource for ProductResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "Products describe common characteristics of sellable goods, \
                 most importantly their product type",
            )
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "version",
                Attribute::computed_int64().with_description("Current version of the product"),
            )
            .with_attribute(
                "key",
                Attribute::optional_string().with_description("User-defined unique identifier"),
            )
            .with_attribute(
                "name",
                Attribute::localized_string(AttributeFlags::required())
                    .with_description(LOCALIZED_STRING_DOC),
            )
            .with_attribute(
                "slug",
                Attribute::localized_string(AttributeFlags::required())
                    .with_description(LOCALIZED_STRING_DOC),
            )
            .with_attribute(
                "description",
                Attribute::localized_string(AttributeFlags::optional())
                    .with_description(LOCALIZED_STRING_DOC),
            )
            .with_attribute(
                "product_type",
                Attribute::optional_string()
                    .with_force_new()
                    .with_description("ID of Product Type"),
            )
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> Result<(), ProviderError> {
        let draft = Self::draft(data)?;
        let draft = &draft;

        let product = retry_context(CREATE_TIMEOUT, move || client.products().create(draft)).await?;
        info!(id = %product.id, version = product.version, "Created product");

        data.set_id(&product.id);
        data.set("version", product.version)?;
        self.read(client, data).await
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id("read")?.to_string();

        match client.products().get(&id).await {
            Ok(product) => Self::apply(data, &product),
            Err(e) if e.is_not_found() => {
                warn!(%id, "Product no longer exists, removing from state");
                data.clear_id();
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id("update")?.to_string();
        let actions = Self::update_actions(data)?;

        if actions.is_empty() {
            debug!(%id, "No product changes to apply");
        } else {
            let version = require_version(data, "update")?;
            let product = client.products().update(&id, version, &actions).await?;
            info!(%id, version = product.version, actions = actions.len(), "Updated product");
            data.set("version", product.version)?;
        }

        self.read(client, data).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> Result<(), ProviderError> {
        let id = data.require_id("delete")?.to_string();
        let version = require_version(data, "delete")?;

        match client.products().delete(&id, version).await {
            Ok(_) => info!(%id, "Deleted product"),
            Err(e) if e.is_not_found() => debug!(%id, "Product already deleted"),
            Err(e) => return Err(e.into()),
        }

        data.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::plan_resource;
    use serde_json::json;

    #[test]
    fn test_draft_with_product_type() {
        let data = ResourceData::from_value(json!({
            "name": {"en": "Shoe"},
            "slug": {"en": "shoe"},
            "product_type": "pt-1"
        }))
        .unwrap();

        let draft = ProductResource::draft(&data).unwrap();
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            json!({
                "productType": {"typeId": "product-type", "id": "pt-1"},
                "name": {"en": "Shoe"},
                "slug": {"en": "shoe"}
            })
        );
    }

    #[test]
    fn test_draft_without_product_type() {
        let data = ResourceData::from_value(json!({
            "name": {"en": "Shoe"},
            "slug": {"en": "shoe"},
            "product_type": "",
            "key": "shoe-1"
        }))
        .unwrap();

        let draft = ProductResource::draft(&data).unwrap();
        assert!(draft.product_type.is_none());
        assert_eq!(draft.key.as_deref(), Some("shoe-1"));
    }

    #[test]
    fn test_draft_requires_name() {
        let data = ResourceData::from_value(json!({"slug": {"en": "shoe"}})).unwrap();
        assert!(matches!(
            ProductResource::draft(&data),
            Err(ProviderError::Validation(_))
        ));
    }

    #[test]
    fn test_update_actions_only_for_changes() {
        let data = ResourceData::for_update(
            json!({
                "id": "p1",
                "version": 3,
                "name": {"en": "Shoe"},
                "slug": {"en": "shoe"},
                "key": "k"
            }),
            json!({
                "id": "p1",
                "version": 3,
                "name": {"en": "Boot"},
                "slug": {"en": "shoe"},
                "key": null
            }),
        )
        .unwrap();

        let actions = ProductResource::update_actions(&data).unwrap();
        assert_eq!(
            serde_json::to_value(&actions).unwrap(),
            json!([
                {"action": "changeName", "name": {"en": "Boot"}, "staged": false},
                {"action": "setKey"}
            ])
        );
    }

    #[test]
    fn test_empty_description_settles_after_apply() {
        let config = json!({
            "name": {"en": "Shoe"},
            "slug": {"en": "shoe"},
            "description": {}
        });
        let remote: Product = serde_json::from_value(json!({
            "id": "p1",
            "version": 1,
            "productType": {"typeId": "product-type", "id": "pt-1"},
            "masterData": {
                "staged": {"name": {"en": "Shoe"}, "slug": {"en": "shoe"}}
            }
        }))
        .unwrap();

        let mut data = ResourceData::from_value(config.clone()).unwrap();
        data.set_id("p1");
        ProductResource::apply(&mut data, &remote).unwrap();
        let prior = data.into_state();

        let mut proposed = config;
        proposed["product_type"] = json!("pt-1");
        let plan = plan_resource(&ProductResource.schema(), &prior, &proposed);
        assert!(!plan.has_changes(), "unexpected changes: {:?}", plan.changes);
    }

    #[test]
    fn test_schema() {
        let schema = ProductResource.schema();
        assert!(schema.attributes["name"].flags.required);
        assert!(schema.attributes["slug"].flags.required);
        assert!(schema.attributes["product_type"].force_new);
    }
}
