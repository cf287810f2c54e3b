use lazy_forms_core::{LazyFormError, LazyModel, Metadata, MetadataTable};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{ADDRESS_LIST, SELECT, TEXT_INPUT};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

static ADDRESS_FIELDS: Lazy<MetadataTable> = Lazy::new(|| {
    MetadataTable::builder()
        .register("street", Metadata::builder(TEXT_INPUT).label("Street"))
        .register("city", Metadata::builder(TEXT_INPUT).label("City"))
        .register(
            "state",
            Metadata::builder(SELECT)
                .label("State")
                .option("collection", json!(["CA", "MD", "OH", "VA"])),
        )
        .register("zip", Metadata::builder(TEXT_INPUT).label("Zip Code"))
        .build()
});

impl LazyModel for Address {
    fn metadata_table() -> &'static MetadataTable {
        &ADDRESS_FIELDS
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hero {
    pub id: u32,
    pub name: String,
    pub addresses: Vec<Address>,
}

static HERO_FIELDS: Lazy<MetadataTable> = Lazy::new(|| {
    MetadataTable::builder()
        .register(
            "name",
            Metadata::builder(TEXT_INPUT).label("Name").required(true),
        )
        .register("addresses", Metadata::builder(ADDRESS_LIST).label("Address"))
        .build()
});

impl LazyModel for Hero {
    fn metadata_table() -> &'static MetadataTable {
        &HERO_FIELDS
    }
}

impl Hero {
    /// Takes the edited fields from a submitted form value. `id` is kept.
    pub fn update(&mut self, form_value: &Value) -> Result<(), LazyFormError> {
        let mut edited: Hero = serde_json::from_value(form_value.clone())?;
        edited.id = self.id;
        *self = edited;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hero_registers_only_rendered_fields() {
        let fields: Vec<&str> = Hero::metadata_table().iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec!["name", "addresses"]);
        assert!(Hero::metadata("name").is_some_and(|metadata| metadata.is_required()));
        assert!(Hero::metadata("id").is_none());
    }

    #[test]
    fn update_keeps_id_and_fills_missing_fields() {
        let mut hero = Hero {
            id: 3,
            name: "Magneta".into(),
            addresses: Vec::new(),
        };

        hero.update(&json!({
            "name": "Magneta Prime",
            "addresses": [{ "street": "1 Pole", "state": "OH" }]
        }))
        .expect("valid form value");

        assert_eq!(hero.id, 3);
        assert_eq!(hero.name, "Magneta Prime");
        assert_eq!(
            hero.addresses,
            vec![Address {
                street: "1 Pole".into(),
                state: "OH".into(),
                ..Address::default()
            }]
        );
    }

    #[test]
    fn update_rejects_malformed_values() {
        let mut hero = Hero::default();
        let result = hero.update(&json!({ "name": 7 }));
        assert!(matches!(result, Err(LazyFormError::Serialization(_))));
        assert_eq!(hero, Hero::default());
    }
}
