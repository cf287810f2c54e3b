use std::sync::Arc;

use lazy_forms_core::{
    ControlRef, ControlSlot, LazyWidget, Metadata, OnLazySetup, WidgetContext, WidgetType,
};
use serde_json::Value;

pub const TEXT_INPUT: WidgetType = WidgetType::new("text-input", TextInput::boxed);

/// Default single-value input. Reads the `type` option (`"text"` when
/// absent).
#[derive(Default)]
pub struct TextInput {
    slot: ControlSlot,
    value: Value,
    metadata: Option<Arc<Metadata>>,
}

impl TextInput {
    fn boxed() -> Box<dyn LazyWidget> {
        Box::<Self>::default()
    }

    pub fn input_type(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.option("type"))
            .and_then(Value::as_str)
            .unwrap_or("text")
    }

    pub fn label(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|metadata| metadata.label())
    }
}

impl LazyWidget for TextInput {
    fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    fn set_metadata(&mut self, metadata: Arc<Metadata>) {
        self.metadata = Some(metadata);
    }

    fn control(&self) -> &ControlSlot {
        &self.slot
    }

    fn lazy_setup(&mut self) -> Option<&mut dyn OnLazySetup> {
        Some(self)
    }
}

impl OnLazySetup for TextInput {
    fn on_lazy_setup(&mut self, _cx: &WidgetContext) {
        let validators = self
            .metadata
            .as_ref()
            .map(|metadata| metadata.validators())
            .unwrap_or_default();
        self.slot
            .set(ControlRef::field(self.value.clone(), validators));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_forms_core::{LazyForm, Runtime, DefaultScheduler};
    use serde_json::json;

    #[test]
    fn input_type_defaults_to_text() {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        let mut form =
            LazyForm::new(runtime.handle(), ControlRef::group(Vec::new())).expect("form");
        let plain = Arc::new(Metadata::builder(TEXT_INPUT).label("Alias").build("alias"));
        let numeric = Arc::new(
            Metadata::builder(TEXT_INPUT)
                .option("type", json!("number"))
                .build("age"),
        );
        form.insert_host(plain, json!("Whirlwind")).expect("host");
        form.insert_host(numeric, json!(40)).expect("host");

        let alias = form.host("alias").expect("alias host");
        assert_eq!(
            alias.with_widget_as::<TextInput, _>(|input| input.input_type().to_owned()),
            Some("text".to_owned())
        );
        assert_eq!(
            alias.with_widget_as::<TextInput, _>(|input| input.label().map(str::to_owned)),
            Some(Some("Alias".to_owned()))
        );
        let age = form.host("age").expect("age host");
        assert_eq!(
            age.with_widget_as::<TextInput, _>(|input| input.input_type().to_owned()),
            Some("number".to_owned())
        );

        runtime.handle().run_until_idle();
        assert_eq!(form.value(), json!({ "alias": "Whirlwind", "age": 40 }));
    }
}
