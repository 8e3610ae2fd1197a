//! End-to-end page workflows through the `folio` facade
//!
//! Requests are shaped with `folio_testing`, options come from
//! `folio_config`, and pages run through the invoker.

use folio::prelude::*;
use folio_config::{ConfigManager, FileFormat};
use folio_testing::{TestRequestBuilder, assert_single_error, binding_test_context};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Member {
    name: Option<String>,
    age: i32,
}

impl Bindable for Member {
    fn describe() -> ModelMetadata {
        ModelMetadata::complex::<Member>(
            "Member",
            vec![
                PropertyMetadata::new::<Option<String>>("Name").validate(Required::new()),
                PropertyMetadata::new::<i32>("Age"),
            ],
        )
    }
}

#[derive(Default)]
struct RegisterPage {
    input: Member,
}

#[async_trait]
impl PageModel for RegisterPage {
    async fn invoke_handler(
        &mut self,
        handler: &HandlerMethodDescriptor,
        context: &mut PageContext,
        arguments: HandlerArguments,
    ) -> Result<Option<ActionResult>, Error> {
        match handler.method_name.as_str() {
            "OnGet" => Ok(None),
            "OnGetLookup" if !context.model_state.is_valid() => Ok(Some(ActionResult::status(400))),
            "OnGetLookup" => {
                let ids: Vec<i32> = arguments.get("ids")?;
                Ok(Some(ActionResult::json(&json!({ "ids": ids }))?))
            }
            "OnPost" if !context.model_state.is_valid() => Ok(Some(ActionResult::page())),
            "OnPost" => Ok(Some(ActionResult::redirect(format!(
                "/Welcome?name={}",
                self.input.name.clone().unwrap_or_default()
            )))),
            _ => Ok(Some(ActionResult::not_found())),
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), Error> {
        match name {
            "Input" => {
                self.input = serde_json::from_value(value)?;
                Ok(())
            }
            other => Err(Error::InvalidOperation(format!("unknown property {}", other))),
        }
    }

    fn view_data(&self) -> Result<Value, Error> {
        Ok(json!({ "Input": self.input }))
    }
}

fn register_page() -> PageActionDescriptor {
    PageActionDescriptor::new::<RegisterPage>("/Register")
        .with_handler(HandlerMethodDescriptor::new("OnGet", "GET"))
        .with_handler(
            HandlerMethodDescriptor::new("OnGetLookup", "GET")
                .named("Lookup")
                .with_parameter(ParameterDescriptor::new::<Vec<i32>>("ids")),
        )
        .with_handler(HandlerMethodDescriptor::new("OnPost", "POST"))
        .with_bound_property(BoundPropertyDescriptor::new(
            ParameterDescriptor::new::<Member>("Input"),
        ))
}

fn invoker() -> PageActionInvoker {
    let pages = Arc::new(ActionDescriptorCollectionProvider::new(vec![register_page()]));
    PageActionInvoker::builder(pages).build()
}

fn body(response: &HttpResponse) -> Value {
    serde_json::from_slice(&response.body).unwrap()
}

#[tokio::test]
async fn test_valid_post_redirects() {
    let request = TestRequestBuilder::post("/Register")
        .form("Input.Name", "Ada")
        .form("Input.Age", "36")
        .context(Container::new())
        .unwrap();

    let response = invoker().invoke_page("/Register", request).await.unwrap();

    assert_eq!(response.status, 302);
    assert_eq!(
        response.headers.get("Location").map(String::as_str),
        Some("/Welcome?name=Ada")
    );
}

#[tokio::test]
async fn test_invalid_post_renders_page_with_model_state() {
    let request = TestRequestBuilder::post("/Register")
        .form("Input.Age", "36")
        .context(Container::new())
        .unwrap();

    let response = invoker().invoke_page("/Register", request).await.unwrap();

    assert_eq!(response.status, 200);
    let body = body(&response);
    assert_eq!(body["page"], "/Register");
    assert_eq!(body["model"]["Input"]["Age"], 36);
}

#[tokio::test]
async fn test_get_does_not_bind_post_properties() {
    let request = TestRequestBuilder::get("/Register")
        .query("Input.Name", "Ada")
        .context(Container::new())
        .unwrap();

    let response = invoker().invoke_page("/Register", request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(body(&response)["model"]["Input"]["Name"], Value::Null);
}

#[tokio::test]
async fn test_named_handler_binds_collection() {
    let request = TestRequestBuilder::get("/Register")
        .query("handler", "Lookup")
        .query("ids", "1")
        .query("ids", "2")
        .query("ids", "3")
        .context(Container::new())
        .unwrap();

    let response = invoker().invoke_page("/Register", request).await.unwrap();

    assert_eq!(body(&response), json!({ "ids": [1, 2, 3] }));
}

#[tokio::test]
async fn test_configured_handler_route_key() {
    let config = ConfigManager::new();
    config
        .load_str(
            "[page]\nhandler_route_key = \"action\"\nallow_handler_from_query = false\n",
            FileFormat::Toml,
        )
        .unwrap();

    let pages = Arc::new(ActionDescriptorCollectionProvider::new(vec![register_page()]));
    let invoker = PageActionInvoker::builder(pages)
        .options(config.page_options().unwrap())
        .build();

    let from_query = TestRequestBuilder::get("/Register")
        .query("action", "Lookup")
        .query("ids", "7")
        .context(Container::new())
        .unwrap();
    let response = invoker.invoke_page("/Register", from_query).await.unwrap();
    assert_eq!(body(&response)["page"], "/Register");

    let from_route = TestRequestBuilder::get("/Register")
        .route_value("action", "Lookup")
        .query("ids", "7")
        .context(Container::new())
        .unwrap();
    let response = invoker.invoke_page("/Register", from_route).await.unwrap();
    assert_eq!(body(&response), json!({ "ids": [7] }));
}

#[tokio::test]
async fn test_configured_collection_limit() {
    let config = ConfigManager::new();
    config
        .load_str(r#"{"binding": {"max_model_binding_collection_size": 2}}"#, FileFormat::Json)
        .unwrap();
    let runtime = Arc::new(BindingRuntime::new(config.binding_options().unwrap()));

    let pages = Arc::new(ActionDescriptorCollectionProvider::new(vec![register_page()]));
    let invoker = PageActionInvoker::builder(pages).runtime(runtime).build();

    let request = TestRequestBuilder::get("/Register")
        .query("handler", "Lookup")
        .query("ids", "1")
        .query("ids", "2")
        .query("ids", "3")
        .context(Container::new())
        .unwrap();

    let response = invoker.invoke_page("/Register", request).await.unwrap();
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_unknown_page() {
    let request = TestRequestBuilder::get("/Missing").context(Container::new()).unwrap();
    let err = invoker().invoke_page("/Missing", request).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_dictionary_from_form() {
    let mut context = binding_test_context(|request| {
        request
            .form("prices[apple]", "3")
            .form("prices[pear]", "5")
    })
    .unwrap();

    let prices = context
        .bind_value::<HashMap<String, i32>>("prices")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(prices.get("apple"), Some(&3));
    assert_eq!(prices.get("pear"), Some(&5));
}

#[tokio::test]
async fn test_required_member_name() {
    let mut context = binding_test_context(|request| request.query("Age", "12")).unwrap();

    let member = context.bind_value::<Member>("member").await.unwrap().unwrap();

    assert_eq!(member.age, 12);
    assert_single_error(&context.model_state, "Name", "The Name field is required.");
}
