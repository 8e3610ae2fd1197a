//! Binding scenarios against whole requests

use async_trait::async_trait;
use folio_binding::*;
use folio_core::{Container, Error, FormFile, HttpRequest, Provider};
use folio_validation::Required;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Address {
    street: Option<String>,
}

impl Bindable for Address {
    fn describe() -> ModelMetadata {
        ModelMetadata::complex::<Address>(
            "Address",
            vec![PropertyMetadata::new::<Option<String>>("Street")],
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Customer {
    address: Address,
}

impl Bindable for Customer {
    fn describe() -> ModelMetadata {
        ModelMetadata::complex::<Customer>(
            "Customer",
            vec![PropertyMetadata::new::<Address>("Address")],
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Frozen {
    items: ReadOnlyList<Address>,
    numbers: Box<[i32]>,
}

impl Bindable for Frozen {
    fn describe() -> ModelMetadata {
        ModelMetadata::complex::<Frozen>(
            "Frozen",
            vec![
                PropertyMetadata::new::<ReadOnlyList<Address>>("Items").read_only(),
                PropertyMetadata::new::<Box<[i32]>>("Numbers").read_only(),
            ],
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddressBook {
    addresses: Vec<Address>,
}

impl Bindable for AddressBook {
    fn describe() -> ModelMetadata {
        ModelMetadata::complex::<AddressBook>(
            "AddressBook",
            vec![PropertyMetadata::new::<Vec<Address>>("Addresses").read_only()],
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Person10 {
    name: Option<String>,
}

impl Bindable for Person10 {
    fn describe() -> ModelMetadata {
        ModelMetadata::complex::<Person10>(
            "Person10",
            vec![PropertyMetadata::new::<Option<String>>("Name")],
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Order10 {
    customer: Option<Person10>,
}

impl Bindable for Order10 {
    fn describe() -> ModelMetadata {
        ModelMetadata::complex::<Order10>(
            "Order10",
            vec![PropertyMetadata::new::<Option<Person10>>("Customer").bind_required()],
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Person11 {
    id: i32,
    name: Option<String>,
}

impl Bindable for Person11 {
    fn describe() -> ModelMetadata {
        ModelMetadata::complex::<Person11>(
            "Person11",
            vec![
                PropertyMetadata::new::<i32>("Id"),
                PropertyMetadata::new::<Option<String>>("Name").bind_required(),
            ],
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Order11 {
    customer: Option<Person11>,
}

impl Bindable for Order11 {
    fn describe() -> ModelMetadata {
        ModelMetadata::complex::<Order11>(
            "Order11",
            vec![PropertyMetadata::new::<Option<Person11>>("Customer")],
        )
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
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

struct Clock {
    now: u64,
}

impl Provider for Clock {}

fn get(query: &str) -> RequestContext {
    let mut request = HttpRequest::new("GET", "/");
    request.query_string = query.to_string();
    RequestContext::new(request, Container::new()).unwrap()
}

fn post_form(body: &str) -> RequestContext {
    let mut request = HttpRequest::new("POST", "/");
    request.headers.insert(
        "Content-Type".to_string(),
        "application/x-www-form-urlencoded".to_string(),
    );
    request.body = body.as_bytes().to_vec();
    RequestContext::new(request, Container::new()).unwrap()
}

async fn bind_with(
    runtime: BindingRuntime,
    request: &RequestContext,
    parameter: &ParameterDescriptor,
) -> (Result<Option<ModelBindingResult>, Error>, ModelStateDictionary) {
    let binder = ParameterBinder::new(Arc::new(runtime));
    let values = Arc::new(request.value_provider());
    let mut model_state = ModelStateDictionary::new();
    let result = binder
        .bind_model(request, &values, parameter, &mut model_state, None)
        .await;
    (result, model_state)
}

async fn bind(
    request: &RequestContext,
    parameter: &ParameterDescriptor,
) -> (ModelBindingResult, ModelStateDictionary) {
    let (result, model_state) = bind_with(BindingRuntime::default(), request, parameter).await;
    (result.unwrap().unwrap(), model_state)
}

#[tokio::test]
async fn test_empty_input_binds_empty_collections() {
    let request = get("?unrelated=1");

    let (list, state) = bind(&request, &ParameterDescriptor::new::<Vec<i32>>("parameter")).await;
    assert!(list.is_model_set);
    assert_eq!(list.model, Some(json!([])));
    assert!(state.is_empty());
    assert!(state.is_valid());

    let (array, state) = bind(&request, &ParameterDescriptor::new::<Box<[i32]>>("parameter")).await;
    assert_eq!(array.model, Some(json!([])));
    assert!(state.is_empty());

    // Under the empty prefix every top-level key is a dictionary key
    let (map, state) = bind(
        &get(""),
        &ParameterDescriptor::new::<HashMap<String, i32>>("parameter"),
    )
    .await;
    assert_eq!(map.model, Some(json!({})));
    assert!(state.is_empty());
    assert!(state.is_valid());
}

#[tokio::test]
async fn test_prefix_falls_back_to_empty() {
    let parameter = ParameterDescriptor::new::<Customer>("p");

    let (result, state) = bind(&get("?Address.Street=X"), &parameter).await;
    let customer: Customer = result.model_as().unwrap().unwrap();
    assert_eq!(customer.address.street.as_deref(), Some("X"));
    assert_eq!(state.keys().collect::<Vec<_>>(), vec!["Address.Street"]);
    assert!(state.is_valid());

    let (result, state) = bind(&get("?p.Address.Street=X"), &parameter).await;
    let customer: Customer = result.model_as().unwrap().unwrap();
    assert_eq!(customer.address.street.as_deref(), Some("X"));
    assert_eq!(state.keys().collect::<Vec<_>>(), vec!["p.Address.Street"]);
}

#[tokio::test]
async fn test_read_only_immutable_members_are_untouched() {
    let request = get("?Items[0].Street=x&Items[1].Street=y&Numbers[0]=1&Numbers[1]=2");
    let (result, state) = bind(&request, &ParameterDescriptor::new::<Frozen>("frozen")).await;

    let frozen: Frozen = result.model_as().unwrap().unwrap();
    assert!(frozen.items.is_empty());
    assert!(frozen.numbers.is_empty());
    assert_eq!(state.len(), 0);
    assert!(state.is_valid());
}

#[tokio::test]
async fn test_read_only_mutable_collection_is_refilled() {
    let request = get("?Addresses[0].Street=a&Addresses[1].Street=b");
    let (result, state) = bind(&request, &ParameterDescriptor::new::<AddressBook>("book")).await;

    let book: AddressBook = result.model_as().unwrap().unwrap();
    assert_eq!(book.addresses.len(), 2);
    assert_eq!(book.addresses[1].street.as_deref(), Some("b"));
    assert_eq!(state.len(), 2);
    assert!(state.contains_key("Addresses[0].Street"));
    assert!(state.contains_key("Addresses[1].Street"));
}

#[tokio::test]
async fn test_required_property_without_data() {
    let (result, state) = bind(&get(""), &ParameterDescriptor::new::<Order10>("parameter")).await;

    let order: Order10 = result.model_as().unwrap().unwrap();
    assert!(order.customer.is_none());
    assert_eq!(state.len(), 1);
    let entry = state.get("Customer").unwrap();
    assert_eq!(entry.validation_state, ModelValidationState::Invalid);
    assert_eq!(entry.errors.len(), 1);
    assert_eq!(
        entry.errors[0].error_message,
        "A value for the 'Customer' property was not provided."
    );
    assert!(entry.raw_value.is_none());
}

#[tokio::test]
async fn test_required_message_is_configurable() {
    let runtime = BindingRuntime::default();
    runtime.metadata.configure::<Order10>(|metadata| {
        let mut messages = ModelBindingMessageProvider::new();
        messages.set_missing_bind_required_value_accessor(|name| {
            format!("Hurts when '{}' is not provided.", name)
        });
        metadata.messages = Some(Arc::new(messages));
    });

    let (result, state) = bind_with(
        runtime,
        &get(""),
        &ParameterDescriptor::new::<Order10>("parameter"),
    )
    .await;

    assert!(result.unwrap().unwrap().is_model_set);
    let entry = state.get("Customer").unwrap();
    assert_eq!(entry.errors.len(), 1);
    assert_eq!(
        entry.errors[0].error_message,
        "Hurts when 'Customer' is not provided."
    );
}

#[tokio::test]
async fn test_nested_required_property_with_partial_data() {
    let request = get("?parameter.Customer.Id=123");
    let (result, state) = bind(&request, &ParameterDescriptor::new::<Order11>("parameter")).await;

    let order: Order11 = result.model_as().unwrap().unwrap();
    assert_eq!(order.customer.as_ref().map(|c| c.id), Some(123));

    assert_eq!(state.len(), 2);
    assert_eq!(
        state.get_validation_state("parameter.Customer.Id"),
        ModelValidationState::Valid
    );
    let name = state.get("parameter.Customer.Name").unwrap();
    assert_eq!(
        name.errors[0].error_message,
        "A value for the 'Name' property was not provided."
    );
    assert!(!state.is_valid());
}

#[tokio::test]
async fn test_dictionary_encodings_are_equivalent() {
    let parameter = ParameterDescriptor::new::<HashMap<String, i32>>("parameter");
    let expected: HashMap<String, i32> = [("key0".to_string(), 10)].into_iter().collect();

    let (short, short_state) = bind(&get("?parameter[key0]=10"), &parameter).await;
    let (pairs, pair_state) = bind(
        &get("?parameter[0].Key=key0&parameter[0].Value=10"),
        &parameter,
    )
    .await;

    assert_eq!(short.model_as::<HashMap<String, i32>>().unwrap(), Some(expected.clone()));
    assert_eq!(pairs.model_as::<HashMap<String, i32>>().unwrap(), Some(expected));
    assert!(short_state.is_valid());
    assert!(pair_state.is_valid());
    assert_eq!(
        short_state.get_validation_state("parameter[key0]"),
        ModelValidationState::Valid
    );
    assert_eq!(
        pair_state.get_validation_state("parameter[0].Value"),
        ModelValidationState::Valid
    );
}

#[tokio::test]
async fn test_multi_value_query_binds_first_value() {
    let request = get("?Parameter1=someValue&Parameter1=otherValue");
    let (result, state) = bind(&request, &ParameterDescriptor::new::<String>("Parameter1")).await;

    assert_eq!(result.model, Some(json!("someValue")));
    let entry = state.get("Parameter1").unwrap();
    assert_eq!(entry.attempted_value.as_deref(), Some("someValue,otherValue"));
    assert_eq!(entry.raw_value, Some(json!(["someValue", "otherValue"])));
    assert_eq!(entry.validation_state, ModelValidationState::Valid);
}

#[tokio::test]
async fn test_non_convertible_value() {
    let (result, state) = bind(&get("?Parameter1=abcd"), &ParameterDescriptor::new::<i32>("Parameter1")).await;

    assert!(!result.is_model_set);
    assert_eq!(result.model, None);
    let entry = state.get("Parameter1").unwrap();
    assert_eq!(entry.validation_state, ModelValidationState::Invalid);
    assert_eq!(entry.attempted_value.as_deref(), Some("abcd"));
    assert_eq!(entry.errors.len(), 1);
    assert_eq!(
        entry.errors[0].error_message,
        "The value 'abcd' is not valid for Int32."
    );
}

#[tokio::test]
async fn test_empty_value_for_value_type() {
    let (result, state) = bind(&get("?id="), &ParameterDescriptor::new::<i32>("id")).await;
    assert!(!result.is_model_set);
    assert_eq!(
        state.get("id").unwrap().errors[0].error_message,
        "The value '' is invalid."
    );

    let (result, state) = bind(&get("?id="), &ParameterDescriptor::new::<Option<i32>>("id")).await;
    assert!(result.is_model_set);
    assert_eq!(result.model, Some(Value::Null));
    assert!(state.is_valid());
}

#[tokio::test]
async fn test_custom_indices_from_form() {
    let request = post_form(
        "Addresses.index=Key1&Addresses.index=Key2\
         &Addresses[Key1].Street=Street1&Addresses[Key2].Street=Street2",
    );
    let (result, state) = bind(&request, &ParameterDescriptor::new::<AddressBook>("parameter")).await;

    let book: AddressBook = result.model_as().unwrap().unwrap();
    let streets: Vec<_> = book
        .addresses
        .iter()
        .map(|a| a.street.clone().unwrap_or_default())
        .collect();
    assert_eq!(streets, vec!["Street1", "Street2"]);

    assert_eq!(state.len(), 2);
    assert!(state.contains_key("Addresses[Key1].Street"));
    assert!(state.contains_key("Addresses[Key2].Street"));
    assert!(!state.contains_key("Addresses.index"));
    assert_eq!(
        state.get_validation_state("Addresses[Key2].Street"),
        ModelValidationState::Valid
    );
}

#[tokio::test]
async fn test_custom_index_without_data_binds_default() {
    let request = get("?ids.index=a&ids.index=b&ids.index=c&ids[a]=5&ids[c]=7");
    let (result, state) = bind(&request, &ParameterDescriptor::new::<Vec<i32>>("ids")).await;

    let ids: Vec<i32> = result.model_as().unwrap().unwrap();
    assert_eq!(ids, vec![5, 0, 7]);
    assert!(state.is_valid());
    assert!(!state.contains_key("ids[b]"));
}

#[tokio::test]
async fn test_key_value_pair_missing_value() {
    let request = get("?parameter.Key=key0");
    let (result, state) = bind(
        &request,
        &ParameterDescriptor::new::<KeyValuePair<String, i32>>("parameter"),
    )
    .await;

    assert!(!result.is_model_set);
    assert_eq!(
        state.get("parameter.Value").unwrap().errors[0].error_message,
        "A value is required."
    );
    assert_eq!(state.get("parameter.Key").unwrap().attempted_value.as_deref(), Some("key0"));
}

#[tokio::test]
async fn test_body_binding_and_validation() {
    let parameter = ParameterDescriptor::new::<Member>("member").from_body();

    let mut request = HttpRequest::new("POST", "/");
    request
        .headers
        .insert("Content-Type".to_string(), "application/json".to_string());
    request.body = br#"{"Age": 30}"#.to_vec();
    let request = RequestContext::new(request, Container::new()).unwrap();

    let (result, state) = bind(&request, &parameter).await;
    let member: Member = result.model_as().unwrap().unwrap();
    assert_eq!(member.age, 30);
    assert_eq!(
        state.get("Name").unwrap().errors[0].error_message,
        "The Name field is required."
    );

    let empty = RequestContext::new(HttpRequest::new("POST", "/"), Container::new()).unwrap();
    let (result, state) = bind(&empty, &parameter).await;
    assert!(!result.is_model_set);
    assert_eq!(
        state.get("").unwrap().errors[0].error_message,
        "A non-empty request body is required."
    );
}

#[tokio::test]
async fn test_body_of_the_wrong_shape_is_a_model_error() {
    let parameter = ParameterDescriptor::new::<Member>("member").from_body();

    let mut request = HttpRequest::new("POST", "/");
    request
        .headers
        .insert("Content-Type".to_string(), "application/json".to_string());
    request.body = br#"{"Name": "x", "Age": "thirty"}"#.to_vec();
    let request = RequestContext::new(request, Container::new()).unwrap();

    let (result, state) = bind(&request, &parameter).await;

    assert!(!result.is_model_set);
    assert!(!state.is_valid());
    let entry = state.get("Age").unwrap();
    assert_eq!(entry.validation_state, ModelValidationState::Invalid);
    assert_eq!(
        entry.errors[0].error_message,
        "The JSON value could not be converted to Int32."
    );
}

#[tokio::test]
async fn test_body_fills_missing_properties() {
    let parameter = ParameterDescriptor::new::<Customer>("customer").from_body();

    let mut request = HttpRequest::new("POST", "/");
    request
        .headers
        .insert("Content-Type".to_string(), "application/json".to_string());
    request.body = b"{}".to_vec();
    let request = RequestContext::new(request, Container::new()).unwrap();

    let (result, state) = bind(&request, &parameter).await;

    let customer: Customer = result.model_as().unwrap().unwrap();
    assert_eq!(customer.address, Address::default());
    assert!(state.is_valid());
}

#[tokio::test]
async fn test_header_binding_splits_collections() {
    let mut request = HttpRequest::new("GET", "/");
    request.headers.insert("tags".to_string(), "a, b".to_string());
    request.headers.insert("X-Trace".to_string(), "abc".to_string());
    let request = RequestContext::new(request, Container::new()).unwrap();

    let (tags, _) = bind(&request, &ParameterDescriptor::new::<Vec<String>>("tags").from_header()).await;
    assert_eq!(tags.model, Some(json!(["a", "b"])));

    let (trace, _) = bind(
        &request,
        &ParameterDescriptor::new::<String>("trace").model_name("X-Trace").from_header(),
    )
    .await;
    assert_eq!(trace.model, Some(json!("abc")));
}

#[tokio::test]
async fn test_services_binding() {
    let services = Container::new();
    services.register(Clock { now: 7 });
    let request = RequestContext::new(HttpRequest::new("GET", "/"), services).unwrap();

    let parameter = ParameterDescriptor::new::<FromServices<Clock>>("clock");
    let (result, state) = bind(&request, &parameter).await;
    let clock = FromServices::<Clock>::from_instance(result.service.unwrap()).unwrap();
    assert_eq!(clock.now, 7);
    assert!(state.is_empty());

    let (missing, _) = bind_with(BindingRuntime::default(), &get(""), &parameter).await;
    assert!(matches!(missing, Err(Error::ProviderNotFound(_))));
}

#[tokio::test]
async fn test_form_file_binding() {
    let mut request = HttpRequest::new("POST", "/");
    request.files.push((
        "upload".to_string(),
        FormFile::new("upload", "notes.txt", "text/plain", b"hello".to_vec()),
    ));
    let request = RequestContext::new(request, Container::new()).unwrap();

    let (result, state) = bind(&request, &ParameterDescriptor::new::<FormFile>("upload")).await;
    let file: FormFile = result.model_as().unwrap().unwrap();
    assert_eq!(file.file_name, "notes.txt");
    assert_eq!(file.text(), "hello");
    assert_eq!(state.get_validation_state("upload"), ModelValidationState::Valid);

    let (files, _) = bind(&request, &ParameterDescriptor::new::<Vec<FormFile>>("other")).await;
    assert_eq!(files.model, Some(json!([])));
}

#[tokio::test]
async fn test_byte_array_binding() {
    let (result, _) = bind(&get("?data=RnlzMQ%3D%3D"), &ParameterDescriptor::new::<Base64Bytes>("data")).await;
    let bytes: Base64Bytes = result.model_as().unwrap().unwrap();
    assert_eq!(bytes.0, b"Fys1".to_vec());

    let (result, state) = bind(&get("?data=%40%40%40"), &ParameterDescriptor::new::<Base64Bytes>("data")).await;
    assert!(!result.is_model_set);
    assert_eq!(
        state.get("data").unwrap().errors[0].error_message,
        "The value '@@@' is not valid for Byte[]."
    );
}

#[tokio::test]
async fn test_bind_required_parameter() {
    let parameter = ParameterDescriptor::new::<i32>("id").bind_required();
    let (result, state) = bind_with(BindingRuntime::default(), &get(""), &parameter).await;

    assert!(result.unwrap().is_none());
    assert_eq!(
        state.get("").unwrap().errors[0].error_message,
        "A value for the 'id' property was not provided."
    );
}

#[tokio::test]
async fn test_collection_size_limit() {
    let runtime = BindingRuntime::new(BindingOptions {
        max_model_binding_collection_size: 2,
        ..BindingOptions::default()
    });
    let (result, state) = bind_with(
        runtime,
        &get("?p[0]=1&p[1]=2&p[2]=3"),
        &ParameterDescriptor::new::<Vec<i32>>("p"),
    )
    .await;

    assert!(!result.unwrap().unwrap().is_model_set);
    assert!(
        state.get("p").unwrap().errors[0]
            .error_message
            .starts_with("Collection bound to 'p' exceeded")
    );
}

#[tokio::test]
async fn test_try_update_keeps_unbound_properties() {
    let request = get("?Name=new");
    let binder = ParameterBinder::new(Arc::new(BindingRuntime::default()));
    let values = Arc::new(request.value_provider());
    let mut model_state = ModelStateDictionary::new();

    let mut member = Member {
        name: Some("old".to_string()),
        age: 5,
    };
    let valid = binder
        .try_update(&request, &values, &mut member, "", &mut model_state)
        .await
        .unwrap();

    assert!(valid);
    assert_eq!(member.name.as_deref(), Some("new"));
    assert_eq!(member.age, 5);
}

#[tokio::test]
async fn test_try_update_top_level_collection() {
    let request = get("?[0]=3&[1]=4");
    let binder = ParameterBinder::new(Arc::new(BindingRuntime::default()));
    let values = Arc::new(request.value_provider());
    let mut model_state = ModelStateDictionary::new();

    let mut numbers = vec![1, 2, 9];
    assert!(
        binder
            .try_update(&request, &values, &mut numbers, "", &mut model_state)
            .await
            .unwrap()
    );
    assert_eq!(numbers, vec![3, 4]);
}

struct Shouting;

#[async_trait]
impl ModelBinder for Shouting {
    async fn bind_model(
        &self,
        ctx: &mut ModelBindingContext<'_>,
    ) -> Result<Option<ModelBindingResult>, Error> {
        let value = ctx.value_provider.get_value(&ctx.field_name);
        Ok(value.first_value().map(|v| {
            ModelBindingResult::success(ctx.model_name.clone(), json!(v.to_uppercase()))
        }))
    }
}

#[tokio::test]
async fn test_custom_binder_and_decline() {
    let parameter = ParameterDescriptor::new::<String>("name").with_binder(Arc::new(Shouting));

    let (result, _) = bind(&get("?name=bill"), &parameter).await;
    assert_eq!(result.model, Some(json!("BILL")));

    let (declined, state) = bind_with(BindingRuntime::default(), &get(""), &parameter).await;
    assert!(declined.unwrap().is_none());
    assert!(state.is_empty());
}
