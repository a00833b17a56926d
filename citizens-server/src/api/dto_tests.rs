//! Unit tests for DTO field validation and OpenAPI schema generation

use crate::api::dto::*;
use crate::error::ServerError;
use chrono::NaiveDate;
use citizens::models::{Citizen, FieldPatch, Gender};
use serde_json::json;
use std::collections::BTreeSet;
use utoipa::OpenApi;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 8, 20).unwrap()
}

fn citizen_json() -> serde_json::Value {
    json!({
        "citizen_id": 1,
        "town": "Moscow",
        "street": "Lva Tolstogo",
        "building": "16k7str5",
        "appartement": 7,
        "name": "Ivanov Ivan Ivanovich",
        "birth_date": "26.12.1986",
        "gender": "male",
        "relatives": [2]
    })
}

fn input_with(key: &str, value: serde_json::Value) -> serde_json::Result<CitizenInput> {
    let mut citizen = citizen_json();
    citizen[key] = value;
    serde_json::from_value(citizen)
}

fn validation_message(err: ServerError) -> String {
    match err {
        ServerError::Validation(message) => message,
        other => panic!("expected a validation error, got {:?}", other),
    }
}

#[test]
fn test_citizen_input_converts_to_record() {
    let input: CitizenInput = serde_json::from_value(citizen_json()).unwrap();
    let record = input.into_record(today()).unwrap();

    assert_eq!(record.citizen_id, 1);
    assert_eq!(record.apartment, 7);
    assert_eq!(record.birth_date, NaiveDate::from_ymd_opt(1986, 12, 26).unwrap());
    assert_eq!(record.gender, Gender::Male);
    assert_eq!(record.relatives, vec![2]);
}

#[test]
fn test_citizen_input_rejects_wrong_types() {
    assert!(input_with("name", json!(null)).is_err());
    assert!(input_with("name", json!(1555)).is_err());
    assert!(input_with("appartement", json!("some")).is_err());
    assert!(input_with("appartement", json!(-1)).is_err());
    assert!(input_with("citizen_id", json!(-1)).is_err());
    assert!(input_with("relatives", json!({"id": 1})).is_err());

    let mut missing = citizen_json();
    missing.as_object_mut().unwrap().remove("town");
    assert!(serde_json::from_value::<CitizenInput>(missing).is_err());
}

#[test]
fn test_citizen_input_field_rules() {
    let convert = |key: &str, value: serde_json::Value| {
        input_with(key, value)
            .unwrap()
            .into_record(today())
            .map(|_| ())
            .map_err(validation_message)
    };

    assert_eq!(convert("town", json!("   ")), Err("town not specified".to_string()));
    assert!(convert("street", json!("x".repeat(257))).is_err());
    assert!(convert("street", json!("ж".repeat(256))).is_ok());
    assert_eq!(
        convert("birth_date", json!("26/12/1986")),
        Err("26/12/1986 invalid format. Must be 'dd.mm.yyyy'".to_string())
    );
    assert_eq!(
        convert("birth_date", json!("20.08.2019")),
        Err("Future '20.08.2019' date given".to_string())
    );
    assert!(convert("birth_date", json!("19.08.2019")).is_ok());
    assert!(convert("birth_date", json!("31.02.1990")).is_err());
    assert_eq!(
        convert("gender", json!("fmale")),
        Err("Invalid gender - fmale. Must be only 'male' or 'female'".to_string())
    );
    assert!(convert("citizen_id", json!(0)).is_err());
}

#[test]
fn test_import_request_requires_citizens_array() {
    assert!(serde_json::from_value::<ImportRequest>(json!({"some_data": "x"})).is_err());
    assert!(serde_json::from_value::<ImportRequest>(json!({"citizens": {}})).is_err());

    let request: ImportRequest =
        serde_json::from_value(json!({ "citizens": [citizen_json()] })).unwrap();
    assert_eq!(request.into_records(today()).unwrap().len(), 1);
}

#[test]
fn test_patch_request_tri_state() {
    let request = PatchCitizenRequest::from_value(json!({"name": "Ivanova Maria"})).unwrap();
    assert_eq!(request.name, FieldPatch::Value("Ivanova Maria".to_string()));
    assert!(request.relatives.is_absent());

    let (update, relatives) = request.into_update(today()).unwrap();
    assert_eq!(update.name.as_deref(), Some("Ivanova Maria"));
    assert!(update.town.is_none());
    assert!(relatives.is_none());

    let request = PatchCitizenRequest::from_value(json!({"relatives": []})).unwrap();
    let (update, relatives) = request.into_update(today()).unwrap();
    assert!(update.is_empty());
    assert_eq!(relatives, Some(vec![]));
}

#[test]
fn test_patch_request_rejections() {
    let err = PatchCitizenRequest::from_value(json!({"citizen_id": 1, "name": "x"})).unwrap_err();
    assert_eq!(validation_message(err), "citizen_id must not be specified");

    assert!(matches!(
        PatchCitizenRequest::from_value(json!([1, 2])),
        Err(ServerError::BadRequest(_))
    ));
    assert!(matches!(
        PatchCitizenRequest::from_value(json!({"appartement": "1"})),
        Err(ServerError::BadRequest(_))
    ));

    let reject = |body: serde_json::Value| {
        PatchCitizenRequest::from_value(body)
            .unwrap()
            .into_update(today())
            .map_err(validation_message)
            .unwrap_err()
    };
    assert_eq!(
        reject(json!({})),
        "No one field is provided. Must be at least one"
    );
    assert_eq!(reject(json!({"name": "x", "town": null})), "town not specified");
    assert_eq!(reject(json!({"relatives": [2, 2]})), "duplicate relatives ids given");
    assert_eq!(
        reject(json!({"birth_date": "12.12.2019"})),
        "Future '12.12.2019' date given"
    );
    assert!(reject(json!({"gender": "transgender"})).starts_with("Invalid gender"));
}

#[test]
fn test_citizen_dto_wire_shape() {
    let citizen = Citizen {
        citizen_id: 3,
        town: "Kazan".to_string(),
        street: "Baumana".to_string(),
        building: "1".to_string(),
        apartment: 12,
        name: "Petrova Anna".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1990, 3, 5).unwrap(),
        gender: Gender::Female,
        relatives: BTreeSet::from([5, 1]),
    };

    let value = serde_json::to_value(CitizenDto::from(citizen)).unwrap();
    assert_eq!(value["appartement"], 12);
    assert_eq!(value["birth_date"], "05.03.1990");
    assert_eq!(value["gender"], "female");
    assert_eq!(value["relatives"], json!([1, 5]));
    assert!(value.get("apartment").is_none());
}

#[test]
fn test_birthdays_response_uses_month_keys() {
    let report = citizens::reports::relatives_birthdays(&[]);
    let value = serde_json::to_value(BirthdaysResponse::from(report)).unwrap();

    let months = value["data"].as_object().unwrap();
    assert_eq!(months.len(), 12);
    assert_eq!(months["1"], json!([]));
    assert_eq!(months["12"], json!([]));
}

#[test]
fn test_openapi_schema_generation() {
    use crate::api::ApiDoc;

    let openapi = ApiDoc::openapi();
    assert_eq!(openapi.info.title, "Citizens Registry API");

    let schemas = &openapi.components.as_ref().unwrap().schemas;
    for name in ["CitizenInput", "CitizenDto", "PatchCitizenRequest", "ErrorResponse"] {
        assert!(schemas.contains_key(name), "{} schema should exist", name);
    }

    let paths = &openapi.paths.paths;
    assert!(paths.contains_key("/imports"));
    assert!(paths.contains_key("/imports/{import_id}/citizens/{citizen_id}"));
    assert!(paths.contains_key("/imports/{import_id}/towns/stat/percentile/age"));
}
