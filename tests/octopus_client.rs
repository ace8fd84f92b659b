//! HTTP client behaviour against a mock destination server.

mod support;

use octosecrets::core::config::{DestinationConfig, ReservedNames};
use octosecrets::core::domain::{Variable, VariableFile, SecretRecord};
use octosecrets::core::octopus::{OctopusClient, VariableApi};
use octosecrets::core::publish::SecretsPublisher;
use octosecrets::error::{Error, PublishError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zeroize::Zeroizing;

const API_KEY: &str = "API-TESTKEY";

fn client(server: &MockServer) -> OctopusClient {
    let settings = DestinationConfig {
        server: server.uri(),
        space: "Spaces-1".to_string(),
        request_timeout_secs: 5,
    };
    OctopusClient::new(&settings, API_KEY).unwrap()
}

fn variable_set(variables: serde_json::Value) -> serde_json::Value {
    json!({
        "Id": "variableset-LibraryVariableSets-1",
        "OwnerId": "LibraryVariableSets-1",
        "Version": 3,
        "Variables": variables,
        "ScopeValues": {"Environments": []}
    })
}

#[tokio::test]
async fn test_find_filters_partial_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Spaces-1/libraryvariablesets"))
        .and(query_param("partialName", "SpaceSensitiveVars"))
        .and(header("X-Octopus-ApiKey", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Items": [
                {"Id": "LibraryVariableSets-2", "Name": "SpaceSensitiveVars Old", "VariableSetId": "variableset-LibraryVariableSets-2"},
                {"Id": "LibraryVariableSets-1", "Name": "SpaceSensitiveVars", "VariableSetId": "variableset-LibraryVariableSets-1"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let found = client(&server)
        .find_library_variable_set("SpaceSensitiveVars")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id.as_deref(), Some("LibraryVariableSets-1"));
}

#[tokio::test]
async fn test_update_preserves_unknown_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Spaces-1/variables/variableset-LibraryVariableSets-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(variable_set(json!([
            {"Id": "v-1", "Name": "db_password", "Value": null, "Type": "Sensitive",
             "IsSensitive": true, "Scope": {"Environment": ["Environments-1"]},
             "Prompt": {"Label": "Password"}}
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/Spaces-1/variables/variableset-LibraryVariableSets-1"))
        .and(body_partial_json(json!({
            "Version": 3,
            "ScopeValues": {"Environments": []}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(variable_set(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let mut variable = api
        .variable_set("variableset-LibraryVariableSets-1")
        .await
        .unwrap()
        .variables
        .remove(0);
    assert_eq!(variable.extra["Prompt"]["Label"], "Password");

    variable.name = "db_password_Environments-1".to_string();
    variable.scope = Default::default();
    api.update_variable("variableset-LibraryVariableSets-1", &variable)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
    let written = &body["Variables"][0];
    assert_eq!(written["Name"], "db_password_Environments-1");
    assert_eq!(written["Value"], serde_json::Value::Null);
    assert_eq!(written["Prompt"]["Label"], "Password");
}

#[tokio::test]
async fn test_update_unknown_variable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Spaces-1/variables/variableset-LibraryVariableSets-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(variable_set(json!([]))))
        .mount(&server)
        .await;

    let mut variable = Variable::new("x");
    variable.id = Some("v-404".into());
    let err = client(&server)
        .update_variable("variableset-LibraryVariableSets-1", &variable)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Publish(PublishError::VariableNotFound { .. })
    ));
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Spaces-1/libraryvariablesets/all"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    let err = client(&server).library_variable_sets().await.unwrap_err();
    match err {
        Error::Publish(PublishError::Status { status, body, .. }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "Invalid API key");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_publish_creates_container_and_variable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Spaces-1/libraryvariablesets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Items": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/Spaces-1/libraryvariablesets"))
        .and(body_partial_json(json!({"Name": "SpaceSensitiveVars", "ContentType": "Variables"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "Id": "LibraryVariableSets-1",
            "Name": "SpaceSensitiveVars",
            "VariableSetId": "variableset-LibraryVariableSets-1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/Spaces-1/variables/variableset-LibraryVariableSets-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(variable_set(json!([]))))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/Spaces-1/variables/variableset-LibraryVariableSets-1"))
        .and(body_partial_json(json!({
            "Variables": [{
                "Name": "OctoterraWiz.Terraform.Vars",
                "Type": "Sensitive",
                "IsSensitive": true,
                "Value": "feed_x_password = \"pw\"\n"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(variable_set(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let mut payload = VariableFile::new();
    payload.push(&SecretRecord::new(
        "feed_x_password".to_string(),
        Zeroizing::new("pw".to_string()),
    ));

    let api = client(&server);
    let published = SecretsPublisher::new(&api, ReservedNames::default())
        .publish(&payload)
        .await
        .unwrap();
    assert!(published.created);
    assert_eq!(published.variable_set, "variableset-LibraryVariableSets-1");
}
