//! Test fixtures and constants.

use octosecrets::core::cipher::{self, MasterKey};
use octosecrets::core::domain::{Variable, VariableScope, SENSITIVE_TYPE};
use octosecrets::core::source::SourceRow;

/// AES-128 master key used by every fixture.
pub const MASTER_KEY: &str = "6EdU6IWsCtMEwk0kPKflQQ==";

/// `"success"` encrypted under [`MASTER_KEY`].
pub const SUCCESS_SECRET: &str = "tHdE5KI9QVdsFSq6F6HeSA==|7oD+XzuTFF1uCQLXm8A3eg==";

/// IV used when sealing fixtures.
pub const FIXTURE_IV: [u8; 16] = [
    0xee, 0x80, 0xfe, 0x5f, 0x3b, 0x93, 0x14, 0x5d, 0x6e, 0x09, 0x02, 0xd7, 0x9b, 0xc0, 0x37, 0x7a,
];

pub fn master_key() -> MasterKey {
    MasterKey::parse(MASTER_KEY).expect("fixture key is valid")
}

/// Encrypt `plaintext` the way the source server stores secrets.
pub fn seal(plaintext: &str) -> String {
    cipher::encrypt(&master_key(), &FIXTURE_IV, plaintext).expect("fixture encrypts")
}

/// A `VariableSet` row holding one variable per `(id, name, type, value)`.
pub fn variable_set_row(
    identity: &str,
    frozen: bool,
    owner_type: &str,
    variables: &[(&str, &str, &str, &str)],
) -> SourceRow {
    let variables: Vec<serde_json::Value> = variables
        .iter()
        .map(|(id, name, kind, value)| {
            serde_json::json!({"Id": id, "Name": name, "Type": kind, "Value": value})
        })
        .collect();
    SourceRow::new(
        identity,
        serde_json::json!({ "Variables": variables }).to_string(),
    )
    .with_filters(frozen, owner_type)
}

/// A sensitive variable as the destination server returns it: no value.
pub fn scoped_secret(id: &str, name: &str, environments: &[&str]) -> Variable {
    Variable {
        id: Some(id.to_string()),
        name: name.to_string(),
        kind: SENSITIVE_TYPE.to_string(),
        is_sensitive: true,
        scope: VariableScope {
            environment: environments.iter().map(|e| e.to_string()).collect(),
            ..Default::default()
        },
        ..Default::default()
    }
}
