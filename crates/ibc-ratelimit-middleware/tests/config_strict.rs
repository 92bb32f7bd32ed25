#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use ibc_ratelimit_core::protocol::AckFallback;
use ibc_ratelimit_core::ErrorCode;
use ibc_ratelimit_middleware::config;
use ibc_ratelimit_middleware::middleware::MODULE_NAME;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
rate_limit:
  authority: "cosmos10d07y265gmmuvt4z0w9aw880jnsr700j6zn9kn"
  contract_adress: "cosmos1qyqszqgpqyqszqgp" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::InvalidParams);
}

#[test]
fn deny_unknown_quota_fields() {
    let bad = r#"
version: 1
rate_limit:
  authority: "gov"
quotas:
  - { channel_id: "channel-0", denom: "stake", max_send: "1", max_recv: "1", window: "24h" }
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
rate_limit:
  authority: "gov"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.rate_limit.contract_address, "");
    assert_eq!(cfg.rate_limit.unparsable_ack, AckFallback::TreatAsSuccess);
    assert_eq!(cfg.rate_limit.module_name, MODULE_NAME);
    assert!(cfg.quotas.is_empty());
}

#[test]
fn ok_full_config() {
    let ok = r#"
version: 1
rate_limit:
  contract_address: "osmo1qyqszqgpqyqszqgp"
  authority: "gov"
  unparsable_ack: error
  module_name: "ratelimit"
quotas:
  - { channel_id: "channel-0", denom: "uosmo", max_send: "1000000", max_recv: "500" }
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.rate_limit.unparsable_ack, AckFallback::TreatAsError);
    assert_eq!(cfg.rate_limit.params().contract_address, "osmo1qyqszqgpqyqszqgp");
    assert_eq!(cfg.quotas[0].max_send, "1000000");
}

#[test]
fn rejects_invalid_values() {
    let cases = [
        // wrong version
        "version: 2\nrate_limit: { authority: gov }\n",
        // missing authority
        "version: 1\nrate_limit: { contract_address: \"\" }\n",
        // malformed contract address
        "version: 1\nrate_limit: { authority: gov, contract_address: not-an-address }\n",
        // negative quota amount
        "version: 1\nrate_limit: { authority: gov }\nquotas:\n  - { channel_id: c, denom: d, max_send: \"-1\", max_recv: \"1\" }\n",
        // empty denom
        "version: 1\nrate_limit: { authority: gov }\nquotas:\n  - { channel_id: c, denom: \"\", max_send: \"1\", max_recv: \"1\" }\n",
    ];
    for c in cases {
        let err = config::load_from_str(c).expect_err(c);
        assert_eq!(err.code(), ErrorCode::InvalidParams, "case={c}");
    }
}
