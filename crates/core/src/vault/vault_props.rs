//! Property-based tests for `SignatureVault`.

use proptest::prelude::*;

use super::{SEALED_PREFIX, SignatureVault};

fn vault() -> SignatureVault {
    SignatureVault::new("property-key", 64, 1).unwrap()
}

fn arb_signature() -> impl Strategy<Value = String> {
    ("(png|jpeg|svg\\+xml)", "[A-Za-z0-9+/]{0,64}")
        .prop_map(|(kind, body)| format!("data:image/{kind};base64,{body}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Any image payload survives a seal/open cycle.
    #[test]
    fn prop_signature_round_trip(signature in arb_signature()) {
        let vault = vault();
        let sealed = vault.encrypt(&signature).unwrap();
        prop_assert!(sealed.starts_with(SEALED_PREFIX));
        prop_assert_eq!(vault.decrypt(&sealed), Some(signature));
    }

    /// Values that are not image payloads are never sealed.
    #[test]
    fn prop_non_image_passthrough(value in "[a-zA-Z0-9 ,.:;]{0,80}") {
        prop_assume!(!value.starts_with("data:image/") && !value.starts_with(SEALED_PREFIX));
        let vault = vault();
        prop_assert_eq!(vault.encrypt(&value).unwrap(), value.clone());
        prop_assert_eq!(vault.decrypt(&value), Some(value));
    }
}
