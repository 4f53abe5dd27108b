//! Property-based tests for identifier text forms.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::identifiers::{Guid, Identifier, NodeId, QualifiedName};
    use crate::types::NumericRange;

    // =========================================================================
    // Arbitrary Strategies for NodeId
    // =========================================================================

    /// String identifiers, including the separators a naive parser would split on.
    fn arb_string_identifier() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z0-9_.]{1,24}",
            "[a-zA-Z0-9;:/=\\[\\] .-]{1,32}",
            Just("Plant;Line:1/Motor[2]".to_string()),
            Just("ns=1;i=3".to_string()),
        ]
    }

    fn arb_identifier() -> impl Strategy<Value = Identifier> {
        prop_oneof![
            any::<u32>().prop_map(Identifier::Numeric),
            arb_string_identifier().prop_map(Identifier::String),
            any::<u128>().prop_map(|n| Identifier::Guid(Guid::from(uuid::Uuid::from_u128(n)))),
            prop::collection::vec(any::<u8>(), 0..32).prop_map(Identifier::Opaque),
        ]
    }

    fn arb_node_id() -> impl Strategy<Value = NodeId> {
        (any::<u16>(), arb_identifier()).prop_map(|(namespace, identifier)| NodeId {
            namespace,
            identifier,
        })
    }

    fn arb_qualified_name() -> impl Strategy<Value = QualifiedName> {
        (any::<u16>(), "[a-zA-Z][a-zA-Z0-9 :_]{0,20}")
            .prop_map(|(ns, name)| QualifiedName::new(ns, name))
    }

    // =========================================================================
    // Round-trip Tests
    // =========================================================================

    proptest! {
        #[test]
        fn prop_node_id_text_roundtrip(id in arb_node_id()) {
            let text = id.to_string();
            let parsed: NodeId = text.parse().unwrap();
            prop_assert_eq!(&parsed, &id);
            prop_assert_eq!(parsed.to_string(), text);
        }

        #[test]
        fn prop_numeric_text_is_bit_exact(ns in any::<u16>(), n in any::<u32>()) {
            let text = format!("ns={ns};i={n}");
            prop_assert_eq!(text.parse::<NodeId>().unwrap().to_string(), text);
        }

        #[test]
        fn prop_string_text_is_bit_exact(ns in any::<u16>(), s in arb_string_identifier()) {
            let text = format!("ns={ns};s={s}");
            prop_assert_eq!(text.parse::<NodeId>().unwrap().to_string(), text);
        }

        #[test]
        fn prop_qualified_name_roundtrip(qn in arb_qualified_name()) {
            let parsed: QualifiedName = qn.to_string().parse().unwrap();
            prop_assert_eq!(parsed, qn);
        }

        #[test]
        fn prop_node_id_json_roundtrip(id in arb_node_id()) {
            let json = serde_json::to_string(&id).unwrap();
            let parsed: NodeId = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, id);
        }

        #[test]
        fn prop_numeric_range_roundtrip(bounds in prop::collection::vec((0u32..100, 1u32..50), 1..4)) {
            let text = bounds
                .iter()
                .map(|(low, width)| format!("{}:{}", low, low + width))
                .collect::<Vec<_>>()
                .join(",");
            let range: NumericRange = text.parse().unwrap();
            prop_assert_eq!(range.to_string(), text);
        }
    }
}
